use crossterm::event::KeyCode;

use crate::config::key::{Key, KeyBinding};
use crate::config::keybindings::{
    DialogKeybindings, GlobalKeybindings, LoginKeybindings, NavigationKeybindings,
};

impl Default for GlobalKeybindings {
    fn default() -> Self {
        Self {
            quit: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char('q')),
                Key::with_ctrl(KeyCode::Char('q')),
            ]),
            help: KeyBinding::multiple(vec![Key::new(KeyCode::Char('?')), Key::new(KeyCode::F(1))]),
            theme: KeyBinding::multiple(vec![
                Key::new(KeyCode::Char('t')),
                Key::with_ctrl(KeyCode::Char('t')),
            ]),
            switch_screen: KeyBinding::multiple(vec![
                Key::new(KeyCode::F(2)),
                Key::with_ctrl(KeyCode::Char('s')),
            ]),
        }
    }
}

impl Default for NavigationKeybindings {
    fn default() -> Self {
        Self {
            up: KeyBinding::multiple(vec![Key::new(KeyCode::Char('k')), Key::new(KeyCode::Up)]),
            down: KeyBinding::multiple(vec![Key::new(KeyCode::Char('j')), Key::new(KeyCode::Down)]),
            page_up: Key::new(KeyCode::PageUp).into(),
            page_down: Key::new(KeyCode::PageDown).into(),
            home: KeyBinding::multiple(vec![Key::new(KeyCode::Char('g')), Key::new(KeyCode::Home)]),
            end: KeyBinding::multiple(vec![Key::new(KeyCode::Char('G')), Key::new(KeyCode::End)]),
            select: Key::new(KeyCode::Enter).into(),
        }
    }
}

impl Default for LoginKeybindings {
    fn default() -> Self {
        Self {
            submit: Key::new(KeyCode::Enter).into(),
            next_field: KeyBinding::multiple(vec![Key::new(KeyCode::Tab), Key::new(KeyCode::Down)]),
            previous_field: KeyBinding::multiple(vec![
                Key::new(KeyCode::BackTab),
                Key::new(KeyCode::Up),
            ]),
            reveal_secret: Key::with_ctrl(KeyCode::Char('r')).into(),
        }
    }
}

impl Default for DialogKeybindings {
    fn default() -> Self {
        Self {
            dismiss: KeyBinding::multiple(vec![
                Key::new(KeyCode::Esc),
                Key::new(KeyCode::Enter),
                Key::new(KeyCode::Char('q')),
            ]),
        }
    }
}
