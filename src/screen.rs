//! Full-page screens and the contract the App drives them through.

mod events;
mod login;

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

pub use events::EventsScreen;
pub use login::LoginScreen;

use crate::Theme;
use crate::api::ApiClient;
use crate::app::AppMessage;
use crate::commands::Command;
use crate::config::KeyResolver;
use crate::storage::KeyValueStore;
use crate::ui::{EventResult, Keybinding};

pub enum ScreenMsg {
    /// No action needed
    Idle,
    /// Run one or more commands
    Run(Vec<Box<dyn Command>>),
}

impl<T: Command> From<T> for ScreenMsg {
    fn from(value: T) -> Self {
        Self::Run(vec![Box::new(value)])
    }
}

/// A full-page view with its own state and message queue.
///
/// The App calls methods in this order:
///
/// 1. `init()` - once when the screen is mounted
/// 2. `update()` - immediately after init to process startup messages
/// 3. For each event:
///    - `handle_tick()` if tick event
///    - `handle_key()` / `handle_paste()` if input event, then `update()` if consumed
/// 4. `update()` on every loop iteration to pick up command results
///
/// Dropping the screen is the unmount. Commands it issued are cancelled by
/// the App at the same time.
pub trait Screen {
    /// Queue startup message(s).
    fn init(&mut self) {}

    /// Handle a tick event for animations.
    fn handle_tick(&mut self) {}

    /// Handle a key event.
    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<()>>;

    /// Handle pasted text. Returns true if the paste was used.
    fn handle_paste(&mut self, text: &str) -> bool {
        _ = text;
        false
    }

    /// Process all queued messages and return the commands to run.
    ///
    /// # Errors
    /// Returns an error if message processing fails. The App reports it and
    /// keeps the screen mounted.
    fn update(&mut self) -> Result<ScreenMsg>;

    /// Render the screen to the frame.
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Short title shown in the frame header.
    fn title(&self) -> &'static str;

    /// Keybindings for the help overlay and status bar hints.
    fn keybindings(&self) -> Vec<Keybinding> {
        vec![]
    }
}

/// Identifies a mountable screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ScreenId {
    Login,
    #[default]
    Events,
}

impl ScreenId {
    /// The screen the switch key leads to.
    pub const fn next(self) -> Self {
        match self {
            Self::Login => Self::Events,
            Self::Events => Self::Login,
        }
    }

    pub fn create(self, ctx: &ScreenContext) -> Box<dyn Screen> {
        match self {
            Self::Login => Box::new(LoginScreen::new(ctx)),
            Self::Events => Box::new(EventsScreen::new(ctx)),
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Events => write!(f, "events"),
        }
    }
}

/// Shared resources handed to every screen on mount.
#[derive(Clone)]
pub struct ScreenContext {
    pub api: ApiClient,
    pub store: Arc<dyn KeyValueStore>,
    pub resolver: Arc<KeyResolver>,
    pub app_tx: UnboundedSender<AppMessage>,
}
