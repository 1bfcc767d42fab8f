use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::Theme;
use crate::ui::{Component, EventResult, Result};

const MASK: char = '•';

/// Single-line form field.
///
/// Editing keys are consumed. Everything else (Enter, Tab, arrows up/down)
/// is ignored so the owning form can treat it as navigation or submission.
/// The cursor is a character index, not a byte offset.
pub struct TextInput {
    label: String,
    value: String,
    cursor: usize,
    placeholder: Option<String>,
    masked: bool,
    revealed: bool,
    focused: bool,
    required: bool,
}

impl TextInput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: String::new(),
            cursor: 0,
            placeholder: None,
            masked: false,
            revealed: false,
            focused: false,
            required: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Hide the value behind mask characters until revealed.
    pub const fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Flag the field as a missing required value.
    pub const fn mark_required(&mut self) {
        self.required = true;
    }

    #[cfg(test)]
    pub const fn is_marked_required(&self) -> bool {
        self.required
    }

    pub const fn toggle_reveal(&mut self) -> bool {
        self.revealed = !self.revealed;
        self.revealed
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
    }

    fn len_chars(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
        self.required = false;
    }

    fn delete_char_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_char_at_cursor(&mut self) {
        if self.cursor < self.len_chars() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_word_before_cursor(&mut self) {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1] == ' ' {
            pos -= 1;
        }
        while pos > 0 && chars[pos - 1] != ' ' {
            pos -= 1;
        }
        let (start, end) = (self.byte_index(pos), self.byte_index(self.cursor));
        self.value.drain(start..end);
        self.cursor = pos;
    }

    fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn display_value(&self) -> String {
        if self.masked && !self.revealed {
            MASK.to_string().repeat(self.len_chars())
        } else {
            self.value.clone()
        }
    }
}

impl Component for TextInput {
    type Output = ();

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(match (key.code, key.modifiers) {
            (KeyCode::Backspace, KeyModifiers::ALT) => {
                self.delete_word_before_cursor();
                EventResult::Consumed
            }
            (KeyCode::Backspace, _) => {
                self.delete_char_before_cursor();
                EventResult::Consumed
            }
            (KeyCode::Delete, _) => {
                self.delete_char_at_cursor();
                EventResult::Consumed
            }
            (KeyCode::Left, _) => {
                self.cursor = self.cursor.saturating_sub(1);
                EventResult::Consumed
            }
            (KeyCode::Right, _) => {
                self.cursor = (self.cursor + 1).min(self.len_chars());
                EventResult::Consumed
            }
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                EventResult::Consumed
            }
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.len_chars();
                EventResult::Consumed
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.clear_line();
                EventResult::Consumed
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                EventResult::Consumed
            }
            _ => EventResult::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let input_style = Style::default().fg(theme.text());
        let cursor_style = Style::default()
            .fg(theme.base())
            .bg(theme.text())
            .add_modifier(Modifier::BOLD);
        let placeholder_style = Style::default().fg(theme.overlay0());

        let display = self.display_value();
        let line = match (&self.placeholder, self.value.is_empty()) {
            (Some(placeholder), true) => {
                let mut spans = Vec::new();
                if self.focused {
                    spans.push(Span::styled(" ", cursor_style));
                }
                spans.push(Span::styled(placeholder.clone(), placeholder_style));
                Line::from(spans)
            }
            _ if self.focused => {
                let before: String = display.chars().take(self.cursor).collect();
                let at = display.chars().nth(self.cursor).unwrap_or(' ');
                let after: String = display.chars().skip(self.cursor + 1).collect();
                Line::from(vec![
                    Span::styled(before, input_style),
                    Span::styled(at.to_string(), cursor_style),
                    Span::styled(after, input_style),
                ])
            }
            _ => Line::from(Span::styled(display, input_style)),
        };

        let border_color = if self.required {
            theme.error()
        } else if self.focused {
            theme.border_focused()
        } else {
            theme.border()
        };

        let mut block = Block::default()
            .title(format!(" {} ", self.label))
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        if self.required {
            block = block.title_bottom(Line::styled(
                " required ",
                Style::default().fg(theme.error()),
            ));
        } else if self.masked {
            let hint = if self.revealed { " visible " } else { " hidden " };
            block = block.title_bottom(Line::styled(hint, Style::default().fg(theme.overlay1())));
        }

        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut TextInput, code: KeyCode) -> EventResult<()> {
        input
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn type_str(input: &mut TextInput, text: &str) {
        for c in text.chars() {
            press(input, KeyCode::Char(c));
        }
    }

    #[test]
    fn edits_at_the_cursor() {
        let mut input = TextInput::new("Email");
        type_str(&mut input, "ana@example.com");
        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Delete);
        type_str(&mut input, "j");
        press(&mut input, KeyCode::End);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "jna@example.co");
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut input = TextInput::new("Password");
        type_str(&mut input, "héllo");
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "hllo");

        input
            .handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT))
            .unwrap();
        assert_eq!(input.value(), "llo");
    }

    #[test]
    fn form_keys_are_left_to_the_parent() {
        let mut input = TextInput::new("Email");
        assert_eq!(press(&mut input, KeyCode::Enter), EventResult::Ignored);
        assert_eq!(press(&mut input, KeyCode::Tab), EventResult::Ignored);
        assert_eq!(press(&mut input, KeyCode::Up), EventResult::Ignored);
        assert_eq!(press(&mut input, KeyCode::Char('x')), EventResult::Consumed);
    }

    #[test]
    fn typing_clears_required_flag() {
        let mut input = TextInput::new("Email");
        input.mark_required();
        assert!(input.is_marked_required());
        type_str(&mut input, "a");
        assert!(!input.is_marked_required());
    }

    #[test]
    fn masking_hides_until_revealed() {
        let mut input = TextInput::new("Password").masked();
        input.insert_str("pa\nss");
        assert_eq!(input.value(), "pass");
        assert_eq!(input.display_value(), "••••");
        assert!(input.toggle_reveal());
        assert_eq!(input.display_value(), "pass");
    }
}
