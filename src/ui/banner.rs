use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::Theme;

const PREFIX: &str = "✗ ";

/// Inline error message shown above a screen's content.
pub struct ErrorBanner<'a> {
    message: &'a str,
}

impl<'a> ErrorBanner<'a> {
    pub const fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Rows needed to show the message at `width` columns, borders included.
    ///
    /// Wraps on whitespace the way the rendered paragraph does, breaking
    /// words longer than a row.
    pub fn height(&self, width: u16) -> u16 {
        let inner = usize::from(width.saturating_sub(2)).max(1);
        let mut rows = 1usize;
        let mut used = 0usize;
        for word in PREFIX.split_whitespace().chain(self.message.split_whitespace()) {
            let len = word.chars().count();
            let needed = if used == 0 { len } else { used + 1 + len };
            if needed <= inner {
                used = needed;
                continue;
            }
            if used > 0 {
                rows += 1;
            }
            let overflow = (len - 1) / inner;
            rows += overflow;
            used = len - overflow * inner;
        }
        u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.error()));

        let line = Line::from(vec![
            Span::styled(
                PREFIX,
                Style::default()
                    .fg(theme.error())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(self.message, Style::default().fg(theme.text())),
        ]);

        let paragraph = Paragraph::new(line)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}
