use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table as RatatuiTable, TableState};

use crate::Theme;
use crate::config::{KeyResolver, NavAction};
use crate::ui::{Component, EventResult, Result};

const PAGE_STEP: usize = 10;

/// Event emitted by [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent<T> {
    /// Selection moved to a new item.
    Changed(T),
    /// Item was activated.
    Activated(T),
}

/// Column definition for a table.
pub struct ColumnDef {
    pub header: &'static str,
    pub constraint: Constraint,
}

impl ColumnDef {
    pub const fn new(header: &'static str, constraint: Constraint) -> Self {
        Self { header, constraint }
    }
}

/// Items that can be displayed in a table.
pub trait TableRow {
    /// Column definitions for this row type.
    fn columns() -> &'static [ColumnDef];

    /// Render this row's cells with full styling control.
    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>>;
}

/// A selectable table with keyboard navigation.
pub struct Table<T: TableRow + Clone> {
    items: Vec<T>,
    state: TableState,
    title: Option<String>,
    resolver: Arc<KeyResolver>,
}

impl<T: TableRow + Clone> Table<T> {
    pub fn new(items: Vec<T>, resolver: Arc<KeyResolver>) -> Self {
        let mut state = TableState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }
        Self {
            items,
            state,
            title: None,
            resolver,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn selected(&self) -> Option<&T> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    fn select(&mut self, index: usize) {
        if let Some(last) = self.items.len().checked_sub(1) {
            self.state.select(Some(index.min(last)));
        }
    }

    fn current(&self) -> usize {
        self.state.selected().unwrap_or(0)
    }

    fn change_event(&self, before: Option<usize>) -> EventResult<TableEvent<T>> {
        match self.state.selected() {
            Some(selected) if Some(selected) != before => self
                .items
                .get(selected)
                .map_or(EventResult::Consumed, |item| {
                    TableEvent::Changed(item.clone()).into()
                }),
            _ => EventResult::Consumed,
        }
    }
}

impl<T: TableRow + Clone> Component for Table<T> {
    type Output = TableEvent<T>;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        let before = self.state.selected();
        let r = Arc::clone(&self.resolver);

        if r.matches_nav(&key, NavAction::Down) {
            self.select(self.current() + 1);
        } else if r.matches_nav(&key, NavAction::Up) {
            self.select(self.current().saturating_sub(1));
        } else if r.matches_nav(&key, NavAction::PageDown) {
            self.select(self.current() + PAGE_STEP);
        } else if r.matches_nav(&key, NavAction::PageUp) {
            self.select(self.current().saturating_sub(PAGE_STEP));
        } else if r.matches_nav(&key, NavAction::Home) {
            self.select(0);
        } else if r.matches_nav(&key, NavAction::End) {
            self.select(usize::MAX);
        } else if r.matches_nav(&key, NavAction::Select) {
            return Ok(self
                .selected()
                .cloned()
                .map_or(EventResult::Consumed, |item| {
                    TableEvent::Activated(item).into()
                }));
        } else {
            return Ok(EventResult::Ignored);
        }

        Ok(self.change_event(before))
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let columns = T::columns();

        let header_cells: Vec<Cell> = columns
            .iter()
            .map(|c| {
                Cell::from(c.header).style(
                    Style::default()
                        .fg(theme.header())
                        .add_modifier(Modifier::BOLD),
                )
            })
            .collect();
        let header = Row::new(header_cells)
            .height(1)
            .style(Style::default().bg(theme.surface0()));

        let rows: Vec<Row> = self
            .items
            .iter()
            .map(|item| Row::new(item.render_cells(theme)).style(Style::default().fg(theme.text())))
            .collect();

        let widths: Vec<Constraint> = columns.iter().map(|c| c.constraint).collect();

        let mut table = RatatuiTable::new(rows, widths)
            .header(header)
            .row_highlight_style(
                Style::default()
                    .bg(theme.selection_bg())
                    .fg(theme.lavender())
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        if let Some(title) = &self.title {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.border_focused()))
                .title(title.as_str())
                .title_style(Style::default().fg(theme.mauve()).add_modifier(Modifier::BOLD));
            table = table.block(block);
        }

        frame.render_stateful_widget(table, area, &mut self.state);
    }
}
