//! Upcoming events listing.

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Wrap};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::Theme;
use crate::api::{ApiClient, ApiError, EventRecord};
use crate::app::AppMessage;
use crate::commands::Command;
use crate::config::{KeyResolver, NavAction};
use crate::format::EventCard;
use crate::screen::{Screen, ScreenContext, ScreenMsg};
use crate::ui::{
    ColumnDef, Component, ErrorBanner, EventResult, Keybinding, Spinner, Table, TableEvent,
    TableRow,
};
use crate::view_state::{Generation, ViewState};

const EMPTY_MESSAGE: &str = "No events scheduled yet.";
const GENERIC_FAILURE: &str = "Failed to load events. Please try again later.";

#[derive(Debug)]
enum EventsMsg {
    Fetch(Generation),
    Fetched {
        generation: Generation,
        outcome: Result<Vec<EventRecord>, String>,
    },
}

impl TableRow for EventCard {
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("Event", Constraint::Min(20)),
            ColumnDef::new("Date", Constraint::Length(20)),
            ColumnDef::new("Location", Constraint::Min(16)),
        ];
        COLUMNS
    }

    fn render_cells(&self, _theme: &Theme) -> Vec<Cell<'static>> {
        vec![
            Cell::from(self.title.clone()),
            Cell::from(self.date.clone()),
            Cell::from(self.location.clone()),
        ]
    }
}

pub struct EventsScreen {
    api: ApiClient,
    resolver: Arc<KeyResolver>,
    state: ViewState<Vec<EventRecord>>,
    table: Option<Table<EventCard>>,
    show_details: bool,
    spinner: Spinner,
    msg_tx: UnboundedSender<EventsMsg>,
    msg_rx: UnboundedReceiver<EventsMsg>,
}

impl EventsScreen {
    /// The screen starts out loading; the request itself is issued by `init`.
    pub fn new(ctx: &ScreenContext) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let mut state = ViewState::new();
        state.begin();
        Self {
            api: ctx.api.clone(),
            resolver: Arc::clone(&ctx.resolver),
            state,
            table: None,
            show_details: true,
            spinner: Spinner::new().with_label("Loading events..."),
            msg_tx,
            msg_rx,
        }
    }

    /// Events from the last successful load; empty while loading or after a failure.
    pub fn events(&self) -> &[EventRecord] {
        self.state.data().map(Vec::as_slice).unwrap_or_default()
    }

    fn queue(&self, msg: EventsMsg) {
        let _ = self.msg_tx.send(msg);
    }

    fn process_message(&mut self, msg: EventsMsg) -> ScreenMsg {
        match msg {
            EventsMsg::Fetch(generation) => {
                info!(%generation, "Loading events");
                FetchEventsCmd {
                    api: self.api.clone(),
                    generation,
                    msg_tx: self.msg_tx.clone(),
                }
                .into()
            }
            EventsMsg::Fetched {
                generation,
                outcome,
            } => {
                if self.state.finish(generation, outcome) {
                    self.rebuild_table();
                }
                ScreenMsg::Idle
            }
        }
    }

    fn rebuild_table(&mut self) {
        let cards: Vec<EventCard> = self.events().iter().map(EventCard::from).collect();
        self.table = (!cards.is_empty()).then(|| {
            Table::new(cards, Arc::clone(&self.resolver)).with_title(" Upcoming events ")
        });
    }

    fn render_details(card: &EventCard, frame: &mut Frame, area: Rect, theme: &Theme) {
        let label = Style::default().fg(theme.overlay1());
        let lines = vec![
            Line::from(vec![
                Span::styled("When   ", label),
                Span::styled(card.date.clone(), Style::default().fg(theme.peach())),
            ]),
            Line::from(vec![
                Span::styled("Where  ", label),
                Span::styled(card.location.clone(), Style::default().fg(theme.blue())),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                card.description.clone(),
                Style::default().fg(theme.subtext1()),
            )),
        ];

        let block = Block::default()
            .title(format!(" {} ", card.title))
            .title_style(
                Style::default()
                    .fg(theme.yellow())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

impl Screen for EventsScreen {
    fn init(&mut self) {
        self.queue(EventsMsg::Fetch(self.state.generation()));
    }

    fn handle_tick(&mut self) {
        if self.state.is_loading() {
            self.spinner.handle_tick();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<()>> {
        let Some(table) = &mut self.table else {
            return Ok(EventResult::Ignored);
        };

        Ok(match table.handle_key(key)? {
            EventResult::Event(TableEvent::Activated(card)) => {
                self.show_details = !self.show_details;
                debug!(event = %card.title, show_details = self.show_details, "Toggled details");
                EventResult::Consumed
            }
            EventResult::Event(TableEvent::Changed(card)) => {
                debug!(event = %card.title, "Selected event");
                EventResult::Consumed
            }
            EventResult::Consumed => EventResult::Consumed,
            EventResult::Ignored => EventResult::Ignored,
        })
    }

    fn update(&mut self) -> Result<ScreenMsg> {
        let mut commands = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            if let ScreenMsg::Run(mut batch) = self.process_message(msg) {
                commands.append(&mut batch);
            }
        }

        Ok(if commands.is_empty() {
            ScreenMsg::Idle
        } else {
            ScreenMsg::Run(commands)
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut area = area;

        if let Some(message) = self.state.error() {
            let banner = ErrorBanner::new(message);
            let [banner_area, rest] =
                Layout::vertical([Constraint::Length(banner.height(area.width)), Constraint::Min(0)])
                    .areas(area);
            banner.render(frame, banner_area, theme);
            area = rest;
        }

        if self.state.is_loading() {
            self.spinner.render(frame, area, theme);
            return;
        }

        let Some(table) = &mut self.table else {
            // Nothing to list. After a failure the banner says why.
            if self.state.error().is_none() {
                let empty = Paragraph::new(EMPTY_MESSAGE)
                    .style(Style::default().fg(theme.subtext0()))
                    .alignment(Alignment::Center);
                let line_area = area.centered(Constraint::Percentage(100), Constraint::Length(1));
                frame.render_widget(empty, line_area);
            }
            return;
        };

        if !self.show_details {
            table.render(frame, area, theme);
            return;
        }

        let [table_area, details_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
        table.render(frame, table_area, theme);
        if let Some(card) = table.selected() {
            Self::render_details(card, frame, details_area, theme);
        }
    }

    fn title(&self) -> &'static str {
        "Upcoming events"
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(
                format!(
                    "{}/{}",
                    r.display_nav(NavAction::Up),
                    r.display_nav(NavAction::Down)
                ),
                "Navigate",
            ),
            Keybinding::hint(r.display_nav(NavAction::Select), "Toggle details"),
            Keybinding::new(
                format!(
                    "{}/{}",
                    r.display_nav(NavAction::PageUp),
                    r.display_nav(NavAction::PageDown)
                ),
                "Page up/down",
            ),
            Keybinding::new(
                format!(
                    "{}/{}",
                    r.display_nav(NavAction::Home),
                    r.display_nav(NavAction::End)
                ),
                "First/last event",
            ),
        ]
    }
}

/// Fetches the listing and reports the events or a failure message back to the screen.
struct FetchEventsCmd {
    api: ApiClient,
    generation: Generation,
    msg_tx: UnboundedSender<EventsMsg>,
}

#[async_trait]
impl Command for FetchEventsCmd {
    fn name(&self) -> String {
        "Loading events".to_string()
    }

    async fn execute(self: Box<Self>, _app_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let outcome = self.api.list_events().await.map_err(|e| failure_message(&e));

        let msg = EventsMsg::Fetched {
            generation: self.generation,
            outcome,
        };
        if self.msg_tx.send(msg).is_err() {
            debug!("Events screen closed before the listing arrived");
        }
        Ok(())
    }
}

fn failure_message(error: &ApiError) -> String {
    warn!("Failed to load events: {error}");
    match error {
        ApiError::Rejected { status, .. } => format!(
            "Failed to load events (HTTP {}). Please try again later.",
            status.as_u16()
        ),
        ApiError::Transport(_) | ApiError::Decode(_) => GENERIC_FAILURE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::screen::testing;

    async fn load(server: &MockServer) -> EventsScreen {
        let h = testing::harness(&server.uri());
        let mut screen = EventsScreen::new(&h.ctx);
        screen.init();
        assert_eq!(testing::run(screen.update().unwrap(), &h.ctx).await, 1);
        screen.update().unwrap();
        screen
    }

    async fn serve(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn starts_loading() {
        let h = testing::harness("http://127.0.0.1:9");
        let screen = EventsScreen::new(&h.ctx);
        assert!(screen.state.is_loading());
        assert!(screen.events().is_empty());
    }

    #[tokio::test]
    async fn server_error_leaves_no_events_and_a_message() {
        let server = serve(ResponseTemplate::new(500)).await;
        let screen = load(&server).await;

        assert!(screen.events().is_empty());
        assert!(screen.table.is_none());
        let error = screen.state.error().unwrap();
        assert!(error.contains("500"), "error: {error}");
        assert!(!screen.state.is_loading());
    }

    #[tokio::test]
    async fn empty_listing_is_ready_without_error() {
        let server = serve(ResponseTemplate::new(200).set_body_string("[]")).await;
        let screen = load(&server).await;

        assert!(screen.state.data().is_some());
        assert!(screen.events().is_empty());
        assert_eq!(screen.state.error(), None);
        assert!(screen.table.is_none());
    }

    #[tokio::test]
    async fn null_listing_is_empty() {
        let server = serve(ResponseTemplate::new(200).set_body_string("null")).await;
        let screen = load(&server).await;

        assert!(screen.events().is_empty());
        assert_eq!(screen.state.error(), None);
    }

    #[tokio::test]
    async fn garbage_listing_is_a_generic_failure() {
        let server = serve(ResponseTemplate::new(200).set_body_string("<html>")).await;
        let screen = load(&server).await;

        assert_eq!(screen.state.error(), Some(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn listing_renders_cards() {
        let server = serve(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "ID": 1,
                "Name": "Jazz Night",
                "DateTime": "2024-07-01T20:00:00Z",
                "Location": "Blue Note",
                "Description": "Live quartet"
            },
            {"ID": 2}
        ])))
        .await;
        let mut screen = load(&server).await;

        assert_eq!(screen.events().len(), 2);
        let table = screen.table.as_ref().unwrap();
        assert_eq!(
            table.selected(),
            Some(&EventCard {
                title: "Jazz Night".to_string(),
                date: "July 1, 2024".to_string(),
                location: "Blue Note".to_string(),
                description: "Live quartet".to_string(),
            })
        );

        screen
            .handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE))
            .unwrap();
        let second = screen.table.as_ref().and_then(Table::selected).unwrap();
        assert_eq!(second.title, "Untitled Event");
        assert_eq!(second.date, "Date TBD");
        assert_eq!(second.location, "Location TBD");
    }

    #[tokio::test]
    async fn mistyped_record_does_not_fail_the_listing() {
        let server = serve(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "ID": "1",
                "Name": "Jazz Night",
                "DateTime": "2024-07-01T20:00:00Z",
                "Location": "Blue Note"
            },
            {"ID": "2", "Name": "Expo", "DateTime": 1_719_864_000_000_u64, "Location": "Hall"},
            {"ID": "3", "Name": 42}
        ])))
        .await;
        let mut screen = load(&server).await;

        assert_eq!(screen.state.error(), None);
        assert_eq!(screen.events().len(), 3);
        let first = screen.table.as_ref().and_then(Table::selected).unwrap();
        assert_eq!(first.title, "Jazz Night");
        assert_eq!(first.date, "July 1, 2024");

        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        screen.handle_key(down).unwrap();
        let second = screen.table.as_ref().and_then(Table::selected).unwrap();
        assert_eq!(second.title, "Expo");
        assert_eq!(second.date, "Invalid Date");
        assert_eq!(second.location, "Hall");

        screen.handle_key(down).unwrap();
        let third = screen.table.as_ref().and_then(Table::selected).unwrap();
        assert_eq!(third.title, "42");
        assert_eq!(third.date, "Date TBD");
    }

    #[tokio::test]
    async fn select_toggles_details() {
        let server = serve(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"ID": 1, "Name": "Gala"}])),
        )
        .await;
        let mut screen = load(&server).await;
        assert!(screen.show_details);

        let result = screen
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert!(result.is_consumed());
        assert!(!screen.show_details);
    }

    #[test]
    fn stale_result_is_ignored() {
        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = EventsScreen::new(&h.ctx);
        screen.queue(EventsMsg::Fetched {
            generation: Generation::default(),
            outcome: Ok(vec![EventRecord {
                id: "9".to_string(),
                name: Some("Old".to_string()),
                description: None,
                date_time: None,
                location: None,
            }]),
        });
        screen.update().unwrap();

        assert!(screen.state.is_loading());
        assert!(screen.events().is_empty());
    }
}
