//! Credential form that exchanges an identifier and secret for a session token.

use std::sync::Arc;

use async_trait::async_trait;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::Theme;
use crate::api::{ApiClient, ApiError, Credentials};
use crate::app::AppMessage;
use crate::commands::Command;
use crate::config::{KeyResolver, LoginAction};
use crate::screen::{Screen, ScreenContext, ScreenMsg};
use crate::storage::{KeyValueStore, TOKEN_KEY};
use crate::ui::{Component, ErrorBanner, EventResult, Keybinding, Spinner, TextInput};
use crate::view_state::{Generation, Phase, ViewState};

const FORM_WIDTH: u16 = 56;
/// Form width less its border and inner margin.
const BANNER_WIDTH: u16 = FORM_WIDTH - 4;
const NETWORK_ERROR: &str = "Network error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Identifier,
    Secret,
}

#[derive(Debug)]
enum LoginMsg {
    Submit,
    Finished {
        generation: Generation,
        identifier: String,
        /// The session token, or a user-facing failure message.
        outcome: Result<String, String>,
    },
}

pub struct LoginScreen {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    resolver: Arc<KeyResolver>,
    app_tx: UnboundedSender<AppMessage>,
    identifier: TextInput,
    secret: TextInput,
    focus: Field,
    state: ViewState<()>,
    spinner: Spinner,
    msg_tx: UnboundedSender<LoginMsg>,
    msg_rx: UnboundedReceiver<LoginMsg>,
}

impl LoginScreen {
    pub fn new(ctx: &ScreenContext) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let mut screen = Self {
            api: ctx.api.clone(),
            store: Arc::clone(&ctx.store),
            resolver: Arc::clone(&ctx.resolver),
            app_tx: ctx.app_tx.clone(),
            identifier: TextInput::new("Email").with_placeholder("you@example.com"),
            secret: TextInput::new("Password").masked(),
            focus: Field::Identifier,
            state: ViewState::new(),
            spinner: Spinner::new().with_label("Signing in..."),
            msg_tx,
            msg_rx,
        };
        screen.set_focus(Field::Identifier);
        screen
    }

    fn queue(&self, msg: LoginMsg) {
        let _ = self.msg_tx.send(msg);
    }

    fn set_focus(&mut self, field: Field) {
        self.focus = field;
        self.identifier.set_focused(field == Field::Identifier);
        self.secret.set_focused(field == Field::Secret);
    }

    fn focused_input(&mut self) -> &mut TextInput {
        match self.focus {
            Field::Identifier => &mut self.identifier,
            Field::Secret => &mut self.secret,
        }
    }

    fn toggle_focus(&mut self) {
        let next = match self.focus {
            Field::Identifier => Field::Secret,
            Field::Secret => Field::Identifier,
        };
        self.set_focus(next);
    }

    /// Mark empty fields and focus the first one. Returns false if any is empty.
    fn validate(&mut self) -> bool {
        let mut first_empty = None;
        for (field, input) in [
            (Field::Identifier, &mut self.identifier),
            (Field::Secret, &mut self.secret),
        ] {
            if input.is_empty() {
                input.mark_required();
                first_empty.get_or_insert(field);
            }
        }

        match first_empty {
            Some(field) => {
                self.set_focus(field);
                false
            }
            None => true,
        }
    }

    fn submit(&mut self) -> ScreenMsg {
        if self.state.is_loading() {
            debug!("Ignoring submit while a login is in flight");
            return ScreenMsg::Idle;
        }
        if !self.validate() {
            debug!("Login form incomplete");
            return ScreenMsg::Idle;
        }

        let credentials = Credentials::new(self.identifier.value(), self.secret.value());
        let generation = self.state.begin();
        info!(%generation, "Submitting login");

        SubmitLoginCmd {
            api: self.api.clone(),
            credentials,
            generation,
            msg_tx: self.msg_tx.clone(),
        }
        .into()
    }

    fn finish(&mut self, generation: Generation, identifier: String, outcome: Result<String, String>) {
        if !self.state.is_current(generation) {
            debug!(%generation, "Ignoring result of superseded login");
            return;
        }

        // The token is written only for the request the form is still waiting on.
        let outcome = outcome.and_then(|token| {
            self.store
                .set(TOKEN_KEY, &token)
                .map_err(|e| format!("Could not save session: {e}"))
        });

        let signed_in = outcome.is_ok();
        if let Err(message) = &outcome {
            warn!(%generation, %message, "Login failed");
        }
        self.state.finish(generation, outcome);

        if signed_in {
            info!(%generation, "Signed in");
            let _ = self.app_tx.send(AppMessage::SignedIn { identifier });
        }
    }

    fn process_message(&mut self, msg: LoginMsg) -> ScreenMsg {
        match msg {
            LoginMsg::Submit => self.submit(),
            LoginMsg::Finished {
                generation,
                identifier,
                outcome,
            } => {
                self.finish(generation, identifier, outcome);
                ScreenMsg::Idle
            }
        }
    }

    fn banner_height(&self) -> u16 {
        self.state
            .error()
            .map_or(0, |message| ErrorBanner::new(message).height(BANNER_WIDTH))
    }

    fn render_submit(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        if self.state.is_loading() {
            self.spinner.render(frame, area, theme);
            return;
        }

        let key = self.resolver.display_login(LoginAction::Submit);
        let line = Line::from(vec![
            Span::styled(
                " Sign in ",
                Style::default()
                    .fg(theme.base())
                    .bg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {key}"), Style::default().fg(theme.overlay1())),
        ]);
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }
}

impl Screen for LoginScreen {
    fn handle_tick(&mut self) {
        if self.state.is_loading() {
            self.spinner.handle_tick();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<()>> {
        let r = Arc::clone(&self.resolver);

        if r.matches_login(&key, LoginAction::Submit) {
            self.queue(LoginMsg::Submit);
            return Ok(EventResult::Consumed);
        }
        if r.matches_login(&key, LoginAction::NextField)
            || r.matches_login(&key, LoginAction::PreviousField)
        {
            self.toggle_focus();
            return Ok(EventResult::Consumed);
        }
        if r.matches_login(&key, LoginAction::RevealSecret) {
            let revealed = self.secret.toggle_reveal();
            debug!(revealed, "Toggled password visibility");
            return Ok(EventResult::Consumed);
        }

        self.focused_input().handle_key(key)
    }

    fn handle_paste(&mut self, text: &str) -> bool {
        self.focused_input().insert_str(text);
        true
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
        let banner = self.state.error().map(ErrorBanner::new);
        let banner_height = self.banner_height();

        let form_area = area.centered(
            Constraint::Length(FORM_WIDTH),
            Constraint::Length(13 + banner_height),
        );

        let block = Block::default()
            .title(" Sign in to EventSpark ")
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()))
            .style(Style::default().bg(theme.mantle()));
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let [banner_area, identifier_area, secret_area, _, submit_area, status_area] =
            Layout::vertical([
                Constraint::Length(banner_height),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .margin(1)
            .areas(inner);

        if let Some(banner) = banner {
            banner.render(frame, banner_area, theme);
        }
        self.identifier.render(frame, identifier_area, theme);
        self.secret.render(frame, secret_area, theme);
        self.render_submit(frame, submit_area, theme);

        if matches!(self.state.phase(), Phase::Ready(())) {
            let status = Paragraph::new("Signed in. Session saved.")
                .style(Style::default().fg(theme.success()))
                .alignment(Alignment::Center);
            frame.render_widget(status, status_area);
        }
    }

    fn title(&self) -> &'static str {
        "Sign in"
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_login(LoginAction::Submit), "Sign in"),
            Keybinding::hint(
                format!(
                    "{}/{}",
                    r.display_login(LoginAction::NextField),
                    r.display_login(LoginAction::PreviousField)
                ),
                "Next/previous field",
            ),
            Keybinding::hint(r.display_login(LoginAction::RevealSecret), "Show/hide password"),
        ]
    }
}

/// Posts credentials and reports the token or a failure message back to the form.
struct SubmitLoginCmd {
    api: ApiClient,
    credentials: Credentials,
    generation: Generation,
    msg_tx: UnboundedSender<LoginMsg>,
}

#[async_trait]
impl Command for SubmitLoginCmd {
    fn name(&self) -> String {
        format!("Signing in as {}", self.credentials.identifier)
    }

    async fn execute(self: Box<Self>, _app_tx: UnboundedSender<AppMessage>) -> Result<()> {
        let outcome = self
            .api
            .login(&self.credentials)
            .await
            .map_err(|e| failure_message(&e));

        let msg = LoginMsg::Finished {
            generation: self.generation,
            identifier: self.credentials.identifier,
            outcome,
        };
        if self.msg_tx.send(msg).is_err() {
            debug!("Login screen closed before the result arrived");
        }
        Ok(())
    }
}

fn failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Rejected { message, .. } => format!("Login failed: {message}"),
        ApiError::Decode(_) => "Login failed: unexpected response from server".to_string(),
        ApiError::Transport(e) => {
            warn!("Login request failed: {e}");
            NETWORK_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::screen::testing::{self, Harness};

    fn press(screen: &mut LoginScreen, code: KeyCode) {
        screen
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap();
    }

    fn type_str(screen: &mut LoginScreen, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    fn fill(screen: &mut LoginScreen, identifier: &str, secret: &str) {
        type_str(screen, identifier);
        press(screen, KeyCode::Tab);
        type_str(screen, secret);
    }

    /// Press submit and run whatever the screen asks for.
    async fn submit(screen: &mut LoginScreen, h: &Harness) -> usize {
        press(screen, KeyCode::Enter);
        let ran = testing::run(screen.update().unwrap(), &h.ctx).await;
        screen.update().unwrap();
        ran
    }

    #[tokio::test]
    async fn rejected_login_shows_message_and_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "invalid credentials"})),
            )
            .mount(&server)
            .await;

        let h = testing::harness(&server.uri());
        let mut screen = LoginScreen::new(&h.ctx);
        fill(&mut screen, "ana@example.com", "wrong");

        assert_eq!(submit(&mut screen, &h).await, 1);

        let error = screen.state.error().unwrap();
        assert!(error.contains("invalid credentials"), "error: {error}");
        assert!(!screen.state.is_loading());
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn successful_login_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_json(serde_json::json!({
                "email": "ana@example.com",
                "password": "s3cret"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "login successful",
                "token": "abc123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut h = testing::harness(&server.uri());
        let mut screen = LoginScreen::new(&h.ctx);
        fill(&mut screen, "ana@example.com", "s3cret");

        submit(&mut screen, &h).await;

        assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
        assert_eq!(screen.state.phase(), &Phase::Ready(()));
        assert!(matches!(
            h.app_rx.try_recv(),
            Ok(AppMessage::SignedIn { identifier }) if identifier == "ana@example.com"
        ));
    }

    #[tokio::test]
    async fn empty_fields_block_submission() {
        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = LoginScreen::new(&h.ctx);
        type_str(&mut screen, "ana@example.com");

        assert_eq!(submit(&mut screen, &h).await, 0);
        assert_eq!(screen.state.phase(), &Phase::Idle);
        assert!(screen.secret.is_marked_required());
        assert!(!screen.identifier.is_marked_required());
        assert_eq!(screen.focus, Field::Secret);
    }

    #[tokio::test]
    async fn submit_while_submitting_sends_nothing() {
        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = LoginScreen::new(&h.ctx);
        fill(&mut screen, "ana@example.com", "s3cret");

        press(&mut screen, KeyCode::Enter);
        let first = screen.update().unwrap();
        assert!(matches!(&first, ScreenMsg::Run(commands) if commands.len() == 1));
        assert!(screen.state.is_loading());

        press(&mut screen, KeyCode::Enter);
        assert!(matches!(screen.update().unwrap(), ScreenMsg::Idle));
        assert!(screen.state.is_loading());
    }

    #[tokio::test]
    async fn missing_token_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "login successful"})),
            )
            .mount(&server)
            .await;

        let h = testing::harness(&server.uri());
        let mut screen = LoginScreen::new(&h.ctx);
        fill(&mut screen, "ana@example.com", "s3cret");
        submit(&mut screen, &h).await;

        assert_eq!(
            screen.state.error(),
            Some("Login failed: unexpected response from server")
        );
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let h = testing::harness(&format!("http://127.0.0.1:{port}"));
        let mut screen = LoginScreen::new(&h.ctx);
        fill(&mut screen, "ana@example.com", "s3cret");
        submit(&mut screen, &h).await;

        assert_eq!(screen.state.error(), Some(NETWORK_ERROR));
    }

    #[tokio::test]
    async fn resubmitting_clears_previous_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
            .mount(&server)
            .await;

        let h = testing::harness(&server.uri());
        let mut screen = LoginScreen::new(&h.ctx);
        fill(&mut screen, "ana@example.com", "s3cret");
        submit(&mut screen, &h).await;
        assert_eq!(screen.state.error(), Some("Login failed: database down"));

        press(&mut screen, KeyCode::Enter);
        screen.update().unwrap();
        assert!(screen.state.is_loading());
        assert_eq!(screen.state.error(), None);
    }

    #[test]
    fn reveal_toggles_password_visibility() {
        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = LoginScreen::new(&h.ctx);
        screen
            .handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))
            .unwrap();
        // Revealed by the key, so toggling again hides it.
        assert!(!screen.secret.toggle_reveal());
    }

    #[test]
    fn stale_result_is_ignored() {
        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = LoginScreen::new(&h.ctx);
        screen.queue(LoginMsg::Finished {
            generation: Generation::default(),
            identifier: "ana@example.com".to_string(),
            outcome: Ok("late-token".to_string()),
        });
        screen.update().unwrap();

        assert_eq!(screen.state.phase(), &Phase::Idle);
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn banner_reserves_rows_for_wrapped_message() {
        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = LoginScreen::new(&h.ctx);
        let generation = screen.state.begin();
        let message = ["word"; 20].join(" ");
        screen.state.finish(generation, Err(message));

        // Nine words fit beside the marker, ten on the next row, one left over.
        assert_eq!(screen.banner_height(), 5);
    }

    #[test]
    fn identifier_stays_out_of_the_log() {
        use std::io;
        use std::sync::{Arc, Mutex, PoisonError};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                let mut bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let h = testing::harness("http://127.0.0.1:9");
        let mut screen = LoginScreen::new(&h.ctx);
        tracing::subscriber::with_default(subscriber, || {
            fill(&mut screen, "ana@example.com", "s3cret");
            press(&mut screen, KeyCode::Enter);
            screen.update().unwrap();
            screen.queue(LoginMsg::Finished {
                generation: screen.state.generation(),
                identifier: "ana@example.com".to_string(),
                outcome: Ok("abc123".to_string()),
            });
            screen.update().unwrap();
        });

        let bytes = captured.0.lock().unwrap().clone();
        let log = String::from_utf8(bytes).unwrap();
        assert!(log.contains("Signed in"), "log: {log}");
        assert!(!log.contains("ana@example.com"), "log: {log}");
        assert!(!log.contains("s3cret"), "log: {log}");
    }
}
