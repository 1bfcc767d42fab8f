//! Application shell: owns the terminal loop, the mounted screen and the
//! app-wide UI (status bar, toasts, help overlay, theme).

use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::commands::Command;
use crate::config::{AppConfig, GlobalAction, KeyResolver};
use crate::screen::{Screen, ScreenContext, ScreenId, ScreenMsg};
use crate::storage::{KeyValueStore, TOKEN_KEY};
use crate::theme::{Palette, ThemeController};
use crate::tui::{Event, Tui};
use crate::ui::{
    Component, EventResult, HelpEvent, HelpOverlay, KeybindingSection, SessionState, StatusBar,
    Toast, ToastManager,
};

const STATUS_BAR_HEIGHT: u16 = 6;

/// App-level messages sent by commands and screens.
#[derive(Debug, Clone)]
pub enum AppMessage {
    /// A command returned an error.
    CommandFailed { name: String, error: String },
    /// A session token was stored.
    SignedIn { identifier: String },
}

pub struct App {
    ctx: ScreenContext,
    resolver: Arc<KeyResolver>,
    palette: Palette,
    theme: ThemeController,
    screen_id: ScreenId,
    screen: Box<dyn Screen>,
    /// Cancelled when the current screen is unmounted.
    screen_token: CancellationToken,
    help: Option<HelpOverlay>,
    toasts: ToastManager,
    status_bar: StatusBar,
    app_rx: UnboundedReceiver<AppMessage>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        initial_screen: ScreenId,
    ) -> Result<Self> {
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
        let api = ApiClient::new(&config.api.base_url)?;

        let mut palette = Palette::from_config(&config.theme);
        let theme = ThemeController::initialize(&config.theme.preference, &mut palette);

        let mut status_bar = StatusBar::new(api.base_url(), Arc::clone(&resolver));
        status_bar.set_scheme(theme.scheme());
        match store.get(TOKEN_KEY) {
            Ok(Some(_)) => status_bar.set_session(SessionState::SignedIn),
            Ok(None) => {}
            Err(e) => warn!("Failed to read stored session: {e}"),
        }

        let ctx = ScreenContext {
            api,
            store,
            resolver: Arc::clone(&resolver),
            app_tx,
        };
        let screen = initial_screen.create(&ctx);

        Ok(Self {
            ctx,
            resolver,
            palette,
            theme,
            screen_id: initial_screen,
            screen,
            screen_token: CancellationToken::new(),
            help: None,
            toasts: ToastManager::new(),
            status_bar,
            app_rx,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        info!(screen = %self.screen_id, "Mounting initial screen");
        self.activate_screen();

        while !self.should_quit {
            let Some(event) = tui.next_event().await else {
                break;
            };

            match event {
                Event::Quit => self.should_quit = true,
                Event::Tick => self.handle_tick(),
                Event::Render => self.render(&mut tui)?,
                Event::Resize(width, height) => {
                    tui.resize(width, height)?;
                    self.render(&mut tui)?;
                }
                Event::Key(key) => self.handle_key(key)?,
                Event::Paste(text) => {
                    if self.help.is_none() {
                        self.screen.handle_paste(&text);
                    }
                }
            }

            self.handle_app_messages();
            self.update_screen();
        }

        self.screen_token.cancel();
        tui.exit()?;
        Ok(())
    }

    /// Replace the current screen, cancelling everything the old one started.
    fn mount(&mut self, id: ScreenId) {
        info!(from = %self.screen_id, to = %id, "Switching screen");
        self.screen_token.cancel();
        self.screen_token = CancellationToken::new();
        self.screen_id = id;
        self.screen = id.create(&self.ctx);
        self.activate_screen();
    }

    fn activate_screen(&mut self) {
        self.screen.init();
        self.update_screen();
    }

    fn update_screen(&mut self) {
        match self.screen.update() {
            Ok(ScreenMsg::Idle) => {}
            Ok(ScreenMsg::Run(commands)) => {
                for command in commands {
                    self.spawn(command);
                }
            }
            Err(e) => {
                error!(screen = %self.screen_id, "Screen update failed: {e}");
                self.toasts.show(Toast::error(e.to_string()));
            }
        }
    }

    fn spawn(&self, command: Box<dyn Command>) {
        let name = command.name();
        let token = self.screen_token.clone();
        let app_tx = self.ctx.app_tx.clone();
        debug!(command = %name, "Spawning command");

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => debug!(command = %name, "Command cancelled"),
                result = command.execute(app_tx.clone()) => {
                    if let Err(e) = result {
                        error!(command = %name, "Command failed: {e}");
                        let _ = app_tx.send(AppMessage::CommandFailed {
                            name,
                            error: e.to_string(),
                        });
                    }
                }
            }
        });
    }

    fn handle_app_messages(&mut self) {
        while let Ok(msg) = self.app_rx.try_recv() {
            match msg {
                AppMessage::CommandFailed { name, error } => {
                    self.toasts.show(Toast::error(format!("{name} failed: {error}")));
                }
                AppMessage::SignedIn { identifier } => {
                    self.status_bar.set_session(SessionState::SignedIn);
                    self.toasts
                        .show(Toast::success(format!("Signed in as {identifier}")));
                }
            }
        }
    }

    fn handle_tick(&mut self) {
        self.screen.handle_tick();
        self.toasts.handle_tick();
    }

    /// Keys go to the help overlay if open, then the screen, then global bindings.
    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if let Some(help) = &mut self.help {
            if help.handle_key(key)? == EventResult::Event(HelpEvent::Close) {
                self.help = None;
            }
            return Ok(());
        }

        if self.screen.handle_key(key)?.is_consumed() {
            self.update_screen();
            return Ok(());
        }

        let r = Arc::clone(&self.resolver);
        if r.matches_global(&key, GlobalAction::Quit) {
            self.should_quit = true;
        } else if r.matches_global(&key, GlobalAction::Help) {
            self.help = Some(HelpOverlay::new(self.help_sections(), r));
        } else if r.matches_global(&key, GlobalAction::Theme) {
            self.theme.toggle(&mut self.palette);
            self.status_bar.set_scheme(self.theme.scheme());
            self.toasts
                .show(Toast::info(format!("Switched to {} mode", self.theme.scheme())));
        } else if r.matches_global(&key, GlobalAction::SwitchScreen) {
            self.mount(self.screen_id.next());
        }
        Ok(())
    }

    fn help_sections(&self) -> Vec<KeybindingSection> {
        vec![
            KeybindingSection::new(self.screen.title(), self.screen.keybindings()),
            KeybindingSection::new("Global", self.status_bar.global_keybindings()),
        ]
    }

    fn render(&mut self, tui: &mut Tui) -> Result<()> {
        tui.draw(|frame| self.draw(frame))
    }

    fn draw(&mut self, frame: &mut Frame) {
        let theme = *self.palette.active();
        let area = frame.area();

        frame.render_widget(
            Block::default().style(Style::default().bg(theme.base()).fg(theme.text())),
            area,
        );

        let [main_area, status_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(STATUS_BAR_HEIGHT)])
                .areas(area);

        let block = Block::default()
            .title(format!(" {} ", self.screen.title()))
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));
        let content_area = block.inner(main_area);
        frame.render_widget(block, main_area);

        self.screen.render(frame, content_area, &theme);

        let keybindings = self.screen.keybindings();
        self.status_bar
            .render_with_keybindings(frame, status_area, &theme, &keybindings);

        self.toasts.render(frame, main_area, &theme);

        if let Some(help) = &mut self.help {
            help.render(frame, area, &theme);
        }
    }
}
