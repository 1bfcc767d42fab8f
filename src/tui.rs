//! Terminal session: raw mode, alternate screen and the input task that feeds
//! [`Event`]s to the app loop.

use std::io::{self, Stdout};
use std::time::Duration;

use color_eyre::Result;
use crossterm::cursor;
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event as CrosstermEvent, EventStream, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use futures::{FutureExt, StreamExt};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Spinner and toast expiry cadence.
const TICK_INTERVAL: Duration = Duration::from_millis(250);
/// Roughly 60 frames per second.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

type Backend = CrosstermBackend<Stdout>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Quit,
    Tick,
    Render,
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
}

impl Event {
    /// Map a terminal event to an app event. Key releases and repeats, mouse
    /// and focus events are dropped. Ctrl+C always quits.
    fn from_terminal(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Press => None,
            CrosstermEvent::Key(key)
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                Some(Self::Quit)
            }
            CrosstermEvent::Key(key) => Some(Self::Key(key)),
            CrosstermEvent::Paste(text) => Some(Self::Paste(text)),
            CrosstermEvent::Resize(width, height) => Some(Self::Resize(width, height)),
            _ => None,
        }
    }
}

/// Owns the terminal for the lifetime of the app. Dropping it restores the
/// terminal even when the app loop bails out with an error.
pub struct Tui {
    terminal: Terminal<Backend>,
    input: Option<JoinHandle<()>>,
    stop: CancellationToken,
    event_rx: UnboundedReceiver<Event>,
    event_tx: UnboundedSender<Event>,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal: Terminal::new(Backend::new(io::stdout()))?,
            input: None,
            stop: CancellationToken::new(),
            event_rx,
            event_tx,
        })
    }

    /// Switch to raw mode on the alternate screen and start reading input.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableBracketedPaste,
            cursor::Hide
        )?;
        self.input = Some(tokio::spawn(read_input(
            self.event_tx.clone(),
            self.stop.clone(),
        )));
        forward_sigterm(self.event_tx.clone());
        Ok(())
    }

    /// Stop reading input and hand the terminal back to the shell.
    pub fn exit(&mut self) -> Result<()> {
        self.stop.cancel();
        if let Some(input) = self.input.take() {
            input.abort();
        }
        if terminal::is_raw_mode_enabled()? {
            self.terminal.flush()?;
            crossterm::execute!(
                io::stdout(),
                DisableBracketedPaste,
                LeaveAlternateScreen,
                cursor::Show
            )?;
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        self.event_rx.recv().await
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.terminal.resize(Rect::new(0, 0, width, height))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.exit() {
            error!("Failed to restore terminal: {e}");
        }
    }
}

/// Merge terminal input with the tick and frame clocks until `stop` fires or
/// the app stops listening.
async fn read_input(event_tx: UnboundedSender<Event>, stop: CancellationToken) {
    let mut input = EventStream::new();
    let mut ticks = interval(TICK_INTERVAL);
    let mut frames = interval(FRAME_INTERVAL);

    loop {
        let event = tokio::select! {
            () = stop.cancelled() => break,
            _ = ticks.tick() => Event::Tick,
            _ = frames.tick() => Event::Render,
            next = input.next().fuse() => match next {
                Some(Ok(raw)) => match Event::from_terminal(raw) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(e)) => {
                    warn!("Terminal input error: {e}");
                    continue;
                }
                None => {
                    debug!("Terminal input closed");
                    break;
                }
            },
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
}

#[cfg(unix)]
fn forward_sigterm(event_tx: UnboundedSender<Event>) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                let _ = event_tx.send(Event::Quit);
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    });
}

#[cfg(not(unix))]
fn forward_sigterm(_event_tx: UnboundedSender<Event>) {}
