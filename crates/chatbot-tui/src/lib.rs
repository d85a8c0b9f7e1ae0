//! chatbot-tui: Terminal UI for the chatbot client
//!
//! This crate provides the interactive front-end:
//! - Transcript renderer and loading indicator
//! - Single-line input with history
//! - The event loop that runs sends on background tasks

mod app;
mod event;
pub mod loading;
#[cfg(test)]
pub mod test_utils;
pub mod transcript;
mod ui;

pub use app::App;
pub use chatbot_engine;
pub use event::{Action, Event, EventHandler};

use chatbot_engine::{Controller, SendOutcome};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Tick rate of the event loop (drives the spinner).
const TICK_RATE_MS: u64 = 100;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// Sets up the terminal, runs the event loop until the user quits, then
/// purges the persisted transcript and restores the terminal.
pub async fn run_tui(controller: Controller) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller);
    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    // Session ends here; a crash skips this and leaves the history for the
    // next start.
    app.controller.teardown();

    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    // At most one send in flight; the controller rejects a second one.
    let mut send_handle: Option<JoinHandle<SendOutcome>> = None;

    loop {
        terminal.draw(|frame| ui::render_app(frame, app))?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    let action = event::key_to_action(key);
                    if let Some(pending) = app.handle_action(action) {
                        debug!(chars = pending.prompt().chars().count(), "sending message");
                        send_handle = Some(tokio::spawn(pending.resolve()));
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => {
                        app.handle_action(Action::ScrollUp);
                    }
                    MouseEventKind::ScrollDown => {
                        app.handle_action(Action::ScrollDown);
                    }
                    _ => {}
                },
                Event::Tick => app.tick(),
                Event::Resize(_, _) => {
                    // Terminal will handle resize automatically
                }
            }
        }

        if send_handle.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = send_handle.take() {
                match handle.await {
                    Ok(outcome) => app.apply_outcome(outcome),
                    Err(e) => {
                        error!("send task failed: {e}");
                        app.handle_send_failure();
                    }
                }
            }
        }

        if app.should_quit {
            if let Some(handle) = send_handle.take() {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

/// Returns the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
