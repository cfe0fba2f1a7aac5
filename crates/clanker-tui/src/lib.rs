//! clanker-tui: Terminal chat UI for the clanker booking assistant
//!
//! This crate provides the TUI layer for clanker, including:
//! - The chat screen with message bubbles and a typing indicator
//! - The business cycling animation driven by ticks
//! - Headless mode for testing and automation

mod app;
mod chat;
mod event;
pub mod headless;
mod requests;
#[cfg(test)]
pub mod test_utils;
mod ui;

pub use app::App;
pub use event::{Action, Event, EventHandler};
pub use clanker_engine;

use clanker_engine::{build_service, Config};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use requests::InFlight;
use std::io::{self, stdout};
use std::sync::Arc;
use tokio::time::Instant;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Run the chat TUI.
///
/// Sets up the terminal, runs the event loop, and restores the terminal
/// on exit.
pub async fn run_tui(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_service(config)?;

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.timings);
    let mut events = EventHandler::new(config.timings.tick_rate());

    tracing::info!(transport = ?config.transport, "Starting chat");
    let result = run_loop(&mut terminal, &mut app, &mut events, &service).await;

    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    service: &Arc<dyn clanker_engine::ConversationService>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut requests = InFlight::default();

    loop {
        terminal.draw(|frame| chat::render(app, frame.area(), frame.buffer_mut()))?;

        let Some(event) = events.next().await else {
            break;
        };

        let outbound = match event {
            Event::Key(key) => app.handle_key(key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => app.handle_action(Action::ScrollUp),
                MouseEventKind::ScrollDown => app.handle_action(Action::ScrollDown),
                _ => None,
            },
            Event::Tick => {
                app.tick(Instant::now());
                None
            }
            Event::Paste(text) => {
                app.paste(&text);
                None
            }
            // Terminal handles resize on the next draw
            Event::Resize(_, _) => None,
        };

        if let Some(outbound) = outbound {
            requests.spawn(service, outbound);
        }

        requests.drain_finished(app).await;

        if app.should_quit {
            break;
        }
    }

    requests.abort_all();
    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
