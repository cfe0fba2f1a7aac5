//! Headless mode for the clanker TUI.
//!
//! Runs the chat without a real terminal so it can be driven from tests
//! and scripts. Input is sent over a channel and the rendered screen is
//! published after every frame.

use crate::app::App;
use crate::chat;
use crate::event::Action;
use crate::requests::InFlight;
use clanker_engine::{ConversationService, CyclePhase, Timings};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default terminal dimensions for headless mode.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// State captured from the headless TUI after each render.
#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    pub should_quit: bool,
    pub show_help: bool,
    /// Text in the input line.
    pub input: String,
    /// Whether a request is in flight.
    pub sending: bool,
    pub cycle_phase: Option<CyclePhase>,
    pub conversation_id: Option<String>,
}

enum HeadlessInput {
    Action(Action),
    Key(KeyEvent),
}

/// Handle to control a headless TUI instance.
pub struct HeadlessHandle {
    input_tx: mpsc::UnboundedSender<HeadlessInput>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send an action to the TUI.
    ///
    /// Returns `true` if the action was sent successfully.
    pub fn send_action(&self, action: Action) -> bool {
        self.input_tx.send(HeadlessInput::Action(action)).is_ok()
    }

    /// Send a key press to the TUI.
    pub fn send_key(&self, key: KeyEvent) -> bool {
        self.input_tx.send(HeadlessInput::Key(key)).is_ok()
    }

    /// Type `text` into the input.
    pub fn type_text(&self, text: &str) -> bool {
        text.chars()
            .all(|c| self.send_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
    }

    /// Type `text` and press Enter.
    pub fn send_message(&self, text: &str) -> bool {
        self.type_text(text) && self.send_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    /// Get the current state of the TUI.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a condition is met on the state.
    ///
    /// Returns the state when the condition is met, or `None` if timed out.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = Instant::now() + timeout;

        loop {
            let state = self.state();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match tokio::time::timeout(remaining, self.state_rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) | Err(_) => return None,
            }
        }
    }

    /// Wait for specific text to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        self.wait_for(|s| s.screen_contents.contains(text), timeout)
            .await
    }

    /// Check if the TUI has quit.
    pub fn has_quit(&self) -> bool {
        self.state().should_quit
    }
}

/// Configuration for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u16,
    pub height: u16,
    /// Animation pacing; `tick_rate_ms` also paces the loop.
    pub timings: Timings,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            timings: Timings {
                tick_rate_ms: 50,
                ..Timings::default()
            },
        }
    }
}

/// Run the TUI in headless mode against `service`.
///
/// Returns a handle to control the TUI and a join handle for the background task.
///
/// ```ignore
/// let (mut handle, task) = run_tui_headless(service, HeadlessConfig::default());
/// handle.send_message("book me a haircut");
/// handle.wait_for_text("Perfect!", Duration::from_secs(1)).await;
/// handle.send_action(Action::Quit);
/// task.await.unwrap();
/// ```
pub fn run_tui_headless(
    service: Arc<dyn ConversationService>,
    config: HeadlessConfig,
) -> (HeadlessHandle, JoinHandle<Result<(), String>>) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());

    let task = tokio::spawn(async move {
        run_headless_loop(service, config, input_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    (HeadlessHandle { input_tx, state_rx }, task)
}

async fn run_headless_loop(
    service: Arc<dyn ConversationService>,
    config: HeadlessConfig,
    mut input_rx: mpsc::UnboundedReceiver<HeadlessInput>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let backend = TestBackend::new(config.width, config.height);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.timings);
    let mut requests = InFlight::default();
    let tick_duration = config.timings.tick_rate();

    loop {
        terminal.draw(|frame| chat::render(&app, frame.area(), frame.buffer_mut()))?;

        let phase = app.session.cycle_phase();
        let _ = state_tx.send(HeadlessState {
            screen_contents: buffer_to_string(terminal.backend().buffer()),
            should_quit: app.should_quit,
            show_help: app.show_help,
            input: app.input.content().to_string(),
            sending: app.session.is_sending(),
            cycle_phase: (phase != CyclePhase::Idle).then_some(phase),
            conversation_id: app.session.conversation_id().map(String::from),
        });

        if app.should_quit {
            break;
        }

        requests.drain_finished(&mut app).await;

        let outbound = tokio::select! {
            input = input_rx.recv() => match input {
                Some(HeadlessInput::Action(action)) => app.handle_action(action),
                Some(HeadlessInput::Key(key)) => app.handle_key(key),
                None => break,
            },
            () = tokio::time::sleep(tick_duration) => {
                app.tick(Instant::now());
                None
            }
        };

        if let Some(outbound) = outbound {
            requests.spawn(&service, outbound);
        }
    }

    requests.abort_all();
    Ok(())
}

/// Convert a terminal buffer to a string representation.
fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}
