//! Application state and update logic for the clanker TUI.

use crate::event::{key_to_action, Action};
use crate::ui::widgets::TextInputState;
use clanker_engine::{
    ClientError, ConversationReply, ConversationSession, Outbound, SessionError, Timings,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::time::Instant;

/// Lines moved by PageUp/PageDown.
const PAGE_LINES: usize = 5;

/// Application state.
#[derive(Debug)]
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    /// Conversation state.
    pub session: ConversationSession,

    /// Message being typed.
    pub input: TextInputState,

    /// Tick counter for animations.
    pub tick: usize,

    /// Lines scrolled up from the latest message.
    pub scroll: usize,

    /// One-line notice for the status bar.
    pub notification: Option<String>,

    pub timings: Timings,
}

impl App {
    /// Create a new app with a fresh session.
    pub fn new(timings: Timings) -> Self {
        Self::with_session(ConversationSession::new(timings), timings)
    }

    pub fn with_session(session: ConversationSession, timings: Timings) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            session,
            input: TextInputState::new(),
            tick: 0,
            scroll: 0,
            notification: None,
            timings,
        }
    }

    /// Create an app with a fixed greeting timestamp.
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        use chrono::{Local, TimeZone};
        use clanker_engine::Timeline;

        let now = Local
            .with_ymd_and_hms(2024, 5, 1, 9, 41, 0)
            .single()
            .unwrap_or_else(Local::now);
        let timings = Timings::default();
        Self::with_session(
            ConversationSession::with_timeline(Timeline::with_greeting(now), timings),
            timings,
        )
    }

    /// Handle a key press, editing the input or performing an action.
    ///
    /// Returns the request to send when the key submitted a message.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Outbound> {
        if self.show_help {
            self.show_help = false;
            return None;
        }

        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char(c) => {
                    self.input.insert(c);
                    return None;
                }
                KeyCode::Backspace => {
                    self.input.backspace();
                    return None;
                }
                KeyCode::Delete => {
                    self.input.delete();
                    return None;
                }
                KeyCode::Left => {
                    self.input.move_left();
                    return None;
                }
                KeyCode::Right => {
                    self.input.move_right();
                    return None;
                }
                KeyCode::Home => {
                    self.input.move_home();
                    return None;
                }
                KeyCode::End => {
                    self.input.move_end();
                    return None;
                }
                KeyCode::Up => {
                    self.input.history_prev();
                    return None;
                }
                KeyCode::Down => {
                    self.input.history_next();
                    return None;
                }
                _ => {}
            }
        }

        self.handle_action(key_to_action(key))
    }

    /// Insert pasted text into the input. Line breaks are dropped.
    pub fn paste(&mut self, text: &str) {
        if self.show_help {
            return;
        }
        self.input.insert_str(text);
    }

    /// Handle an action.
    ///
    /// Returns the request to send for [`Action::Submit`].
    pub fn handle_action(&mut self, action: Action) -> Option<Outbound> {
        if self.show_help {
            if matches!(action, Action::Help | Action::Back | Action::Quit) {
                self.show_help = false;
            }
            return None;
        }

        match action {
            Action::Quit => {
                self.session.teardown();
                self.should_quit = true;
            }
            Action::Help => self.show_help = true,
            Action::Back => self.notification = None,
            Action::Submit => return self.submit(),
            Action::ScrollUp => self.scroll = self.scroll.saturating_add(1),
            Action::ScrollDown => self.scroll = self.scroll.saturating_sub(1),
            Action::PageUp => self.scroll = self.scroll.saturating_add(PAGE_LINES),
            Action::PageDown => self.scroll = self.scroll.saturating_sub(PAGE_LINES),
            Action::None => {}
        }
        None
    }

    /// Send the current input.
    fn submit(&mut self) -> Option<Outbound> {
        let text = self.input.take();
        match self.session.begin_send(&text) {
            Ok(outbound) => {
                self.input.remember(&text);
                self.scroll = 0;
                self.notification = None;
                Some(outbound)
            }
            Err(SessionError::EmptyMessage) => None,
            Err(e @ SessionError::Busy) => {
                self.input.restore(text);
                self.notification = Some(format!("Can't send yet: {e}"));
                None
            }
        }
    }

    /// Apply the result of a request.
    pub fn complete(&mut self, outbound: Outbound, result: Result<ConversationReply, ClientError>) {
        self.session
            .complete_send(outbound, result, Instant::now());
        self.scroll = 0;
    }

    /// Advance animations.
    pub fn tick(&mut self, now: Instant) {
        self.tick = self.tick.wrapping_add(1);
        if self.session.tick(now) {
            self.scroll = 0;
        }
    }
}
