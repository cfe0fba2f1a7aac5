//! Single-line message input.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Prompt drawn before the input.
const PROMPT: &str = "> ";

/// Rendered view of a [`TextInputState`].
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    content: &'a str,
    /// Cursor position (character index).
    cursor: usize,
    focused: bool,
    placeholder: Option<&'a str>,
}

impl<'a> TextInput<'a> {
    /// Set focus state.
    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Set placeholder text.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Characters to skip so the cursor stays visible in `width` cells.
    fn scroll_offset(&self, width: usize) -> usize {
        let available = width.saturating_sub(PROMPT.len() + 1);
        let mut used = 0;
        let mut start = self.cursor;
        let before: Vec<char> = self.content.chars().take(self.cursor).collect();
        for ch in before.into_iter().rev() {
            let w = ch.width().unwrap_or(0);
            if used + w > available {
                break;
            }
            used += w;
            start -= 1;
        }
        start
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 || area.width < 1 {
            return;
        }

        let mut spans = vec![Span::styled(PROMPT, Styles::active())];

        if self.content.is_empty() {
            if self.focused {
                spans.push(Span::styled("_", Styles::active()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder, Styles::dim()));
            }
        } else {
            let skip = self.scroll_offset(area.width as usize);
            let before: String = self
                .content
                .chars()
                .skip(skip)
                .take(self.cursor - skip)
                .collect();
            let after: String = self.content.chars().skip(self.cursor).collect();

            spans.push(Span::styled(before, Styles::default()));
            if self.focused {
                let marker = if after.is_empty() { "_" } else { "|" };
                spans.push(Span::styled(marker, Styles::active()));
            }
            if !after.is_empty() {
                spans.push(Span::styled(after, Styles::default()));
            }
        }

        Paragraph::new(Line::from(spans))
            .style(Styles::default())
            .render(area, buf);
    }
}

/// State for a text input, managing content and cursor position.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    /// Cursor position (character index).
    cursor: usize,
    /// Input history for up/down navigation.
    history: Vec<String>,
    /// Current history index (`None` = current input).
    history_index: Option<usize>,
    /// Saved current input when navigating history.
    saved_input: String,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Take the content, clearing the state.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    /// Insert a character at the cursor position. Newlines are ignored.
    pub fn insert(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.insert(ch);
        }
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Record a sent message in history and leave history browsing.
    pub fn remember(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.history.push(text.to_string());
        }
        self.history_index = None;
        self.saved_input.clear();
    }

    /// Put text back after a rejected submit.
    pub fn restore(&mut self, text: String) {
        self.content = text;
        self.cursor = self.char_len();
    }

    /// Navigate to the previous history entry.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }

        let next = match self.history_index {
            None => {
                self.saved_input = self.content.clone();
                0
            }
            Some(i) if i + 1 < self.history.len() => i + 1,
            Some(_) => return,
        };
        self.history_index = Some(next);
        self.content = self.history[self.history.len() - 1 - next].clone();
        self.cursor = self.char_len();
    }

    /// Navigate to the next history entry.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.history_index = None;
                self.content = std::mem::take(&mut self.saved_input);
            }
            Some(i) => {
                self.history_index = Some(i - 1);
                self.content = self.history[self.history.len() - i].clone();
            }
        }
        self.cursor = self.char_len();
    }

    /// Create a widget from this state.
    pub fn widget(&self) -> TextInput<'_> {
        TextInput {
            content: &self.content,
            cursor: self.cursor,
            focused: true,
            placeholder: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    #[test]
    fn test_text_input_state_basic() {
        let mut state = TextInputState::new();
        assert!(state.is_empty());

        state.insert('H');
        state.insert('i');
        assert_eq!(state.content(), "Hi");
        assert_eq!(state.cursor, 2);

        state.backspace();
        assert_eq!(state.content(), "H");

        state.take();
        assert!(state.is_empty());
    }

    #[test]
    fn test_text_input_state_cursor_movement() {
        let mut state = TextInputState::new();
        state.insert_str("Hello");

        state.move_left();
        state.move_left();
        assert_eq!(state.cursor, 3);

        state.insert('X');
        assert_eq!(state.content(), "HelXlo");

        state.move_home();
        assert_eq!(state.cursor, 0);
        state.delete();
        assert_eq!(state.content(), "elXlo");

        state.move_end();
        assert_eq!(state.cursor, 5);
    }

    #[test]
    fn test_text_input_state_multibyte() {
        let mut state = TextInputState::new();
        state.insert_str("café");
        state.move_left();
        state.insert('!');
        assert_eq!(state.content(), "caf!é");
        state.move_end();
        state.backspace();
        assert_eq!(state.content(), "caf!");
    }

    #[test]
    fn test_newlines_ignored() {
        let mut state = TextInputState::new();
        state.insert_str("a\nb");
        assert_eq!(state.content(), "ab");
    }

    #[test]
    fn test_text_input_state_history() {
        let mut state = TextInputState::new();

        state.insert_str("first");
        let sent = state.take();
        state.remember(&sent);
        assert!(state.is_empty());

        state.insert_str("second");
        let sent = state.take();
        state.remember(&sent);

        state.remember("   ");

        state.insert_str("draft");
        state.history_prev();
        assert_eq!(state.content(), "second");

        state.history_prev();
        assert_eq!(state.content(), "first");

        state.history_prev();
        assert_eq!(state.content(), "first");

        state.history_next();
        assert_eq!(state.content(), "second");

        state.history_next();
        assert_eq!(state.content(), "draft");
    }

    #[test]
    fn test_placeholder_rendering() {
        let state = TextInputState::new();
        let area = Rect::new(0, 0, 20, 1);
        let mut buffer = Buffer::empty(area);
        state.widget().placeholder("iMessage").render(area, &mut buffer);
        assert_eq!(buffer_to_string(&buffer), "> _iMessage");
    }

    #[test]
    fn test_long_input_keeps_cursor_visible() {
        let mut state = TextInputState::new();
        state.insert_str("abcdefghijklmnopqrstuvwxyz");
        let area = Rect::new(0, 0, 10, 1);
        let mut buffer = Buffer::empty(area);
        state.widget().render(area, &mut buffer);
        assert_eq!(buffer_to_string(&buffer), "> tuvwxyz_");
    }
}
