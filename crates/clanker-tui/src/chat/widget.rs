//! Chat view widget.
//!
//! Renders the timeline as message bubbles above a one-line input.

use std::time::Duration;

use clanker_engine::format::PENDING_PLACEHOLDER;
use clanker_engine::{Message, Role, Timeline, TimelineItem};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    symbols::line,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::typing::typing_sentence;
use crate::ui::text::{pad_to_width, visual_width, wrap_text};
use crate::ui::theme::{spinner_frame, Styles};
use crate::ui::widgets::TextInputState;

/// Height of the input area (in lines).
const INPUT_HEIGHT: u16 = 1;

/// Height of the divider line.
const DIVIDER_HEIGHT: u16 = 1;

/// Placeholder shown in the empty input.
const INPUT_PLACEHOLDER: &str = "iMessage";

/// Receipt shown under the most recent user message.
const DELIVERED: &str = "Delivered";

/// Chat view combining the timeline and the input.
///
/// ```text
/// ┌─ Clanker ───────────────────────────┐
/// │              iMessage               │
/// │          Today 9:41 AM              │
/// │                                     │
/// │  Hey, I'm Clanker, your personal    │
/// │  butler, what are you trying to...  │
/// │                                     │
/// │              book me a haircut      │
/// │                        Delivered    │
/// ├─────────────────────────────────────┤
/// │ > _iMessage                         │
/// └─────────────────────────────────────┘
/// ```
pub struct ChatView<'a> {
    timeline: &'a Timeline,
    input: &'a TextInputState,
    tick: usize,
    tick_rate: Duration,
    /// Lines scrolled up from the bottom.
    scroll: usize,
    sending: bool,
}

impl<'a> ChatView<'a> {
    pub fn new(timeline: &'a Timeline, input: &'a TextInputState) -> Self {
        Self {
            timeline,
            input,
            tick: 0,
            tick_rate: Duration::from_millis(250),
            scroll: 0,
            sending: false,
        }
    }

    /// Set the animation clock.
    #[must_use]
    pub fn tick(mut self, tick: usize, tick_rate: Duration) -> Self {
        self.tick = tick;
        self.tick_rate = tick_rate;
        self
    }

    #[must_use]
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Whether a request is in flight (the input is shown unfocused).
    #[must_use]
    pub fn sending(mut self, sending: bool) -> Self {
        self.sending = sending;
        self
    }

    /// Build every timeline line for the given width.
    pub fn timeline_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let last_user = self.timeline.last_user_index();

        for (idx, item) in self.timeline.items().iter().enumerate() {
            match item {
                TimelineItem::Separator { text, .. } => {
                    lines.push(Line::from(Span::styled(text.clone(), Styles::dim())).centered());
                }
                TimelineItem::Message(message) => {
                    if idx > 0 {
                        lines.push(Line::default());
                    }
                    lines.extend(self.bubble(message, width));
                    if Some(idx) == last_user {
                        lines.push(
                            Line::from(Span::styled(format!("{DELIVERED} "), Styles::dim()))
                                .right_aligned(),
                        );
                    }
                }
            }
        }

        lines
    }

    fn display_text(&self, message: &Message) -> String {
        if !message.pending {
            return message.content.clone();
        }
        let spinner = spinner_frame(self.tick);
        if message.content == PENDING_PLACEHOLDER {
            format!("{spinner} {}", typing_sentence(self.tick, self.tick_rate))
        } else {
            format!("{spinner} {}", message.content)
        }
    }

    fn bubble(&self, message: &Message, width: usize) -> Vec<Line<'static>> {
        let max_bubble = (width * 3 / 4).max(12).min(width);
        let text_width = max_bubble.saturating_sub(2).max(1);

        let text = self.display_text(message);
        let wrapped = wrap_text(&text, text_width);
        let inner = wrapped.iter().map(|l| visual_width(l)).max().unwrap_or(0);

        let style = match (message.role, message.pending) {
            (Role::User, _) => Styles::user_bubble(),
            (Role::Bot, true) => Styles::pending_bubble(),
            (Role::Bot, false) => Styles::bot_bubble(),
        };

        wrapped
            .iter()
            .map(|l| {
                let span = Span::styled(format!(" {} ", pad_to_width(l, inner)), style);
                match message.role {
                    Role::User => Line::from(vec![span, Span::raw(" ")]).right_aligned(),
                    Role::Bot => Line::from(vec![Span::raw(" "), span]),
                }
            })
            .collect()
    }

    fn render_timeline(&self, area: Rect, buf: &mut Buffer) {
        let lines = self.timeline_lines(area.width as usize);
        let height = area.height as usize;
        let overflow = lines.len().saturating_sub(height);
        let top = overflow - self.scroll.min(overflow);

        #[allow(clippy::cast_possible_truncation)]
        Paragraph::new(lines)
            .style(Styles::default())
            .scroll((top as u16, 0))
            .render(area, buf);
    }

    fn render_divider(area: Rect, buf: &mut Buffer) {
        if area.width == 0 {
            return;
        }
        let divider = line::HORIZONTAL.repeat(area.width as usize);
        Paragraph::new(Line::from(Span::styled(divider, Styles::border()))).render(area, buf);
    }
}

impl Widget for ChatView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.sending {
            Styles::border()
        } else {
            Styles::border_active()
        };

        let block = Block::default()
            .title(" Clanker ")
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(crate::ui::theme::Palette::BG));

        let inner = block.inner(area);
        block.render(area, buf);

        let input = self
            .input
            .widget()
            .focused(!self.sending)
            .placeholder(INPUT_PLACEHOLDER);

        if inner.height < INPUT_HEIGHT + DIVIDER_HEIGHT + 1 {
            input.render(inner, buf);
            return;
        }

        let timeline_height = inner.height - INPUT_HEIGHT - DIVIDER_HEIGHT;
        let divider_y = inner.y + timeline_height;
        let input_y = divider_y + DIVIDER_HEIGHT;

        self.render_timeline(Rect::new(inner.x, inner.y, inner.width, timeline_height), buf);
        Self::render_divider(Rect::new(inner.x, divider_y, inner.width, DIVIDER_HEIGHT), buf);
        input.render(Rect::new(inner.x, input_y, inner.width, INPUT_HEIGHT), buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{buffer_to_string, create_test_terminal_sized};
    use clanker_engine::NewMessage;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_pending_placeholder_shows_typing_sentence() {
        let mut timeline = Timeline::new();
        timeline.append_user_message("hi").unwrap();
        let input = TextInputState::new();

        let view = ChatView::new(&timeline, &input);
        let texts: Vec<_> = view.timeline_lines(40).iter().map(line_text).collect();
        assert!(texts.iter().any(|t| t.contains("| Searching the internet...")));
        assert!(!texts.iter().any(|t| t.contains(PENDING_PLACEHOLDER)));
    }

    #[test]
    fn test_pending_content_keeps_text() {
        let mut timeline = Timeline::new();
        timeline.append_message(NewMessage::pending_bot("Scheduling..."));
        let input = TextInputState::new();

        let view = ChatView::new(&timeline, &input).tick(1, Duration::from_millis(250));
        let texts: Vec<_> = view.timeline_lines(40).iter().map(line_text).collect();
        assert!(texts.iter().any(|t| t.contains("/ Scheduling...")));
    }

    #[test]
    fn test_delivered_only_under_last_user_message() {
        let mut timeline = Timeline::new();
        let first = timeline.append_user_message("one").unwrap();
        timeline.resolve_pending(first, "ok");
        timeline.append_user_message("two").unwrap();
        let input = TextInputState::new();

        let lines = ChatView::new(&timeline, &input).timeline_lines(40);
        let texts: Vec<_> = lines.iter().map(line_text).collect();
        let delivered: Vec<_> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| t.contains(DELIVERED))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(delivered.len(), 1);
        assert!(texts[delivered[0] - 1].contains("two"));
    }

    #[test]
    fn test_bubbles_fit_width() {
        let mut timeline = Timeline::new();
        timeline.append_message(NewMessage::bot(
            "Perfect! I've made an appointment for you at A Cuts.\n\n\u{1f4de} Call them at 555-0100 to confirm your appointment.",
        ));
        let input = TextInputState::new();

        for line in ChatView::new(&timeline, &input).timeline_lines(30) {
            assert!(line.width() <= 30, "line too wide: {:?}", line_text(&line));
        }
    }

    #[test]
    fn test_scrolls_to_latest_message() {
        let mut timeline = Timeline::new();
        for i in 0..20 {
            let id = timeline.append_user_message(&format!("message {i}")).unwrap();
            timeline.resolve_pending(id, format!("reply {i}"));
        }
        let input = TextInputState::new();

        let mut terminal = create_test_terminal_sized(40, 12);
        terminal
            .draw(|frame| {
                frame.render_widget(ChatView::new(&timeline, &input), frame.area());
            })
            .unwrap();

        let screen = buffer_to_string(terminal.backend().buffer());
        assert!(screen.contains("reply 19"));
        assert!(!screen.contains("message 0 "));
    }

    #[test]
    fn test_minimum_size_does_not_panic() {
        let timeline = Timeline::new();
        let input = TextInputState::new();
        let mut terminal = create_test_terminal_sized(8, 3);
        terminal
            .draw(|frame| {
                frame.render_widget(ChatView::new(&timeline, &input), frame.area());
            })
            .unwrap();
    }
}
