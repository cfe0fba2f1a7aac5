//! The chat screen.
//!
//! The only screen clanker has: the timeline with its input, a status
//! bar, and an optional help overlay.

mod typing;
mod widget;

pub use widget::ChatView;

use crate::app::App;
use crate::ui::{centered_fixed, main_layout, KeyHint, StatusBar, Styles};
use clanker_engine::CyclePhase;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Render the whole screen for `app`.
pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let (main, status) = main_layout(area);

    ChatView::new(app.session.timeline(), &app.input)
        .tick(app.tick, app.timings.tick_rate())
        .scroll(app.scroll)
        .sending(app.session.is_sending())
        .render(main, buf);

    let right = if let Some(note) = &app.notification {
        Some((note.as_str(), Styles::warning()))
    } else if app.session.is_sending() {
        Some(("waiting for reply", Styles::status_bar()))
    } else if app.session.cycle_phase() == CyclePhase::Idle {
        None
    } else {
        Some(("booking", Styles::status_bar()))
    };

    let mut bar = StatusBar::new("CHAT").hints(vec![
        KeyHint::new("Enter", "send"),
        KeyHint::new("F1", "help"),
        KeyHint::new("^C", "quit"),
    ]);
    if let Some((text, style)) = right {
        bar = bar.right(text, style);
    }
    bar.render(status, buf);

    if app.show_help {
        render_help_overlay(area, buf);
    }
}

/// Render the help overlay.
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    let help_text = r"
  Enter             Send message
  Up/Down           Previous messages
  PgUp/PgDn         Scroll chat
  Ctrl+Up/Down      Scroll one line
  Esc               Dismiss notice
  Ctrl+C            Quit
  F1                Toggle this help

  [Press any key to close]
";

    let width = 44.min(area.width.saturating_sub(4));
    let height = 13.min(area.height.saturating_sub(4));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(Styles::title())
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .style(Styles::default());

    Paragraph::new(help_text)
        .block(block)
        .style(Styles::default())
        .render(overlay_area, buf);
}
