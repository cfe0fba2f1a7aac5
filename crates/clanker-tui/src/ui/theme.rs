//! Theme and styling definitions for the clanker TUI.

use ratatui::style::{Color, Modifier, Style};

/// Color palette for the TUI.
pub struct Palette;

impl Palette {
    // Base colors
    pub const BG: Color = Color::Rgb(28, 28, 30);
    pub const FG: Color = Color::Rgb(235, 235, 240);
    pub const DIM: Color = Color::Rgb(142, 142, 147);

    // Bubbles
    pub const USER_BUBBLE: Color = Color::Rgb(10, 132, 255);
    pub const BOT_BUBBLE: Color = Color::Rgb(58, 58, 60);

    pub const ACCENT: Color = Color::Rgb(10, 132, 255);

    // Status bar colors (high contrast)
    pub const STATUS_BG: Color = Color::Rgb(44, 44, 46);
    pub const STATUS_KEY_BG: Color = Color::Rgb(72, 72, 74);

    pub const WARNING: Color = Color::Rgb(255, 214, 10);

    // Border colors
    pub const BORDER: Color = Color::Rgb(72, 72, 74);
    pub const BORDER_ACTIVE: Color = Color::Rgb(10, 132, 255);
}

/// Indicator symbols.
pub struct Symbols;

impl Symbols {
    pub const SPINNER: [&'static str; 4] = ["|", "/", "-", "\\"];
}

/// Common styles used throughout the TUI.
pub struct Styles;

impl Styles {
    /// Default text style.
    pub fn default() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BG)
    }

    /// Dimmed text for separators, placeholders and receipts.
    pub fn dim() -> Style {
        Style::default().fg(Palette::DIM).bg(Palette::BG)
    }

    pub fn user_bubble() -> Style {
        Style::default().fg(Color::White).bg(Palette::USER_BUBBLE)
    }

    pub fn bot_bubble() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::BOT_BUBBLE)
    }

    /// Bot bubble whose content is still changing.
    pub fn pending_bubble() -> Style {
        Self::bot_bubble().add_modifier(Modifier::ITALIC)
    }

    /// Title style.
    pub fn title() -> Style {
        Style::default()
            .fg(Palette::FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn active() -> Style {
        Style::default().fg(Palette::ACCENT).bg(Palette::BG)
    }

    pub fn warning() -> Style {
        Style::default().fg(Palette::WARNING).bg(Palette::STATUS_BG)
    }

    /// Key hint style (for status bar) - bright on dark for visibility.
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Palette::FG)
            .bg(Palette::STATUS_KEY_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint label style - readable on status bar background.
    pub fn key_label() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Status bar background style.
    pub fn status_bar() -> Style {
        Style::default().fg(Palette::FG).bg(Palette::STATUS_BG)
    }

    /// Border style for inactive elements.
    pub fn border() -> Style {
        Style::default().fg(Palette::BORDER)
    }

    /// Border style for active/focused elements.
    pub fn border_active() -> Style {
        Style::default().fg(Palette::BORDER_ACTIVE)
    }
}

/// Spinner frame for the given tick.
pub fn spinner_frame(tick: usize) -> &'static str {
    Symbols::SPINNER[tick % Symbols::SPINNER.len()]
}
