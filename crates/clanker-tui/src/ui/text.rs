//! Text wrapping and width helpers.

use unicode_width::UnicodeWidthStr;

/// Get the visual width of a string in terminal cells.
///
/// Accounts for wide characters (CJK, emoji) that take 2 cells.
pub fn visual_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Wrap text to `width` cells, keeping explicit line breaks.
///
/// Blank input lines are preserved as empty lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(
            textwrap::wrap(paragraph, width)
                .into_iter()
                .map(std::borrow::Cow::into_owned),
        );
    }
    lines
}

/// Right-pad `s` with spaces to `width` cells.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visual_width(s));
    format!("{s}{}", " ".repeat(pad))
}
