//! Shared rendering utilities.
//!
//! Components write into a [`Canvas`], a line buffer that emits ANSI styling
//! only when color output is enabled. Widths are counted in characters, not
//! bytes, so non-ASCII names pad correctly.

use crate::ui::theme::Theme;

/// Output buffer shared by all components for one frame.
pub struct Canvas<'a> {
    out: String,
    theme: &'a Theme,
    color: bool,
    cols: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(theme: &'a Theme, cols: usize, color: bool) -> Self {
        Self {
            out: String::new(),
            theme,
            color,
            cols,
        }
    }

    pub const fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    pub fn fg(&mut self, hex: &str) {
        if self.color {
            self.out.push_str(&Theme::fg(hex));
        }
    }

    pub fn bg(&mut self, hex: &str) {
        if self.color {
            self.out.push_str(&Theme::bg(hex));
        }
    }

    pub fn bold(&mut self) {
        if self.color {
            self.out.push_str(Theme::bold());
        }
    }

    pub fn dim(&mut self) {
        if self.color {
            self.out.push_str(Theme::dim());
        }
    }

    pub fn reset(&mut self) {
        if self.color {
            self.out.push_str(Theme::reset());
        }
    }

    pub fn text(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn spaces(&mut self, count: usize) {
        self.out.extend(std::iter::repeat(' ').take(count));
    }

    pub fn newline(&mut self) {
        self.out.push('\n');
    }

    /// Writes `text` centered in the canvas width, padded on both sides.
    pub fn centered(&mut self, text: &str) {
        let len = visible_len(text).min(self.cols);
        let left = self.cols.saturating_sub(len) / 2;
        self.spaces(left);
        self.text(text);
        self.spaces(self.cols.saturating_sub(left + len));
    }

    /// Horizontal rule in the border color.
    pub fn rule(&mut self) {
        let theme = self.theme;
        self.fg(&theme.colors.border);
        self.text(&"─".repeat(self.cols));
        self.reset();
        self.newline();
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl std::fmt::Debug for Canvas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("cols", &self.cols)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// Width of `text` in characters.
#[must_use]
pub fn visible_len(text: &str) -> usize {
    text.chars().count()
}

/// Writes `text` with the character ranges in `ranges` highlighted.
///
/// Ranges are `(start, end)` character indices, end exclusive, sorted and
/// non-overlapping. Selected rows skip match highlighting so the selection
/// background stays uniform.
pub fn render_highlighted_text(
    canvas: &mut Canvas<'_>,
    text: &str,
    ranges: &[(usize, usize)],
    is_selected: bool,
) {
    if ranges.is_empty() || is_selected {
        canvas.text(text);
        return;
    }

    let colors = &canvas.theme().colors;

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start < current_pos || start >= end {
            continue;
        }

        canvas.text(&chars[current_pos..start].iter().collect::<String>());
        canvas.fg(&colors.match_highlight_fg);
        canvas.bg(&colors.match_highlight_bg);
        canvas.text(&chars[start..end].iter().collect::<String>());
        canvas.reset();
        canvas.fg(&colors.text_normal);

        current_pos = end;
    }

    if current_pos < chars.len() {
        canvas.text(&chars[current_pos..].iter().collect::<String>());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_canvas_has_no_escapes() {
        let theme = Theme::default();
        let mut canvas = Canvas::new(&theme, 10, false);
        canvas.bold();
        canvas.centered("abcd");
        canvas.reset();
        assert_eq!(canvas.finish(), "   abcd   ");
    }

    #[test]
    fn highlight_keeps_text_intact_without_color() {
        let theme = Theme::default();
        let mut canvas = Canvas::new(&theme, 20, false);
        render_highlighted_text(&mut canvas, "Kovács", &[(0, 2), (4, 9)], false);
        assert_eq!(canvas.finish(), "Kovács");
    }

    #[test]
    fn highlight_wraps_ranges_in_escapes() {
        let theme = Theme::default();
        let mut canvas = Canvas::new(&theme, 20, true);
        render_highlighted_text(&mut canvas, "A-101", &[(0, 2)], false);
        let out = canvas.finish();
        assert!(out.contains(&Theme::bg(&theme.colors.match_highlight_bg)));
        assert!(out.ends_with("101"));
    }

    #[test]
    fn width_counts_characters() {
        assert_eq!(visible_len("Ünal"), 4);
    }
}
