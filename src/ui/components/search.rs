//! Search box with filter chips and the sort indicator.

use crate::ui::helpers::{visible_len, Canvas};
use crate::ui::viewmodel::SearchBarInfo;

/// Horizontal margin for the search box (spaces on left and right).
const SEARCH_BOX_MARGIN: usize = 2;

/// Renders a three-line bordered box, then one line of chips.
///
/// ```text
///   ┌──────────────────────────────────┐
///   │ Search: a-1                      │
///   └──────────────────────────────────┘
///   [building=A] [status=active]   sort: apartmentNumber asc
/// ```
pub fn render_search_bar(canvas: &mut Canvas<'_>, search: &SearchBarInfo) {
    let theme = canvas.theme();
    let box_width = canvas.cols().saturating_sub(SEARCH_BOX_MARGIN * 2);
    let inner_width = box_width.saturating_sub(2);

    canvas.spaces(SEARCH_BOX_MARGIN);
    canvas.fg(&theme.colors.search_bar_border);
    canvas.text(&format!("┌{}┐", "─".repeat(inner_width)));
    canvas.reset();
    canvas.newline();

    let search_text = format!(" Search: {}", search.query);
    canvas.spaces(SEARCH_BOX_MARGIN);
    canvas.fg(&theme.colors.search_bar_border);
    canvas.text("│");
    canvas.fg(&theme.colors.text_normal);
    canvas.text(&search_text);
    canvas.spaces(inner_width.saturating_sub(visible_len(&search_text)));
    canvas.fg(&theme.colors.search_bar_border);
    canvas.text("│");
    canvas.reset();
    canvas.newline();

    canvas.spaces(SEARCH_BOX_MARGIN);
    canvas.fg(&theme.colors.search_bar_border);
    canvas.text(&format!("└{}┘", "─".repeat(inner_width)));
    canvas.reset();
    canvas.newline();

    let chips = search
        .filters
        .iter()
        .map(|(key, value)| format!("[{key}={value}]"))
        .collect::<Vec<_>>()
        .join(" ");
    canvas.spaces(SEARCH_BOX_MARGIN);
    canvas.fg(&theme.colors.text_normal);
    canvas.text(&chips);
    canvas.fg(&theme.colors.text_dim);
    if !chips.is_empty() {
        canvas.spaces(3);
    }
    canvas.text(&format!("sort: {}", search.sort));
    canvas.reset();
    canvas.newline();
}
