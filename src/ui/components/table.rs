//! Record rows in the three layout modes.
//!
//! Every mode shows the same [`DisplayItem`]s; they differ only in how many
//! records share a line.

use crate::app::ViewMode;
use crate::ui::helpers::{self, visible_len, Canvas};
use crate::ui::viewmodel::DisplayItem;

/// Width of the name column in table mode.
const NAME_WIDTH: usize = 28;

/// Width of one cell in grid mode.
const GRID_CELL_WIDTH: usize = 24;

/// Column headers, shown in table mode only.
pub fn render_table_headers(canvas: &mut Canvas<'_>, mode: ViewMode) {
    if mode != ViewMode::Table {
        return;
    }
    let theme = canvas.theme();
    canvas.bold();
    canvas.fg(&theme.colors.header_fg);
    canvas.text(&format!("      {:<NAME_WIDTH$} {}", "NAME", "DETAILS"));
    canvas.reset();
    canvas.newline();
}

/// Renders the page's records in `mode`.
pub fn render_rows(canvas: &mut Canvas<'_>, items: &[DisplayItem], mode: ViewMode) {
    match mode {
        ViewMode::Table => items.iter().for_each(|item| render_table_row(canvas, item)),
        ViewMode::Card => items.iter().for_each(|item| render_card(canvas, item)),
        ViewMode::Grid => render_grid(canvas, items),
    }
}

/// `[x]` or `[ ]` followed by a colored status dot.
fn render_marker(canvas: &mut Canvas<'_>, item: &DisplayItem) {
    let theme = canvas.theme();
    canvas.text(if item.is_selected { "[x] " } else { "[ ] " });
    canvas.fg(if item.is_active {
        &theme.colors.active_fg
    } else {
        &theme.colors.inactive_fg
    });
    canvas.text("● ");
    restore_row_color(canvas, item);
}

fn start_row(canvas: &mut Canvas<'_>, item: &DisplayItem) {
    let theme = canvas.theme();
    if item.is_selected {
        canvas.fg(&theme.colors.selection_fg);
        canvas.bg(&theme.colors.selection_bg);
    } else {
        canvas.fg(&theme.colors.text_normal);
    }
}

fn restore_row_color(canvas: &mut Canvas<'_>, item: &DisplayItem) {
    let theme = canvas.theme();
    canvas.fg(if item.is_selected {
        &theme.colors.selection_fg
    } else {
        &theme.colors.text_normal
    });
}

/// ```text
/// [x] ● A-101                        Bldg A · Floor 1 · 3 residents
/// ```
fn render_table_row(canvas: &mut Canvas<'_>, item: &DisplayItem) {
    start_row(canvas, item);
    render_marker(canvas, item);
    helpers::render_highlighted_text(canvas, &item.name, &item.highlight_ranges, item.is_selected);
    canvas.spaces(NAME_WIDTH.saturating_sub(visible_len(&item.name)) + 1);
    canvas.text(&item.detail);

    let used = 6 + NAME_WIDTH.max(visible_len(&item.name)) + 1 + visible_len(&item.detail);
    canvas.spaces(canvas.cols().saturating_sub(used));
    canvas.reset();
    canvas.newline();
}

/// ```text
/// [x] ● A-101
///       Bldg A · Floor 1 · 3 residents
/// ```
fn render_card(canvas: &mut Canvas<'_>, item: &DisplayItem) {
    let theme = canvas.theme();
    start_row(canvas, item);
    render_marker(canvas, item);
    canvas.bold();
    helpers::render_highlighted_text(canvas, &item.name, &item.highlight_ranges, item.is_selected);
    canvas.reset();
    canvas.newline();

    canvas.spaces(6);
    canvas.fg(&theme.colors.text_dim);
    canvas.text(&item.detail);
    canvas.reset();
    canvas.newline();
}

/// Packs as many cells per line as fit in the canvas width.
fn render_grid(canvas: &mut Canvas<'_>, items: &[DisplayItem]) {
    let per_line = (canvas.cols() / GRID_CELL_WIDTH).max(1);
    for line in items.chunks(per_line) {
        for item in line {
            start_row(canvas, item);
            render_marker(canvas, item);
            helpers::render_highlighted_text(
                canvas,
                &item.name,
                &item.highlight_ranges,
                item.is_selected,
            );
            canvas.reset();
            canvas.spaces(GRID_CELL_WIDTH.saturating_sub(6 + visible_len(&item.name)));
        }
        canvas.newline();
    }
}
