//! Pagination footer and keybinding hints.

use crate::ui::helpers::{visible_len, Canvas};
use crate::ui::viewmodel::FooterInfo;

/// Renders the range and page position on the left, page size on the right,
/// and the keybinding hints centered underneath.
///
/// ```text
/// (1-20 of 57)  page 1/3                                        20 per page
///            space: select | a: all | d: delete | e: export | q: quit
/// ```
pub fn render_footer(canvas: &mut Canvas<'_>, footer: &FooterInfo) {
    let theme = canvas.theme();

    let left = format!("{}  page {}/{}", footer.range, footer.page, footer.total_pages);
    let right = format!("{} per page", footer.page_size);
    canvas.fg(&theme.colors.text_normal);
    canvas.text(&left);
    canvas.spaces(
        canvas
            .cols()
            .saturating_sub(visible_len(&left) + visible_len(&right)),
    );
    canvas.fg(&theme.colors.text_dim);
    canvas.text(&right);
    canvas.reset();
    canvas.newline();

    canvas.fg(&theme.colors.text_dim);
    canvas.centered(&footer.keybindings);
    canvas.reset();
    canvas.newline();
}
