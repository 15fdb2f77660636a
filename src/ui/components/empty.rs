//! Empty state message.

use crate::ui::helpers::Canvas;
use crate::ui::viewmodel::EmptyState;

/// Renders a centered message and a dimmed subtitle below it, with a blank
/// line above.
pub fn render_empty_state(canvas: &mut Canvas<'_>, empty: &EmptyState) {
    let theme = canvas.theme();

    canvas.newline();
    canvas.fg(&theme.colors.empty_state_fg);
    canvas.centered(&empty.message);
    canvas.reset();
    canvas.newline();

    canvas.dim();
    canvas.fg(&theme.colors.text_dim);
    canvas.centered(&empty.subtitle);
    canvas.reset();
    canvas.newline();
}
