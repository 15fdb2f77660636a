//! Title bar and statistics panel.

use crate::ui::helpers::Canvas;
use crate::ui::viewmodel::{HeaderInfo, StatsInfo};

/// Renders the centered title with the lifecycle label, then the stats line.
///
/// # Layout
///
/// ```text
///               Households (57) · loading
/// 57 total · 50 active · 7 inactive │ A: 20  B: 37
/// ```
pub fn render_header(canvas: &mut Canvas<'_>, header: &HeaderInfo) {
    let theme = canvas.theme();

    canvas.bold();
    canvas.fg(&theme.colors.header_fg);
    if let Some(bg) = &theme.colors.header_bg {
        canvas.bg(bg);
    }
    let title = if header.phase == "ready" {
        header.title.trim().to_string()
    } else {
        format!("{} · {}", header.title.trim(), header.phase)
    };
    canvas.centered(&title);
    canvas.reset();
    canvas.newline();

    render_stats(canvas, &header.stats);
}

fn render_stats(canvas: &mut Canvas<'_>, stats: &StatsInfo) {
    let theme = canvas.theme();

    canvas.fg(&theme.colors.text_normal);
    canvas.text(&format!("{} total · ", stats.total));
    canvas.fg(&theme.colors.active_fg);
    canvas.text(&format!("{} active", stats.active));
    canvas.fg(&theme.colors.text_normal);
    canvas.text(" · ");
    canvas.fg(&theme.colors.inactive_fg);
    canvas.text(&format!("{} inactive", stats.inactive));

    if !stats.groups.is_empty() {
        let groups = stats
            .groups
            .iter()
            .map(|(group, count)| format!("{group}: {count}"))
            .collect::<Vec<_>>()
            .join("  ");
        canvas.fg(&theme.colors.text_dim);
        canvas.text(&format!(" │ {groups}"));
    }
    canvas.reset();
    canvas.newline();
}
