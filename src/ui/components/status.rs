//! Bulk action bar, notifications and the error banner.

use crate::ui::helpers::Canvas;
use crate::ui::viewmodel::{keys, BulkBarInfo, NotificationItem};

/// ```text
/// 3 selected · A: activate | D: deactivate | x: delete | e: export | c: clear
/// ```
pub fn render_bulk_bar(canvas: &mut Canvas<'_>, bar: &BulkBarInfo) {
    let theme = canvas.theme();
    canvas.bold();
    canvas.fg(&theme.colors.selection_bg);
    let label = if bar.all_selected {
        format!("{} selected (all)", bar.selected)
    } else {
        format!("{} selected", bar.selected)
    };
    canvas.text(&label);
    canvas.reset();
    canvas.fg(&theme.colors.text_dim);
    canvas.text(&format!(" · {}", keys::BULK_BAR));
    canvas.reset();
    canvas.newline();
}

/// ```text
/// 12 rows ready to import · y: import | n: discard
/// ```
pub fn render_import_bar(canvas: &mut Canvas<'_>, rows: usize) {
    let theme = canvas.theme();
    canvas.bold();
    canvas.fg(&theme.colors.info_fg);
    canvas.text(&format!("{rows} rows ready to import"));
    canvas.reset();
    canvas.fg(&theme.colors.text_dim);
    canvas.text(&format!(" · {}", keys::IMPORT));
    canvas.reset();
    canvas.newline();
}

/// One line per visible notification, colored by kind.
pub fn render_notifications(canvas: &mut Canvas<'_>, notifications: &[NotificationItem]) {
    let theme = canvas.theme();
    for item in notifications {
        canvas.fg(theme.colors.notification(item.kind));
        canvas.text(&format!("• {}", item.message));
        canvas.reset();
        canvas.newline();
    }
}

pub fn render_error(canvas: &mut Canvas<'_>, message: &str) {
    let theme = canvas.theme();
    canvas.bold();
    canvas.fg(&theme.colors.error_fg);
    canvas.text(&format!("error: {message}"));
    canvas.reset();
    canvas.fg(&theme.colors.text_dim);
    canvas.text(&format!("  ({}: retry)", keys::RETRY));
    canvas.reset();
    canvas.newline();
}
