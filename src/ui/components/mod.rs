//! Component renderers.
//!
//! Each component writes a block of whole lines into a [`Canvas`]. The frame
//! is assembled top to bottom:
//!
//! ```text
//! [Header + stats]
//! [Border]
//! [Search box + filter chips]
//! [Bulk bar, when something is selected]
//! [Import bar, while previewed rows wait]
//! [Notifications]
//! [Error banner | Empty state | Column headers + rows]
//! [Border]
//! [Footer]
//! ```

mod empty;
mod footer;
mod header;
mod search;
mod status;
mod table;

use crate::ui::helpers::Canvas;
use crate::ui::viewmodel::UIViewModel;

/// Writes a complete frame for `vm`.
pub fn render_frame(canvas: &mut Canvas<'_>, vm: &UIViewModel) {
    header::render_header(canvas, &vm.header);
    canvas.rule();
    search::render_search_bar(canvas, &vm.search_bar);

    if let Some(bar) = &vm.bulk_bar {
        status::render_bulk_bar(canvas, bar);
    }
    if let Some(rows) = vm.import_pending {
        status::render_import_bar(canvas, rows);
    }
    status::render_notifications(canvas, &vm.notifications);

    if let Some(error) = &vm.error {
        status::render_error(canvas, error);
    }

    if let Some(empty) = &vm.empty_state {
        empty::render_empty_state(canvas, empty);
    } else {
        table::render_table_headers(canvas, vm.view_mode);
        table::render_rows(canvas, &vm.display_items, vm.view_mode);
    }

    canvas.rule();
    footer::render_footer(canvas, &vm.footer);
}
