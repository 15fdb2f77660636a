//! View model types representing renderable UI state.
//!
//! View models are computed from a screen's state by
//! `ListState::compute_viewmodel()` and consumed by the renderer. They contain
//! no business logic, only display-ready data.
//!
//! # Example
//!
//! ```rust
//! use aptdesk::app::ViewMode;
//! use aptdesk::ui::viewmodel::*;
//!
//! let vm = UIViewModel {
//!     header: HeaderInfo {
//!         title: "Households".to_string(),
//!         phase: "ready".to_string(),
//!         stats: StatsInfo { total: 1, active: 1, inactive: 0, groups: vec![("A".to_string(), 1)] },
//!     },
//!     search_bar: SearchBarInfo { query: String::new(), filters: vec![], sort: "apartmentNumber asc".to_string() },
//!     display_items: vec![DisplayItem {
//!         id: "1".to_string(),
//!         name: "A-101".to_string(),
//!         detail: "Bldg A".to_string(),
//!         is_active: true,
//!         is_selected: false,
//!         highlight_ranges: vec![],
//!     }],
//!     view_mode: ViewMode::Table,
//!     bulk_bar: None,
//!     import_pending: None,
//!     footer: FooterInfo { range: "(1-1 of 1)".to_string(), page: 1, total_pages: 1, page_size: 10, keybindings: String::new() },
//!     notifications: vec![],
//!     empty_state: None,
//!     error: None,
//! };
//! assert_eq!(vm.display_items.len(), 1);
//! ```

use crate::app::modes::ViewMode;
use crate::app::notifications::NotificationKind;

/// Key hints. The footer, bulk bar and error banner all quote these.
pub mod keys {
    /// Leaves the error state.
    pub const RETRY: char = 'r';

    pub const BROWSE: &str =
        "/: search  f: filter  s: sort  n/p: page  space: select  a: all  r: refresh  q: quit";

    pub const SELECTION: &str =
        "A: activate  D: deactivate  x: delete  e: export  c: clear selection  q: quit";

    /// Compact form of [`SELECTION`] for the bulk bar.
    pub const BULK_BAR: &str = "A: activate | D: deactivate | x: delete | e: export | c: clear";

    pub const IMPORT: &str = "y: import | n: discard";
}

/// Complete UI view model for one list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UIViewModel {
    pub header: HeaderInfo,
    pub search_bar: SearchBarInfo,

    /// Rows of the current page.
    pub display_items: Vec<DisplayItem>,

    pub view_mode: ViewMode,

    /// Present while at least one record is selected.
    pub bulk_bar: Option<BulkBarInfo>,

    /// Number of previewed import rows waiting for confirmation.
    pub import_pending: Option<usize>,

    pub footer: FooterInfo,
    pub notifications: Vec<NotificationItem>,

    /// Shown instead of rows when the view is empty.
    pub empty_state: Option<EmptyState>,

    /// Last failure, shown while the screen is in the error phase.
    pub error: Option<String>,
}

/// Title bar and statistics panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
    /// Lifecycle label (`loading`, `ready`, ...).
    pub phase: String,
    pub stats: StatsInfo,
}

/// Counts over the filtered view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsInfo {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// `(group, count)` pairs sorted by group name.
    pub groups: Vec<(String, usize)>,
}

/// Search input, active filter chips and sort indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    pub query: String,
    /// `(field, value)` pairs for every active filter.
    pub filters: Vec<(String, String)>,
    pub sort: String,
}

/// One record on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub id: String,
    pub name: String,
    pub detail: String,
    pub is_active: bool,
    pub is_selected: bool,

    /// Character ranges of `name` matching the search term.
    ///
    /// Each tuple is `(start_index, end_index)` in character indices, end exclusive.
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// Bulk action bar state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkBarInfo {
    pub selected: usize,
    /// Whether every record in the filtered view is selected.
    pub all_selected: bool,
}

/// Pagination footer and keybinding hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    /// Item range such as `(1-20 of 57)`.
    pub range: String,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub keybindings: String,
}

/// A visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
}

/// Empty state message display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    /// Primary message (e.g., "No households found").
    pub message: String,

    /// Secondary explanatory text.
    pub subtitle: String,
}
