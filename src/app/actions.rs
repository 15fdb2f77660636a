//! Actions representing side effects to be executed by the screen runtime.
//!
//! This module defines the [`Action`] type, the imperative commands produced by
//! the event handler after processing user input, clock ticks or worker
//! responses. Actions are the boundary between pure state transitions and
//! effectful work such as API calls, storage writes and file downloads.
//!
//! # Architecture
//!
//! The event handler returns a `Vec<Action>` after processing each event, so
//! several side effects can be queued atomically. The runtime executes them in
//! order.
//!
//! # Example
//!
//! ```rust
//! use aptdesk::api::ListQuery;
//! use aptdesk::app::Action;
//! use aptdesk::domain::EntityKind;
//! use aptdesk::worker::{FetchReason, WorkerMessage};
//!
//! let actions = vec![Action::PostToWorker(WorkerMessage::fetch_list(
//!     EntityKind::Household,
//!     1,
//!     1,
//!     FetchReason::Initial,
//!     ListQuery::new(),
//! ))];
//! assert_eq!(actions.len(), 1);
//! ```

use crate::domain::{EntityKind, ExportFile};
use crate::storage::{ActivityEntry, Preferences, SavedFilters, SearchHistory};
use crate::worker::WorkerMessage;

/// Commands representing side effects to be executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Posts a request to the background worker thread.
    PostToWorker(WorkerMessage),

    /// Persists the screen's view preferences.
    SavePreferences {
        kind: EntityKind,
        preferences: Preferences,
    },

    /// Persists the committed search history.
    SaveSearchHistory {
        kind: EntityKind,
        history: SearchHistory,
    },

    /// Persists the saved filter snapshots.
    SaveFilters {
        kind: EntityKind,
        filters: SavedFilters,
    },

    /// Appends an entry to the screen's activity log.
    RecordActivity {
        kind: EntityKind,
        entry: ActivityEntry,
    },

    /// Hands a finished export to the user.
    Download(ExportFile),

    /// The API rejected the session token.
    ///
    /// Authentication is owned by the session layer; the screen only reports it.
    SessionExpired { status: u16 },
}
