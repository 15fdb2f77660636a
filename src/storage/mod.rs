//! Client-side persistence.
//!
//! Everything the screens remember between sessions goes through the narrow
//! [`KeyValueStore`] interface: view preferences, search history, saved filters
//! and the activity log, each stored as JSON under a per-screen key.
//!
//! # Modules
//!
//! - `backend`: [`KeyValueStore`] trait, [`MemoryStore`] and JSON helpers
//! - `json`: [`JsonStore`], a file-backed store with atomic writes
//! - `preferences`: [`Preferences`] read at mount and written on change
//! - `history`: [`SearchHistory`], [`SavedFilters`] and [`ActivityLog`]

pub mod backend;
pub mod history;
pub mod json;
pub mod preferences;

pub use backend::{read_json, write_json, KeyValueStore, MemoryStore};
pub use history::{
    ActivityEntry, ActivityLog, SavedFilter, SavedFilters, SearchHistory, ACTIVITY_LOG_LIMIT,
    SEARCH_HISTORY_LIMIT,
};
pub use json::JsonStore;
pub use preferences::Preferences;
