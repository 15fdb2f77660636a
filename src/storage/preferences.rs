//! Per-screen view preferences.
//!
//! Preferences are read once when a screen mounts and written whenever the
//! user explicitly changes the view mode, page size, filters or sort. They
//! never expire.

use serde::{Deserialize, Serialize};

use super::backend::{read_json, write_json, KeyValueStore};
use crate::app::filter::{FilterSpec, SortSpec};
use crate::app::modes::ViewMode;
use crate::app::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::{EntityKind, Result};

/// Persisted presentation settings for one list screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    #[serde(default)]
    pub filters: FilterSpec,
    #[serde(default)]
    pub sort: SortSpec,
}

const fn default_items_per_page() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::default(),
            items_per_page: DEFAULT_PAGE_SIZE,
            filters: FilterSpec::default(),
            sort: SortSpec::default(),
        }
    }
}

impl Preferences {
    /// Storage key, e.g. `householdListPreferences`.
    #[must_use]
    pub fn key(kind: EntityKind) -> String {
        format!("{}Preferences", kind.screen_key())
    }

    /// Loads the screen's preferences, falling back to defaults when absent.
    ///
    /// A stored page size of zero is corrected to the default.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub fn load(store: &dyn KeyValueStore, kind: EntityKind) -> Result<Self> {
        let _span = tracing::debug_span!("load_preferences", %kind).entered();
        let mut prefs: Self = read_json(store, &Self::key(kind))?.unwrap_or_default();
        if prefs.items_per_page == 0 {
            tracing::warn!("stored page size was zero, using default");
            prefs.items_per_page = DEFAULT_PAGE_SIZE;
        }
        Ok(prefs)
    }

    /// Persists the preferences for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, store: &mut dyn KeyValueStore, kind: EntityKind) -> Result<()> {
        let _span = tracing::debug_span!("save_preferences", %kind).entered();
        write_json(store, &Self::key(kind), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::filter::SortDirection;
    use crate::domain::Household;
    use crate::storage::MemoryStore;

    #[test]
    fn missing_preferences_use_defaults() {
        let store = MemoryStore::new();
        let prefs = Preferences::load(&store, EntityKind::Household).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn saved_preferences_are_restored() {
        let mut store = MemoryStore::new();
        let prefs = Preferences {
            view_mode: ViewMode::Card,
            items_per_page: 50,
            filters: FilterSpec::new().with::<Household>("building", "C").unwrap(),
            sort: SortSpec::new("createdAt", SortDirection::Desc),
        };
        prefs.save(&mut store, EntityKind::Household).unwrap();

        assert!(store.get("householdListPreferences").unwrap().is_some());
        let loaded = Preferences::load(&store, EntityKind::Household).unwrap();
        assert_eq!(loaded, prefs);
        assert_eq!(
            Preferences::load(&store, EntityKind::Resident).unwrap(),
            Preferences::default()
        );
    }

    #[test]
    fn zero_page_size_is_corrected() {
        let mut store = MemoryStore::new();
        store
            .set("vehicleListPreferences", r#"{"itemsPerPage":0}"#)
            .unwrap();
        let prefs = Preferences::load(&store, EntityKind::Vehicle).unwrap();
        assert_eq!(prefs.items_per_page, DEFAULT_PAGE_SIZE);
    }
}
