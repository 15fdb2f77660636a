//! Per-screen history kept in client storage.
//!
//! - [`SearchHistory`]: last committed search terms, newest first, with fuzzy suggestions
//! - [`SavedFilters`]: named snapshots of search, filters and sort
//! - [`ActivityLog`]: capped log of mutating bulk actions

use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

use super::backend::{read_json, write_json, KeyValueStore};
use crate::app::filter::{FilterSpec, SortSpec};
use crate::domain::{EntityId, EntityKind, Result};

/// Number of search terms remembered per screen.
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// Number of activity entries kept per screen.
pub const ACTIVITY_LOG_LIMIT: usize = 50;

/// Committed search terms, newest first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHistory {
    terms: Vec<String>,
}

impl SearchHistory {
    #[must_use]
    pub fn key(kind: EntityKind) -> String {
        format!("{}SearchHistory", kind.screen_key())
    }

    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub fn load(store: &dyn KeyValueStore, kind: EntityKind) -> Result<Self> {
        Ok(read_json(store, &Self::key(kind))?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, store: &mut dyn KeyValueStore, kind: EntityKind) -> Result<()> {
        write_json(store, &Self::key(kind), self)
    }

    /// Records a committed term. Returns `false` for blank terms.
    ///
    /// Re-recording an existing term (case-insensitively) moves it to the front.
    pub fn record(&mut self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        let lower = term.to_lowercase();
        self.terms.retain(|t| t.to_lowercase() != lower);
        self.terms.insert(0, term.to_string());
        self.terms.truncate(SEARCH_HISTORY_LIMIT);
        true
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Past terms ranked by fuzzy match against `input`, best first.
    ///
    /// An empty input returns the history as is. Ties keep recency order.
    ///
    /// # Examples
    ///
    /// ```
    /// use aptdesk::storage::SearchHistory;
    ///
    /// let mut history = SearchHistory::default();
    /// history.record("Tran Van An");
    /// history.record("B-1204");
    /// history.record("Nguyen");
    /// assert_eq!(history.suggestions("tvan", 5), vec!["Tran Van An"]);
    /// assert_eq!(history.suggestions("", 2), vec!["Nguyen", "B-1204"]);
    /// ```
    #[must_use]
    pub fn suggestions(&self, input: &str, limit: usize) -> Vec<&str> {
        let input = input.trim();
        if input.is_empty() {
            return self.terms.iter().take(limit).map(String::as_str).collect();
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(i64, &str)> = self
            .terms
            .iter()
            .filter_map(|term| matcher.fuzzy_match(term, input).map(|score| (score, term.as_str())))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, term)| term).collect()
    }
}

/// A named snapshot of search term, filters and sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub name: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filters: FilterSpec,
    #[serde(default)]
    pub sort: SortSpec,
    pub saved_at: DateTime<Utc>,
}

/// Saved filters for one screen, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedFilters {
    entries: Vec<SavedFilter>,
}

impl SavedFilters {
    #[must_use]
    pub fn key(kind: EntityKind) -> String {
        format!("{}SavedFilters", kind.screen_key())
    }

    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub fn load(store: &dyn KeyValueStore, kind: EntityKind) -> Result<Self> {
        Ok(read_json(store, &Self::key(kind))?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, store: &mut dyn KeyValueStore, kind: EntityKind) -> Result<()> {
        write_json(store, &Self::key(kind), self)
    }

    /// Adds a snapshot, replacing any existing one with the same name.
    pub fn upsert(&mut self, filter: SavedFilter) {
        match self.entries.iter_mut().find(|f| f.name == filter.name) {
            Some(existing) => *existing = filter,
            None => self.entries.push(filter),
        }
    }

    /// Removes the snapshot named `name`. Returns `false` if there was none.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|f| f.name != name);
        before != self.entries.len()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SavedFilter> {
        self.entries.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn entries(&self) -> &[SavedFilter] {
        &self.entries
    }
}

/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub action: String,
    pub summary: String,
    #[serde(default)]
    pub ids: Vec<EntityId>,
    pub at: DateTime<Utc>,
}

/// Newest-first log of mutations, capped at [`ACTIVITY_LOG_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    #[must_use]
    pub fn key(kind: EntityKind) -> String {
        format!("{}Activities", kind.screen_key())
    }

    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub fn load(store: &dyn KeyValueStore, kind: EntityKind) -> Result<Self> {
        Ok(read_json(store, &Self::key(kind))?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save(&self, store: &mut dyn KeyValueStore, kind: EntityKind) -> Result<()> {
        write_json(store, &Self::key(kind), self)
    }

    pub fn push(&mut self, entry: ActivityEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(ACTIVITY_LOG_LIMIT);
    }

    #[must_use]
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn history_dedupes_and_caps() {
        let mut history = SearchHistory::default();
        for i in 0..15 {
            history.record(&format!("term {i}"));
        }
        assert!(!history.record("   "));
        history.record("TERM 14");
        assert_eq!(history.terms().len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(history.terms()[0], "TERM 14");
        assert_eq!(history.terms()[1], "term 13");
    }

    #[test]
    fn saved_filters_replace_by_name() {
        let mut saved = SavedFilters::default();
        let at = Utc::now();
        saved.upsert(SavedFilter {
            name: "Block A".into(),
            search: String::new(),
            filters: FilterSpec::default(),
            sort: SortSpec::default(),
            saved_at: at,
        });
        saved.upsert(SavedFilter {
            name: "Block A".into(),
            search: "Tran".into(),
            filters: FilterSpec::default(),
            sort: SortSpec::default(),
            saved_at: at,
        });
        assert_eq!(saved.entries().len(), 1);
        assert_eq!(saved.get("Block A").unwrap().search, "Tran");
        assert!(saved.remove("Block A"));
        assert!(!saved.remove("Block A"));
    }

    #[test]
    fn activity_log_keeps_newest_fifty() {
        let mut store = MemoryStore::new();
        let mut log = ActivityLog::default();
        for i in 0..60 {
            log.push(ActivityEntry {
                action: "activate".into(),
                summary: format!("activated {i}"),
                ids: vec![],
                at: Utc::now(),
            });
        }
        log.save(&mut store, EntityKind::Household).unwrap();
        let loaded = ActivityLog::load(&store, EntityKind::Household).unwrap();
        assert_eq!(loaded.entries().len(), ACTIVITY_LOG_LIMIT);
        assert_eq!(loaded.entries()[0].summary, "activated 59");
        assert!(store.get("householdListActivities").unwrap().is_some());
    }
}
