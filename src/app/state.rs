//! List screen state and view model computation.
//!
//! [`ListState`] is the single source of truth for one list screen: the cached
//! source collection, the derived view, filters, sort, search, pagination,
//! selection, notifications and the lifecycle phase. It is generic over the
//! [`Entity`] it lists, so the household, resident and vehicle screens share
//! one implementation.
//!
//! # Derived state
//!
//! `view` is always `derive_view(source, filters, search, sort)` and `page` is
//! always clamped to the view's page count. Every mutation that can affect
//! either goes through [`ListState::recompute`].
//!
//! # Example
//!
//! ```rust
//! use aptdesk::app::ListState;
//! use aptdesk::domain::Household;
//!
//! let state: ListState<Household> = ListState::new(Default::default());
//! assert!(state.view.is_empty());
//! let vm = state.compute_viewmodel(80);
//! assert!(vm.empty_state.is_some());
//! ```

use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use serde_json::Value;

use super::filter::{derive_view, FilterSpec, SortSpec, ViewStats};
use super::modes::{ViewMode, ViewPhase};
use super::notifications::{NotificationKind, NotificationQueue, DEFAULT_TTL_MS};
use super::pagination::{paginate, total_pages, Page, DEFAULT_PAGE_SIZE};
use super::selection::SelectionSet;
use super::timers::{Timer, TimerKind};
use crate::api::ListQuery;
use crate::domain::{Entity, EntityId, EntityKind};
use crate::storage::{Preferences, SavedFilters, SearchHistory};
use crate::ui::viewmodel::{
    keys, BulkBarInfo, DisplayItem, EmptyState, FooterInfo, HeaderInfo, NotificationItem,
    SearchBarInfo, StatsInfo, UIViewModel,
};
use crate::worker::{FetchReason, WorkerMessage};

/// Default silent refresh period.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Default delay between the last keystroke and committing a search.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Timing knobs for a list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSettings {
    /// Silent refresh period; `0` disables auto-refresh.
    pub refresh_interval_ms: u64,
    /// Search debounce; `0` commits every keystroke immediately.
    pub search_debounce_ms: u64,
    /// Lifetime of ordinary notifications.
    pub notification_ttl_ms: u64,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            notification_ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

/// State of one list screen.
#[derive(Debug, Clone)]
pub struct ListState<E: Entity> {
    /// Last collection received from the API.
    pub source: Vec<E>,

    /// `source` after search, filters and sort.
    pub view: Vec<E>,

    pub filters: FilterSpec,
    pub sort: SortSpec,

    /// Search text as typed, before debounce.
    pub search_input: String,

    /// Committed search term driving `view`.
    pub search: String,

    /// 1-based page, always within `1..=total_pages`.
    pub page: usize,
    pub page_size: usize,
    pub view_mode: ViewMode,

    /// Selected ids; survives filter, search and page changes.
    pub selection: SelectionSet,
    pub notifications: NotificationQueue,
    pub phase: ViewPhase,

    /// Bumped on mount and unmount; responses from older generations are dropped.
    pub generation: u64,

    /// Id of the most recent fetch; older fetches are superseded.
    pub latest_fetch: u64,

    /// Requests posted in this generation that have not answered yet.
    pub in_flight: usize,

    /// Server-side parameters of the most recent fetch.
    pub last_query: Option<ListQuery>,
    pub last_error: Option<String>,

    pub search_history: SearchHistory,
    pub saved_filters: SavedFilters,

    /// Rows parsed from an uploaded file, waiting for confirmation.
    pub import_preview: Option<Vec<Value>>,

    pub refresh_timer: Timer,
    pub debounce_timer: Timer,
    pub settings: ScreenSettings,

    /// Last clock reading delivered by the runtime.
    pub now: DateTime<Utc>,

    next_request_id: u64,
}

impl<E: Entity> ListState<E> {
    #[must_use]
    pub fn new(settings: ScreenSettings) -> Self {
        Self {
            source: Vec::new(),
            view: Vec::new(),
            filters: FilterSpec::new(),
            sort: SortSpec::default(),
            search_input: String::new(),
            search: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            view_mode: ViewMode::default(),
            selection: SelectionSet::new(),
            notifications: NotificationQueue::new(),
            phase: ViewPhase::Idle,
            generation: 0,
            latest_fetch: 0,
            in_flight: 0,
            last_query: None,
            last_error: None,
            search_history: SearchHistory::default(),
            saved_filters: SavedFilters::default(),
            import_preview: None,
            refresh_timer: Timer::new(TimerKind::AutoRefresh, settings.refresh_interval_ms),
            debounce_timer: Timer::new(TimerKind::SearchDebounce, settings.search_debounce_ms),
            settings,
            now: DateTime::<Utc>::default(),
            next_request_id: 0,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        E::KIND
    }

    /// Re-derives `view` and clamps `page` to the new page count.
    pub fn recompute(&mut self) {
        self.view = derive_view(&self.source, &self.filters, &self.search, &self.sort);
        let pages = total_pages(self.view.len(), self.page_size);
        self.page = self.page.clamp(1, pages);
    }

    /// The page currently shown.
    #[must_use]
    pub fn current_page(&self) -> Page<E> {
        paginate(&self.view, self.page, self.page_size)
    }

    #[must_use]
    pub fn stats(&self) -> ViewStats {
        ViewStats::compute(&self.view, &self.filters.context)
    }

    /// Ids of every record in the filtered view.
    #[must_use]
    pub fn view_ids(&self) -> Vec<EntityId> {
        self.view.iter().map(|e| e.id().clone()).collect()
    }

    /// Records the clock reading. Returns `true` when the reference day for
    /// derived fields changed, in which case the view has been re-derived.
    pub fn set_clock(&mut self, now: DateTime<Utc>) -> bool {
        self.now = now;
        let today = Some(now.date_naive());
        if self.filters.context.as_of == today {
            return false;
        }
        self.filters.context.as_of = today;
        self.recompute();
        true
    }

    /// Queues a notification with the screen's default lifetime.
    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let ttl = self.settings.notification_ttl_ms;
        self.notifications.push(message, kind, self.now, ttl)
    }

    /// Server-side parameters derived from the active filters.
    #[must_use]
    pub fn server_query(&self) -> ListQuery {
        ListQuery::from_filters(&self.filters)
    }

    /// Builds the next fetch request and marks it in flight.
    pub fn begin_fetch(&mut self, reason: FetchReason) -> WorkerMessage {
        self.next_request_id += 1;
        self.latest_fetch = self.next_request_id;
        self.in_flight += 1;
        let query = self.server_query();
        self.last_query = Some(query.clone());
        tracing::debug!(request_id = self.latest_fetch, ?reason, "fetch issued");
        WorkerMessage::fetch_list(E::KIND, self.generation, self.latest_fetch, reason, query)
    }

    /// Marks one non-fetch request in flight.
    pub fn begin_request(&mut self) {
        self.in_flight += 1;
    }

    /// Marks one request of the current generation as answered.
    pub fn finish_request(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Snapshot of the persisted presentation settings.
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        Preferences {
            view_mode: self.view_mode,
            items_per_page: self.page_size,
            filters: self.filters.clone(),
            sort: self.sort.clone(),
        }
    }

    /// Applies persisted settings. The reference day is kept.
    pub fn apply_preferences(&mut self, preferences: Preferences) {
        let context = self.filters.context;
        self.view_mode = preferences.view_mode;
        self.page_size = if preferences.items_per_page == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            preferences.items_per_page
        };
        self.filters = preferences.filters;
        self.filters.context = context;
        self.sort = preferences.sort;
        self.page = 1;
    }

    /// Decodes raw API records, skipping any that do not fit `E`.
    #[must_use]
    pub fn decode_records(records: Vec<Value>) -> Vec<E> {
        let total = records.len();
        let decoded: Vec<E> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<E>(record) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!(kind = %E::KIND, error = %e, "skipping malformed record");
                    None
                }
            })
            .collect();
        if decoded.len() != total {
            tracing::warn!(
                kind = %E::KIND,
                skipped = total - decoded.len(),
                "some records could not be decoded"
            );
        }
        decoded
    }

    /// Computes a renderable view model for a terminal `cols` wide.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use aptdesk::app::ListState;
    /// # use aptdesk::domain::Vehicle;
    /// let state: ListState<Vehicle> = ListState::new(Default::default());
    /// let vm = state.compute_viewmodel(100);
    /// assert_eq!(vm.footer.range, "(0 of 0)");
    /// ```
    #[must_use]
    pub fn compute_viewmodel(&self, cols: usize) -> UIViewModel {
        let page = self.current_page();
        let matcher = if self.search.is_empty() {
            None
        } else {
            Some(SkimMatcherV2::default().ignore_case())
        };

        let display_items = page
            .items
            .iter()
            .map(|entity| self.compute_display_item(entity, cols, matcher.as_ref()))
            .collect();

        let empty_state = self.view.is_empty().then(|| self.compute_empty_state());

        let bulk_bar = (!self.selection.is_empty()).then(|| BulkBarInfo {
            selected: self.selection.len(),
            all_selected: self.selection.is_all_selected(self.view.iter().map(Entity::id)),
        });

        UIViewModel {
            header: self.compute_header(),
            search_bar: self.compute_search_bar(),
            display_items,
            view_mode: self.view_mode,
            bulk_bar,
            import_pending: self.import_preview.as_ref().map(Vec::len),
            footer: self.compute_footer(&page),
            notifications: self
                .notifications
                .items()
                .iter()
                .map(|n| NotificationItem {
                    id: n.id,
                    message: n.message.clone(),
                    kind: n.kind,
                })
                .collect(),
            empty_state,
            error: (self.phase == ViewPhase::Error)
                .then(|| self.last_error.clone())
                .flatten(),
        }
    }

    fn compute_display_item(
        &self,
        entity: &E,
        cols: usize,
        matcher: Option<&SkimMatcherV2>,
    ) -> DisplayItem {
        const NAME_COLUMN_WIDTH: usize = 24;
        const CHROME_WIDTH: usize = 8;

        let name = truncate(&entity.display_name(), NAME_COLUMN_WIDTH);
        let detail = truncate(
            &entity.display_detail(),
            cols.saturating_sub(NAME_COLUMN_WIDTH + CHROME_WIDTH),
        );
        let highlight_ranges =
            matcher.map_or_else(Vec::new, |m| highlight_ranges(&name, &self.search, m));

        DisplayItem {
            id: entity.id().to_string(),
            name,
            detail,
            is_active: entity.is_active(),
            is_selected: self.selection.contains(entity.id()),
            highlight_ranges,
        }
    }

    fn compute_header(&self) -> HeaderInfo {
        let stats = self.stats();
        let title = match E::KIND {
            EntityKind::Household => "Households",
            EntityKind::Resident => "Residents",
            EntityKind::Vehicle => "Vehicles",
        };
        HeaderInfo {
            title: format!(" {title} ({}) ", self.source.len()),
            phase: self.phase.label().to_string(),
            stats: StatsInfo {
                total: stats.total,
                active: stats.active,
                inactive: stats.inactive,
                groups: stats.groups.into_iter().collect(),
            },
        }
    }

    fn compute_search_bar(&self) -> SearchBarInfo {
        let sort_field = if self.sort.field.is_empty() {
            E::DEFAULT_SORT
        } else {
            E::resolve_sort_key(&self.sort.field)
        };
        SearchBarInfo {
            query: self.search_input.clone(),
            filters: self
                .filters
                .predicates
                .iter()
                .filter(|(_, value)| !value.is_all())
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect(),
            sort: format!("{sort_field} {}", self.sort.direction),
        }
    }

    fn compute_footer(&self, page: &Page<E>) -> FooterInfo {
        let range = page.item_range().map_or_else(
            || "(0 of 0)".to_string(),
            |(first, last)| format!("({first}-{last} of {})", page.total_items),
        );
        let keybindings = if self.selection.is_empty() {
            keys::BROWSE
        } else {
            keys::SELECTION
        };
        FooterInfo {
            range,
            page: page.clamped_page,
            total_pages: page.total_pages,
            page_size: self.page_size,
            keybindings: keybindings.to_string(),
        }
    }

    fn compute_empty_state(&self) -> EmptyState {
        let noun = E::KIND.resource();
        match self.phase {
            ViewPhase::Idle | ViewPhase::Loading => EmptyState {
                message: format!("Loading {noun}..."),
                subtitle: String::new(),
            },
            ViewPhase::Error => EmptyState {
                message: format!("Could not load {noun}"),
                subtitle: format!("Press {} to retry", keys::RETRY),
            },
            _ if self.source.is_empty() => EmptyState {
                message: format!("No {noun} yet"),
                subtitle: "Records created in the registry will appear here".to_string(),
            },
            _ => EmptyState {
                message: format!("No {noun} match the current search and filters"),
                subtitle: "Clear filters to see everything".to_string(),
            },
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}

/// Coalesces fuzzy match indices into `(start, end)` character ranges.
fn highlight_ranges(text: &str, pattern: &str, matcher: &SkimMatcherV2) -> Vec<(usize, usize)> {
    use fuzzy_matcher::FuzzyMatcher;

    let Some((_score, indices)) = matcher.fuzzy_indices(text, pattern) else {
        return vec![];
    };

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for idx in indices {
        match ranges.last_mut() {
            Some((_, end)) if *end == idx => *end = idx + 1,
            _ => ranges.push((idx, idx + 1)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::filter::SortDirection;
    use crate::domain::Household;
    use chrono::TimeZone;
    use serde_json::json;

    fn state_with(count: usize) -> ListState<Household> {
        let mut state = ListState::new(ScreenSettings::default());
        state.source = (1..=count)
            .map(|i| {
                serde_json::from_value(json!({
                    "_id": format!("{i:02}"),
                    "apartmentNumber": format!("A-{i:03}"),
                    "building": if i % 2 == 0 { "A" } else { "B" },
                    "active": i % 3 != 0,
                }))
                .unwrap()
            })
            .collect();
        state.recompute();
        state
    }

    #[test]
    fn recompute_clamps_page() {
        let mut state = state_with(25);
        state.page = 10;
        state.recompute();
        assert_eq!(state.page, 3);
        assert_eq!(state.current_page().items.len(), 5);
    }

    #[test]
    fn viewmodel_footer_shows_item_range() {
        let mut state = state_with(57);
        state.page_size = 20;
        state.recompute();
        let vm = state.compute_viewmodel(100);
        assert_eq!(vm.footer.range, "(1-20 of 57)");
        assert_eq!(vm.footer.total_pages, 3);
        assert_eq!(vm.display_items.len(), 20);
        assert!(vm.bulk_bar.is_none());
    }

    #[test]
    fn viewmodel_marks_selection_and_stats() {
        let mut state = state_with(6);
        state.selection.toggle(&EntityId::from("01"));
        let vm = state.compute_viewmodel(100);
        assert!(vm.display_items[0].is_selected);
        assert_eq!(vm.bulk_bar.unwrap().selected, 1);
        assert_eq!(vm.header.stats.total, 6);
        assert_eq!(vm.header.stats.inactive, 2);
        assert_eq!(
            vm.header.stats.groups,
            vec![("A".to_string(), 3), ("B".to_string(), 3)]
        );
    }

    #[test]
    fn error_state_hints_the_retry_key() {
        let mut state = state_with(0);
        state.phase = ViewPhase::Error;
        let vm = state.compute_viewmodel(100);
        let empty = vm.empty_state.unwrap();
        assert_eq!(empty.subtitle, format!("Press {} to retry", keys::RETRY));

        state.selection.toggle(&EntityId::from("01"));
        let vm = state.compute_viewmodel(100);
        assert_eq!(vm.footer.keybindings, keys::SELECTION);
    }

    #[test]
    fn preferences_round_trip_through_state() {
        let mut state = state_with(3);
        state.set_clock(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        state.page_size = 50;
        state.sort = SortSpec::new("building", SortDirection::Desc);
        let prefs = state.preferences();

        let mut other: ListState<Household> = ListState::new(ScreenSettings::default());
        other.set_clock(state.now);
        other.apply_preferences(prefs);
        assert_eq!(other.page_size, 50);
        assert_eq!(other.sort, state.sort);
        assert!(other.filters.context.as_of.is_some());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let decoded = ListState::<Household>::decode_records(vec![
            json!({"_id": "1", "apartmentNumber": "A-1"}),
            json!("not an object"),
            json!({"_id": "2"}),
        ]);
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn highlight_ranges_coalesce() {
        let matcher = SkimMatcherV2::default().ignore_case();
        assert_eq!(highlight_ranges("A-101", "a-", &matcher), vec![(0, 2)]);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Nguyễn Văn An", 20), "Nguyễn Văn An");
        assert_eq!(truncate("Nguyễn Văn An", 8), "Nguyễ...");
    }
}
