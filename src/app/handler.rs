//! Event handling and state transition logic.
//!
//! This module implements the reducer for a list screen. It processes user
//! intents, clock ticks and worker responses, mutates [`ListState`] and returns
//! the [`Action`]s the runtime must execute.
//!
//! # Architecture
//!
//! 1. Events arrive from the runtime (user intents, ticks) or the worker thread
//! 2. [`handle_event`] pattern-matches the event type
//! 3. State mutations occur via `ListState` methods
//! 4. Actions are collected and returned for execution
//!
//! Invalid user input (an unparsable filter, a zero page size, a delete without
//! a matching confirmation) is logged and leaves the state untouched or
//! corrected. It never produces a notification.
//!
//! # Example
//!
//! ```rust
//! use aptdesk::app::{handle_event, Action, Event, ListState};
//! use aptdesk::domain::Household;
//! use chrono::Utc;
//!
//! let mut state: ListState<Household> = ListState::new(Default::default());
//! let (render, actions) = handle_event(
//!     &mut state,
//!     Event::Mount { now: Utc::now(), restored: Default::default() },
//! )?;
//! assert!(render);
//! assert!(matches!(actions[0], Action::PostToWorker(_)));
//! # Ok::<(), aptdesk::domain::AptdeskError>(())
//! ```

use chrono::{DateTime, Utc};

use super::bulk::{BulkAction, BulkReport, DeleteConfirmation};
use super::filter::{SortDirection, SortSpec};
use super::modes::{ViewMode, ViewPhase};
use super::notifications::{NotificationKind, SILENT_REFRESH_TTL_MS};
use super::pagination::{validate_page_size, DEFAULT_PAGE_SIZE};
use crate::api::ListQuery;
use crate::app::{Action, ListState};
use crate::domain::error::Result;
use crate::domain::{Entity, EntityId, ExportFile, ExportFormat};
use crate::storage::{ActivityEntry, Preferences, SavedFilter, SavedFilters, SearchHistory};
use crate::worker::{FetchReason, Operation, WorkerFailure, WorkerMessage, WorkerResponse};

/// Persisted client state handed to a screen when it mounts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restored {
    pub preferences: Preferences,
    pub search_history: SearchHistory,
    pub saved_filters: SavedFilters,
}

/// Events triggered by user intent, the clock or worker responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The screen became visible. Starts the initial fetch and the refresh timer.
    Mount {
        now: DateTime<Utc>,
        restored: Restored,
    },
    /// The screen was closed. In-flight responses will be discarded.
    Unmount,
    /// Clock reading; drives debounce, auto-refresh and notification expiry.
    Tick { now: DateTime<Utc> },

    /// Search text changed; committed after the debounce period.
    SearchInput(String),
    /// Commit the typed search immediately and remember it.
    CommitSearch,

    /// Set one filter from its textual form (`all` clears it).
    SetFilter { key: String, value: String },
    ClearFilters,
    SetSort(SortSpec),
    /// Sort by `field`, toggling direction when it is already the sort field.
    SortBy(String),
    SetPage(usize),
    SetPageSize(usize),
    SetViewMode(ViewMode),

    ToggleSelection(EntityId),
    /// Select every record in the filtered view, or deselect them if all are selected.
    SelectAll,
    ClearSelection,

    /// Apply an action to the current selection.
    RunBulk {
        action: BulkAction,
        confirmation: Option<DeleteConfirmation>,
    },
    /// Export the whole collection regardless of selection.
    ExportAll(ExportFormat),
    Restore(EntityId),

    /// Upload a spreadsheet for preview. Nothing is stored until [`Event::ConfirmImport`].
    ImportFile { filename: String, bytes: Vec<u8> },
    /// Store the previewed rows.
    ConfirmImport,
    /// Discard the previewed rows.
    CancelImport,

    /// User-requested refresh from the ready state.
    Refresh,
    /// Leave the error state by fetching again.
    Retry,

    SaveFilter(String),
    ApplySavedFilter(String),
    DeleteSavedFilter(String),

    DismissNotification(u64),

    /// Wraps a response from the background worker thread.
    Worker(WorkerResponse),
}

/// Processes an event, mutates screen state, and returns actions to execute.
///
/// # Parameters
///
/// * `state` - Mutable reference to the screen state
/// * `event` - Event to process
///
/// # Returns
///
/// `(render, actions)`: whether the screen needs redrawing, and the side
/// effects to execute in order.
///
/// # Errors
///
/// Reserved for internal failures; user and API errors are folded into state.
#[allow(clippy::too_many_lines)]
pub fn handle_event<E: Entity>(
    state: &mut ListState<E>,
    event: Event,
) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!(
        "handle_event",
        kind = %E::KIND,
        phase = state.phase.label(),
        event_type = event_name(&event)
    )
    .entered();

    match event {
        Event::Mount { now, restored } => Ok(mount(state, now, restored)),
        Event::Unmount => {
            tracing::debug!(in_flight = state.in_flight, "screen unmounted");
            state.generation += 1;
            state.phase = ViewPhase::Idle;
            state.in_flight = 0;
            state.refresh_timer.cancel();
            state.debounce_timer.cancel();
            state.notifications.clear();
            state.import_preview = None;
            Ok((false, vec![]))
        }
        Event::Tick { now } => Ok(tick(state, now)),

        Event::SearchInput(text) => {
            if state.search_input == text {
                return Ok((false, vec![]));
            }
            state.search_input = text;
            if state.settings.search_debounce_ms == 0 {
                commit_search(state, false);
            } else {
                state.debounce_timer.arm(state.now);
            }
            Ok((true, vec![]))
        }
        Event::CommitSearch => {
            let mut actions = vec![];
            commit_search(state, true);
            if let Some(history) = record_search(state) {
                actions.push(history);
            }
            Ok((true, actions))
        }

        Event::SetFilter { key, value } => {
            if let Err(e) = state.filters.set::<E>(&key, &value) {
                tracing::warn!(%key, %value, error = %e, "ignoring invalid filter");
                return Ok((false, vec![]));
            }
            Ok((true, filters_changed(state)))
        }
        Event::ClearFilters => {
            if state.filters.active_count() == 0 {
                return Ok((false, vec![]));
            }
            state.filters.clear();
            Ok((true, filters_changed(state)))
        }
        Event::SetSort(sort) => {
            state.sort = sort;
            state.recompute();
            Ok((true, vec![save_preferences(state)]))
        }
        Event::SortBy(field) => {
            let current = if state.sort.field.is_empty() {
                E::DEFAULT_SORT
            } else {
                E::resolve_sort_key(&state.sort.field)
            };
            let direction = if E::resolve_sort_key(&field) == current {
                state.sort.direction.toggled()
            } else {
                SortDirection::Asc
            };
            state.sort = SortSpec::new(field, direction);
            state.recompute();
            Ok((true, vec![save_preferences(state)]))
        }
        Event::SetPage(page) => {
            let before = state.page;
            state.page = page;
            state.recompute();
            Ok((state.page != before, vec![]))
        }
        Event::SetPageSize(size) => {
            state.page_size = validate_page_size(size).unwrap_or_else(|e| {
                tracing::warn!(size, error = %e, "invalid page size, using default");
                DEFAULT_PAGE_SIZE
            });
            state.page = 1;
            state.recompute();
            Ok((true, vec![save_preferences(state)]))
        }
        Event::SetViewMode(mode) => {
            if state.view_mode == mode {
                return Ok((false, vec![]));
            }
            state.view_mode = mode;
            Ok((true, vec![save_preferences(state)]))
        }

        Event::ToggleSelection(id) => {
            let selected = state.selection.toggle(&id);
            tracing::debug!(%id, selected, "selection toggled");
            Ok((true, vec![]))
        }
        Event::SelectAll => {
            let ids = state.view_ids();
            state.selection.select_all(ids.iter());
            tracing::debug!(selected = state.selection.len(), "select all toggled");
            Ok((true, vec![]))
        }
        Event::ClearSelection => {
            if state.selection.is_empty() {
                return Ok((false, vec![]));
            }
            state.selection.clear();
            Ok((true, vec![]))
        }

        Event::RunBulk {
            action,
            confirmation,
        } => Ok(run_bulk(state, action, confirmation)),
        Event::ExportAll(format) => {
            if state.phase != ViewPhase::Ready {
                tracing::debug!("export ignored while not ready");
                return Ok((false, vec![]));
            }
            state.phase = ViewPhase::Mutating;
            state.begin_request();
            let message = WorkerMessage::export_all(
                E::KIND,
                state.generation,
                format,
                state.now.date_naive(),
            );
            Ok((true, vec![Action::PostToWorker(message)]))
        }
        Event::Restore(id) => {
            if state.phase != ViewPhase::Ready {
                tracing::debug!(%id, "restore ignored while not ready");
                return Ok((false, vec![]));
            }
            state.phase = ViewPhase::Mutating;
            state.begin_request();
            let message = WorkerMessage::restore(E::KIND, state.generation, id);
            Ok((true, vec![Action::PostToWorker(message)]))
        }

        Event::ImportFile { filename, bytes } => {
            if state.phase != ViewPhase::Ready {
                tracing::debug!(%filename, "import ignored while not ready");
                return Ok((false, vec![]));
            }
            tracing::debug!(%filename, size = bytes.len(), "import upload started");
            state.phase = ViewPhase::Mutating;
            state.begin_request();
            let message =
                WorkerMessage::import_preview(E::KIND, state.generation, filename, bytes);
            Ok((true, vec![Action::PostToWorker(message)]))
        }
        Event::ConfirmImport => {
            if state.phase != ViewPhase::Ready {
                tracing::debug!("import confirmation ignored while not ready");
                return Ok((false, vec![]));
            }
            let Some(rows) = state.import_preview.clone().filter(|rows| !rows.is_empty()) else {
                tracing::warn!("no previewed rows to import");
                return Ok((false, vec![]));
            };
            state.phase = ViewPhase::Mutating;
            state.begin_request();
            let message = WorkerMessage::import_confirm(E::KIND, state.generation, rows);
            Ok((true, vec![Action::PostToWorker(message)]))
        }
        Event::CancelImport => Ok((state.import_preview.take().is_some(), vec![])),

        Event::Refresh => {
            if state.phase != ViewPhase::Ready {
                tracing::debug!("refresh ignored while not ready");
                return Ok((false, vec![]));
            }
            state.phase = ViewPhase::Refreshing;
            if state.refresh_timer.is_armed() {
                state.refresh_timer.arm(state.now);
            }
            Ok((true, vec![Action::PostToWorker(state.begin_fetch(FetchReason::Manual))]))
        }
        Event::Retry => {
            if state.phase != ViewPhase::Error {
                tracing::debug!("retry ignored outside error state");
                return Ok((false, vec![]));
            }
            state.phase = ViewPhase::Loading;
            state.last_error = None;
            Ok((true, vec![Action::PostToWorker(state.begin_fetch(FetchReason::Retry))]))
        }

        Event::SaveFilter(name) => {
            let name = name.trim();
            if name.is_empty() {
                tracing::warn!("saved filter needs a name");
                return Ok((false, vec![]));
            }
            state.saved_filters.upsert(SavedFilter {
                name: name.to_string(),
                search: state.search.clone(),
                filters: state.filters.clone(),
                sort: state.sort.clone(),
                saved_at: state.now,
            });
            state.notify(format!("saved filter \"{name}\""), NotificationKind::Success);
            Ok((true, vec![save_filters(state)]))
        }
        Event::ApplySavedFilter(name) => {
            let Some(saved) = state.saved_filters.get(&name).cloned() else {
                tracing::warn!(%name, "no saved filter with that name");
                return Ok((false, vec![]));
            };
            let context = state.filters.context;
            state.filters = saved.filters;
            state.filters.context = context;
            state.sort = saved.sort;
            state.search_input.clone_from(&saved.search);
            state.search = saved.search;
            state.debounce_timer.cancel();
            Ok((true, filters_changed(state)))
        }
        Event::DeleteSavedFilter(name) => {
            if !state.saved_filters.remove(&name) {
                return Ok((false, vec![]));
            }
            Ok((true, vec![save_filters(state)]))
        }

        Event::DismissNotification(id) => Ok((state.notifications.dismiss(id), vec![])),

        Event::Worker(response) => Ok(handle_worker_response(state, response)),
    }
}

const fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Mount { .. } => "mount",
        Event::Unmount => "unmount",
        Event::Tick { .. } => "tick",
        Event::SearchInput(_) => "search_input",
        Event::CommitSearch => "commit_search",
        Event::SetFilter { .. } => "set_filter",
        Event::ClearFilters => "clear_filters",
        Event::SetSort(_) => "set_sort",
        Event::SortBy(_) => "sort_by",
        Event::SetPage(_) => "set_page",
        Event::SetPageSize(_) => "set_page_size",
        Event::SetViewMode(_) => "set_view_mode",
        Event::ToggleSelection(_) => "toggle_selection",
        Event::SelectAll => "select_all",
        Event::ClearSelection => "clear_selection",
        Event::RunBulk { .. } => "run_bulk",
        Event::ExportAll(_) => "export_all",
        Event::Restore(_) => "restore",
        Event::ImportFile { .. } => "import_file",
        Event::ConfirmImport => "confirm_import",
        Event::CancelImport => "cancel_import",
        Event::Refresh => "refresh",
        Event::Retry => "retry",
        Event::SaveFilter(_) => "save_filter",
        Event::ApplySavedFilter(_) => "apply_saved_filter",
        Event::DeleteSavedFilter(_) => "delete_saved_filter",
        Event::DismissNotification(_) => "dismiss_notification",
        Event::Worker(_) => "worker_response",
    }
}

fn mount<E: Entity>(
    state: &mut ListState<E>,
    now: DateTime<Utc>,
    restored: Restored,
) -> (bool, Vec<Action>) {
    if state.phase != ViewPhase::Idle {
        tracing::debug!("already mounted");
        return (false, vec![]);
    }

    state.generation += 1;
    state.apply_preferences(restored.preferences);
    state.search_history = restored.search_history;
    state.saved_filters = restored.saved_filters;
    state.set_clock(now);
    state.recompute();
    state.phase = ViewPhase::Loading;
    if state.settings.refresh_interval_ms > 0 {
        state.refresh_timer.arm(now);
    }

    tracing::debug!(generation = state.generation, "screen mounted");
    (true, vec![Action::PostToWorker(state.begin_fetch(FetchReason::Initial))])
}

fn tick<E: Entity>(state: &mut ListState<E>, now: DateTime<Utc>) -> (bool, Vec<Action>) {
    if state.phase == ViewPhase::Idle {
        return (false, vec![]);
    }

    let mut render = state.set_clock(now);
    let mut actions = vec![];

    if state.notifications.expire(now) > 0 {
        render = true;
    }

    if state.debounce_timer.fire_if_due(now) {
        render |= commit_search(state, false);
    }

    if state.refresh_timer.fire_if_due(now) {
        state.refresh_timer.arm(now);
        if state.phase == ViewPhase::Ready && state.in_flight == 0 {
            state.phase = ViewPhase::Refreshing;
            actions.push(Action::PostToWorker(
                state.begin_fetch(FetchReason::AutoRefresh),
            ));
            render = true;
        } else {
            tracing::debug!(in_flight = state.in_flight, "auto-refresh skipped while busy");
        }
    }

    (render, actions)
}

/// Commits the typed search. Returns `true` if the view changed.
fn commit_search<E: Entity>(state: &mut ListState<E>, explicit: bool) -> bool {
    state.debounce_timer.cancel();
    let term = state.search_input.trim();
    if term == state.search {
        return false;
    }
    tracing::debug!(term, explicit, "search committed");
    state.search = term.to_string();
    state.page = 1;
    state.recompute();
    true
}

fn record_search<E: Entity>(state: &mut ListState<E>) -> Option<Action> {
    state
        .search_history
        .record(&state.search)
        .then(|| Action::SaveSearchHistory {
            kind: E::KIND,
            history: state.search_history.clone(),
        })
}

/// Re-derives after a filter change and refetches if the server-side query moved.
fn filters_changed<E: Entity>(state: &mut ListState<E>) -> Vec<Action> {
    state.page = 1;
    state.recompute();
    let mut actions = vec![save_preferences(state)];

    let query = state.server_query();
    if state.last_query.as_ref() != Some(&query) {
        match state.phase {
            ViewPhase::Ready => {
                state.phase = ViewPhase::Refreshing;
                actions.push(Action::PostToWorker(
                    state.begin_fetch(FetchReason::QueryChanged),
                ));
            }
            ViewPhase::Loading | ViewPhase::Refreshing => {
                actions.push(Action::PostToWorker(
                    state.begin_fetch(FetchReason::QueryChanged),
                ));
            }
            _ => {}
        }
    }
    actions
}

fn save_preferences<E: Entity>(state: &ListState<E>) -> Action {
    Action::SavePreferences {
        kind: E::KIND,
        preferences: state.preferences(),
    }
}

fn save_filters<E: Entity>(state: &ListState<E>) -> Action {
    Action::SaveFilters {
        kind: E::KIND,
        filters: state.saved_filters.clone(),
    }
}

fn run_bulk<E: Entity>(
    state: &mut ListState<E>,
    action: BulkAction,
    confirmation: Option<DeleteConfirmation>,
) -> (bool, Vec<Action>) {
    if state.phase != ViewPhase::Ready {
        tracing::debug!(%action, "bulk action ignored while not ready");
        return (false, vec![]);
    }

    let ids = state.selection.sorted_ids();
    if ids.is_empty() {
        tracing::warn!(%action, "bulk action with empty selection");
        return (false, vec![]);
    }
    if action == BulkAction::Delete
        && confirmation.map(DeleteConfirmation::count) != Some(ids.len())
    {
        tracing::warn!(selected = ids.len(), "delete requires confirmation for every selected record");
        return (false, vec![]);
    }

    tracing::debug!(%action, count = ids.len(), "bulk action started");
    state.phase = ViewPhase::Mutating;
    state.begin_request();
    let message = WorkerMessage::run_bulk(
        E::KIND,
        state.generation,
        action,
        ids,
        confirmation,
        state.now.date_naive(),
    );
    (true, vec![Action::PostToWorker(message)])
}

fn handle_worker_response<E: Entity>(
    state: &mut ListState<E>,
    response: WorkerResponse,
) -> (bool, Vec<Action>) {
    if response.kind() != E::KIND || response.generation() != state.generation {
        tracing::debug!(
            response_generation = response.generation(),
            generation = state.generation,
            "discarding stale worker response"
        );
        return (false, vec![]);
    }
    state.finish_request();

    match response {
        WorkerResponse::ListLoaded {
            request_id,
            reason,
            records,
            ..
        } => {
            if request_id < state.latest_fetch {
                tracing::debug!(request_id, latest = state.latest_fetch, "superseded fetch");
                return (false, vec![]);
            }
            list_loaded(state, reason, records);
            (true, vec![])
        }
        WorkerResponse::BulkCompleted { report, .. } => bulk_completed(state, report),
        WorkerResponse::ExportReady { file, .. } => export_ready(state, file),
        WorkerResponse::Restored { id, .. } => {
            let summary = format!("restored {id}");
            state.notify(summary.clone(), NotificationKind::Success);
            let entry = ActivityEntry {
                action: "restore".to_string(),
                summary,
                ids: vec![id],
                at: state.now,
            };
            (
                true,
                vec![
                    Action::RecordActivity {
                        kind: E::KIND,
                        entry,
                    },
                    Action::PostToWorker(state.begin_fetch(FetchReason::AfterMutation)),
                ],
            )
        }
        WorkerResponse::ImportPreviewed { rows, .. } => {
            state.phase = ViewPhase::Ready;
            state.notify(format!("read {} rows from file", rows.len()), NotificationKind::Info);
            state.import_preview = Some(rows);
            (true, vec![])
        }
        WorkerResponse::Imported { count, .. } => imported(state, count),
        WorkerResponse::Failed {
            operation, failure, ..
        } => failed(state, &operation, failure),
    }
}

fn imported<E: Entity>(state: &mut ListState<E>, count: usize) -> (bool, Vec<Action>) {
    state.import_preview = None;
    let summary = format!("imported {count}");
    state.notify(summary.clone(), NotificationKind::Success);
    let entry = ActivityEntry {
        action: "import".to_string(),
        summary,
        ids: vec![],
        at: state.now,
    };
    (
        true,
        vec![
            Action::RecordActivity {
                kind: E::KIND,
                entry,
            },
            Action::PostToWorker(state.begin_fetch(FetchReason::AfterMutation)),
        ],
    )
}

fn list_loaded<E: Entity>(
    state: &mut ListState<E>,
    reason: FetchReason,
    records: Vec<serde_json::Value>,
) {
    let records = ListState::<E>::decode_records(records);
    let changed = records != state.source;
    state.source = records;

    // Only an unfiltered fetch sees the whole collection and can prove an id is gone.
    if state.last_query.as_ref().map_or(true, ListQuery::is_empty) {
        let known: Vec<EntityId> = state.source.iter().map(|e| e.id().clone()).collect();
        state.selection.retain_known(known.iter());
    }
    state.recompute();

    state.phase = ViewPhase::Ready;
    state.last_error = None;
    tracing::debug!(count = state.source.len(), ?reason, changed, "collection loaded");

    if reason == FetchReason::AutoRefresh && changed {
        state.notifications.push(
            "data updated",
            NotificationKind::Info,
            state.now,
            SILENT_REFRESH_TTL_MS,
        );
    }
}

fn bulk_completed<E: Entity>(state: &mut ListState<E>, report: BulkReport) -> (bool, Vec<Action>) {
    state.selection.remove_all(report.succeeded.iter());
    let (summary, kind) = report.summary();
    state.notify(summary.clone(), kind);

    let mut actions = vec![];
    if let Some(file) = report.export {
        actions.push(Action::Download(file));
    }

    if report.action.is_mutation() {
        actions.push(Action::RecordActivity {
            kind: E::KIND,
            entry: ActivityEntry {
                action: report.action.to_string(),
                summary,
                ids: report.succeeded.clone(),
                at: state.now,
            },
        });
    }

    if report.action.is_mutation() && !report.succeeded.is_empty() {
        actions.push(Action::PostToWorker(
            state.begin_fetch(FetchReason::AfterMutation),
        ));
    } else {
        state.phase = ViewPhase::Ready;
    }
    (true, actions)
}

fn export_ready<E: Entity>(state: &mut ListState<E>, file: ExportFile) -> (bool, Vec<Action>) {
    state.phase = ViewPhase::Ready;
    state.notify(format!("exported {}", file.filename), NotificationKind::Success);
    (true, vec![Action::Download(file)])
}

fn failed<E: Entity>(
    state: &mut ListState<E>,
    operation: &Operation,
    failure: WorkerFailure,
) -> (bool, Vec<Action>) {
    if let Operation::Fetch { request_id, .. } = operation {
        if *request_id < state.latest_fetch {
            tracing::debug!(request_id, "superseded fetch failed");
            return (false, vec![]);
        }
    }

    if let Some(status) = failure.auth_status {
        tracing::warn!(status, "session rejected by api");
        state.phase = ViewPhase::Error;
        state.last_error = Some(failure.message);
        state.refresh_timer.cancel();
        return (true, vec![Action::SessionExpired { status }]);
    }

    if failure.validation {
        tracing::warn!(?operation, reason = %failure.message, "request rejected locally");
        state.phase = ViewPhase::Ready;
        return (true, vec![]);
    }

    tracing::error!(?operation, reason = %failure.message, "request failed");
    state.phase = ViewPhase::Error;
    state.notify(failure.message.clone(), NotificationKind::Error);
    state.last_error = Some(failure.message);
    (true, vec![])
}
