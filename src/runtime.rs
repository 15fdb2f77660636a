//! Screen runtime: executes the reducer's actions.
//!
//! [`ScreenRuntime`] owns one [`ListState`], the worker thread serving it and
//! the client-side store. It feeds events to [`handle_event`], performs the
//! returned [`Action`]s and pumps worker responses back in as events.
//!
//! Persistence is best effort: a failed write is logged and the screen keeps
//! working from memory.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app::{handle_event, Action, Event, ListState, Restored, ScreenSettings};
use crate::domain::{Entity, EntityKind, Result};
use crate::infrastructure::write_download;
use crate::storage::{ActivityLog, KeyValueStore, Preferences, SavedFilters, SearchHistory};
use crate::worker::WorkerHandle;

/// One mounted list screen and its collaborators.
pub struct ScreenRuntime<E: Entity> {
    state: ListState<E>,
    worker: WorkerHandle,
    store: Box<dyn KeyValueStore>,
    download_dir: PathBuf,
    downloads: Vec<PathBuf>,
    session_expired: Option<u16>,
}

impl<E: Entity> ScreenRuntime<E> {
    pub fn new(
        settings: ScreenSettings,
        worker: WorkerHandle,
        store: Box<dyn KeyValueStore>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            state: ListState::new(settings),
            worker,
            store,
            download_dir,
            downloads: Vec::new(),
            session_expired: None,
        }
    }

    pub const fn state(&self) -> &ListState<E> {
        &self.state
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Files written by `Download` actions, oldest first.
    pub fn downloads(&self) -> &[PathBuf] {
        &self.downloads
    }

    /// HTTP status of the last rejected session, if any.
    pub const fn session_expired(&self) -> Option<u16> {
        self.session_expired
    }

    /// Reads everything the screen persisted in earlier sessions.
    ///
    /// Unreadable entries fall back to defaults with a warning.
    pub fn restore(&self) -> Restored {
        let kind = E::KIND;
        let store = self.store.as_ref();
        Restored {
            preferences: Preferences::load(store, kind).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load preferences");
                Preferences::default()
            }),
            search_history: SearchHistory::load(store, kind).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load search history");
                SearchHistory::default()
            }),
            saved_filters: SavedFilters::load(store, kind).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load saved filters");
                SavedFilters::default()
            }),
        }
    }

    /// Mounts the screen with restored client state.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial fetch cannot be posted to the worker.
    pub fn mount(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let restored = self.restore();
        self.dispatch(Event::Mount { now, restored })
    }

    /// Handles one event and executes the resulting actions.
    ///
    /// Returns whether the screen needs a redraw.
    ///
    /// # Errors
    ///
    /// Returns an error if the reducer fails or the worker thread has exited.
    pub fn dispatch(&mut self, event: Event) -> Result<bool> {
        let (render, actions) = handle_event(&mut self.state, event)?;
        self.worker.cancel_before(self.state.generation);
        for action in actions {
            self.execute(action)?;
        }
        Ok(render)
    }

    fn execute(&mut self, action: Action) -> Result<()> {
        let _span = tracing::debug_span!("execute_action", action = action_name(&action)).entered();

        match action {
            Action::PostToWorker(message) => self.worker.post(message)?,
            Action::SavePreferences { kind, preferences } => {
                log_store_error("preferences", preferences.save(self.store.as_mut(), kind));
            }
            Action::SaveSearchHistory { kind, history } => {
                log_store_error("search history", history.save(self.store.as_mut(), kind));
            }
            Action::SaveFilters { kind, filters } => {
                log_store_error("saved filters", filters.save(self.store.as_mut(), kind));
            }
            Action::RecordActivity { kind, entry } => {
                let result = self.append_activity(kind, entry);
                log_store_error("activity log", result);
            }
            Action::Download(file) => match write_download(&self.download_dir, &file) {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "export written");
                    self.downloads.push(path);
                }
                Err(e) => tracing::error!(filename = %file.filename, error = %e, "failed to write export"),
            },
            Action::SessionExpired { status } => {
                tracing::warn!(status, "session expired");
                self.session_expired = Some(status);
            }
        }
        Ok(())
    }

    fn append_activity(
        &mut self,
        kind: EntityKind,
        entry: crate::storage::ActivityEntry,
    ) -> Result<()> {
        let mut log = ActivityLog::load(self.store.as_ref(), kind)?;
        log.push(entry);
        log.save(self.store.as_mut(), kind)
    }

    /// Feeds every response that is already available back into the reducer.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread has exited.
    pub fn pump(&mut self) -> Result<bool> {
        let mut render = false;
        while let Some(response) = self.worker.try_recv()? {
            render |= self.dispatch(Event::Worker(response))?;
        }
        Ok(render)
    }

    /// Waits until no request is outstanding or `timeout` elapses.
    ///
    /// Returns `true` if the screen settled.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread has exited.
    pub fn settle(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        while self.state.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(in_flight = self.state.in_flight, "timed out waiting for worker");
                return Ok(false);
            }
            if let Some(response) = self.worker.recv_timeout(remaining)? {
                self.dispatch(Event::Worker(response))?;
            }
        }
        Ok(true)
    }

    /// Advances the screen clock.
    ///
    /// # Errors
    ///
    /// Returns an error if a triggered refresh cannot be posted.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<bool> {
        self.dispatch(Event::Tick { now })
    }

    /// Unmounts the screen. Queued requests are dropped before they reach the
    /// API and responses still in flight are discarded.
    ///
    /// # Errors
    ///
    /// Never fails today; returns `Result` for symmetry with [`Self::dispatch`].
    pub fn unmount(&mut self) -> Result<bool> {
        self.dispatch(Event::Unmount)
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

fn log_store_error(what: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to persist {what}");
    }
}

const fn action_name(action: &Action) -> &'static str {
    match action {
        Action::PostToWorker(_) => "post_to_worker",
        Action::SavePreferences { .. } => "save_preferences",
        Action::SaveSearchHistory { .. } => "save_search_history",
        Action::SaveFilters { .. } => "save_filters",
        Action::RecordActivity { .. } => "record_activity",
        Action::Download(_) => "download",
        Action::SessionExpired { .. } => "session_expired",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryApi, ScriptedFailure};
    use crate::app::{BulkAction, DeleteConfirmation, ViewPhase};
    use crate::domain::{EntityId, ExportFormat, Household};
    use crate::storage::MemoryStore;
    use serde_json::json;

    const WAIT: Duration = Duration::from_secs(5);

    fn api() -> InMemoryApi {
        InMemoryApi::new().with_records(
            EntityKind::Household,
            vec![
                json!({"_id": "1", "apartmentNumber": "A-101", "building": "A", "active": true}),
                json!({"_id": "2", "apartmentNumber": "A-102", "building": "A", "active": true}),
                json!({"_id": "3", "apartmentNumber": "B-201", "building": "B", "active": false}),
            ],
        )
    }

    fn runtime(api: InMemoryApi, dir: &Path) -> ScreenRuntime<Household> {
        ScreenRuntime::new(
            ScreenSettings::default(),
            WorkerHandle::spawn(api).unwrap(),
            Box::new(MemoryStore::new()),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn mount_settles_into_ready() {
        let dir = tempfile::tempdir().unwrap();
        let mut rt = runtime(api(), dir.path());
        rt.mount(Utc::now()).unwrap();
        assert!(rt.settle(WAIT).unwrap());
        assert_eq!(rt.state().phase, ViewPhase::Ready);
        assert_eq!(rt.state().source.len(), 3);
    }

    #[test]
    fn page_size_change_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut rt = runtime(api(), dir.path());
        rt.mount(Utc::now()).unwrap();
        rt.settle(WAIT).unwrap();

        rt.dispatch(Event::SetPageSize(50)).unwrap();
        let prefs = Preferences::load(rt.store(), EntityKind::Household).unwrap();
        assert_eq!(prefs.items_per_page, 50);
    }

    #[test]
    fn delete_records_activity_and_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let mut rt = runtime(api(), dir.path());
        rt.mount(Utc::now()).unwrap();
        rt.settle(WAIT).unwrap();

        rt.dispatch(Event::ToggleSelection(EntityId::new("3"))).unwrap();
        let ids = rt.state().selection.sorted_ids();
        rt.dispatch(Event::RunBulk {
            action: BulkAction::Delete,
            confirmation: Some(DeleteConfirmation::for_ids(&ids)),
        })
        .unwrap();
        assert!(rt.settle(WAIT).unwrap());

        assert_eq!(rt.state().phase, ViewPhase::Ready);
        assert_eq!(rt.state().source.len(), 2);
        assert!(rt.state().selection.is_empty());
        let log = ActivityLog::load(rt.store(), EntityKind::Household).unwrap();
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn import_records_activity_and_refetches() {
        let dir = tempfile::tempdir().unwrap();
        let mut rt = runtime(api(), dir.path());
        rt.mount(Utc::now()).unwrap();
        rt.settle(WAIT).unwrap();

        rt.dispatch(Event::ImportFile {
            filename: "new.csv".to_string(),
            bytes: b"apartmentNumber,building\nC-301,C\nC-302,C\n".to_vec(),
        })
        .unwrap();
        rt.settle(WAIT).unwrap();
        assert_eq!(rt.state().import_preview.as_ref().map(Vec::len), Some(2));

        rt.dispatch(Event::ConfirmImport).unwrap();
        assert!(rt.settle(WAIT).unwrap());

        assert_eq!(rt.state().phase, ViewPhase::Ready);
        assert_eq!(rt.state().source.len(), 5);
        assert!(rt.state().import_preview.is_none());
        let log = ActivityLog::load(rt.store(), EntityKind::Household).unwrap();
        assert_eq!(log.entries()[0].action, "import");
    }

    #[test]
    fn export_lands_in_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut rt = runtime(api(), dir.path());
        rt.mount(Utc::now()).unwrap();
        rt.settle(WAIT).unwrap();

        rt.dispatch(Event::ExportAll(ExportFormat::Csv)).unwrap();
        rt.settle(WAIT).unwrap();

        assert_eq!(rt.downloads().len(), 1);
        assert!(rt.downloads()[0].starts_with(dir.path()));
        assert!(rt.downloads()[0].exists());
    }

    #[test]
    fn rejected_token_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let api = api();
        api.set_list_failure(Some(ScriptedFailure::Auth(401)));
        let mut rt = runtime(api, dir.path());
        rt.mount(Utc::now()).unwrap();
        rt.settle(WAIT).unwrap();

        assert_eq!(rt.session_expired(), Some(401));
        assert_eq!(rt.state().phase, ViewPhase::Error);
    }
}
