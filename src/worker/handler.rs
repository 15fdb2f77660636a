//! Worker implementation for API operations.
//!
//! [`ApiWorker`] executes [`WorkerMessage`]s against an [`ApiClient`] and turns
//! each into exactly one [`WorkerResponse`]. [`WorkerHandle`] runs a worker on
//! its own thread behind a pair of channels so the reducer never blocks on the
//! network.

use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::api::{ApiClient, ListQuery};
use crate::app::bulk::{self, BulkAction, DeleteConfirmation};
use crate::domain::error::{AptdeskError, Result};
use crate::domain::{EntityId, EntityKind, ExportFile, ExportFormat};
use crate::worker::messages::{FetchReason, Operation, WorkerFailure};
use crate::worker::{WorkerMessage, WorkerResponse};

/// Executes worker messages against an API client.
pub struct ApiWorker<C: ApiClient> {
    client: C,
}

impl<C: ApiClient> ApiWorker<C> {
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Borrow the underlying client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Helper for turning an API result into a response with consistent logging.
    fn handle_api_result<T, F>(
        kind: EntityKind,
        generation: u64,
        operation: Operation,
        result: Result<T>,
        on_success: F,
    ) -> WorkerResponse
    where
        F: FnOnce(T) -> WorkerResponse,
    {
        match result {
            Ok(value) => {
                tracing::debug!(?operation, "api operation successful");
                on_success(value)
            }
            Err(e) => {
                if e.is_auth() {
                    tracing::warn!(?operation, error = %e, "api rejected session");
                } else {
                    tracing::debug!(?operation, error = %e, "api operation failed");
                }
                WorkerResponse::Failed {
                    kind,
                    generation,
                    operation,
                    failure: WorkerFailure::from(&e),
                }
            }
        }
    }

    fn handle_fetch(
        &self,
        kind: EntityKind,
        generation: u64,
        request_id: u64,
        reason: FetchReason,
        query: &ListQuery,
    ) -> WorkerResponse {
        Self::handle_api_result(
            kind,
            generation,
            Operation::Fetch { request_id, reason },
            self.client.list(kind, query),
            |records| {
                tracing::debug!(count = records.len(), "collection fetched");
                WorkerResponse::ListLoaded {
                    kind,
                    generation,
                    request_id,
                    reason,
                    records,
                }
            },
        )
    }

    fn handle_bulk(
        &self,
        kind: EntityKind,
        generation: u64,
        action: BulkAction,
        ids: &[EntityId],
        confirmation: Option<DeleteConfirmation>,
        today: NaiveDate,
    ) -> WorkerResponse {
        Self::handle_api_result(
            kind,
            generation,
            Operation::Bulk(action),
            bulk::execute(&self.client, kind, action, ids, confirmation, today),
            |report| WorkerResponse::BulkCompleted {
                kind,
                generation,
                report,
            },
        )
    }

    fn handle_export_all(
        &self,
        kind: EntityKind,
        generation: u64,
        format: ExportFormat,
        today: NaiveDate,
    ) -> WorkerResponse {
        Self::handle_api_result(
            kind,
            generation,
            Operation::Export(format),
            self.client.export(kind, format, None),
            |bytes| WorkerResponse::ExportReady {
                kind,
                generation,
                file: ExportFile {
                    filename: ExportFile::collection_name(kind, format, today),
                    bytes,
                },
            },
        )
    }

    fn handle_restore(&self, kind: EntityKind, generation: u64, id: EntityId) -> WorkerResponse {
        let result = self.client.restore(kind, &id);
        Self::handle_api_result(
            kind,
            generation,
            Operation::Restore(id.clone()),
            result,
            |()| WorkerResponse::Restored {
                kind,
                generation,
                id,
            },
        )
    }

    fn handle_import_preview(
        &self,
        kind: EntityKind,
        generation: u64,
        filename: &str,
        bytes: &[u8],
    ) -> WorkerResponse {
        Self::handle_api_result(
            kind,
            generation,
            Operation::ImportPreview,
            self.client.import_preview(kind, filename, bytes),
            |rows| {
                tracing::debug!(rows = rows.len(), %filename, "import previewed");
                WorkerResponse::ImportPreviewed {
                    kind,
                    generation,
                    rows,
                }
            },
        )
    }

    fn handle_import_confirm(
        &self,
        kind: EntityKind,
        generation: u64,
        rows: &[serde_json::Value],
    ) -> WorkerResponse {
        Self::handle_api_result(
            kind,
            generation,
            Operation::ImportConfirm,
            self.client.import_confirm(kind, rows),
            |count| WorkerResponse::Imported {
                kind,
                generation,
                count,
            },
        )
    }

    /// Attaches the parent trace context from a message to the current thread.
    ///
    /// Returns a context guard that must be held for the duration of the operation.
    fn attach_parent_trace_context(message: &WorkerMessage) -> Option<opentelemetry::ContextGuard> {
        use opentelemetry::trace::{
            SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
        };

        let trace_context = message.trace_context()?;
        let trace_id = TraceId::from_hex(&trace_context.trace_id).ok()?;
        let span_id = SpanId::from_hex(&trace_context.parent_span_id).ok()?;

        let span_context = SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );

        Some(
            opentelemetry::Context::current()
                .with_remote_span_context(span_context)
                .attach(),
        )
    }

    /// Processes one message and returns its response.
    pub fn handle_message(&self, message: WorkerMessage) -> WorkerResponse {
        let _context_guard = Self::attach_parent_trace_context(&message);
        let _span = tracing::debug_span!("worker_handle_message", message_type = ?message).entered();

        match message {
            WorkerMessage::FetchList {
                kind,
                generation,
                request_id,
                reason,
                query,
                ..
            } => self.handle_fetch(kind, generation, request_id, reason, &query),

            WorkerMessage::RunBulk {
                kind,
                generation,
                action,
                ids,
                confirmation,
                today,
                ..
            } => self.handle_bulk(kind, generation, action, &ids, confirmation, today),

            WorkerMessage::ExportAll {
                kind,
                generation,
                format,
                today,
                ..
            } => self.handle_export_all(kind, generation, format, today),

            WorkerMessage::Restore {
                kind,
                generation,
                id,
                ..
            } => self.handle_restore(kind, generation, id),

            WorkerMessage::ImportPreview {
                kind,
                generation,
                filename,
                bytes,
                ..
            } => self.handle_import_preview(kind, generation, &filename, &bytes),

            WorkerMessage::ImportConfirm {
                kind,
                generation,
                rows,
                ..
            } => self.handle_import_confirm(kind, generation, &rows),
        }
    }
}

/// Channel pair connecting a screen to a worker thread.
///
/// The handle also shares the screen's live generation with the thread.
/// Queued messages from an older generation are dropped without reaching the
/// API. Dropping the handle closes the request channel and joins the thread.
pub struct WorkerHandle {
    requests: Option<Sender<WorkerMessage>>,
    responses: Receiver<WorkerResponse>,
    live_generation: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawns a worker thread that owns `client`.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Worker`] if the thread cannot be spawned.
    pub fn spawn<C: ApiClient + 'static>(client: C) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerMessage>();
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>();
        let live_generation = Arc::new(AtomicU64::new(0));
        let live = Arc::clone(&live_generation);

        let thread = std::thread::Builder::new()
            .name("aptdesk-worker".to_string())
            .spawn(move || {
                let worker = ApiWorker::new(client);
                tracing::debug!("worker thread started");
                for message in request_rx {
                    let live = live.load(Ordering::Acquire);
                    if message.generation() < live {
                        tracing::debug!(
                            generation = message.generation(),
                            live,
                            "dropping cancelled request"
                        );
                        continue;
                    }
                    let response = worker.handle_message(message);
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                tracing::debug!("worker thread stopping");
            })
            .map_err(|e| AptdeskError::Worker(format!("failed to spawn worker: {e}")))?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            live_generation,
            thread: Some(thread),
        })
    }

    /// Cancels every queued message older than `generation`.
    ///
    /// A request the worker has already started still runs to completion.
    pub fn cancel_before(&self, generation: u64) {
        self.live_generation.fetch_max(generation, Ordering::AcqRel);
    }

    /// Queues a message for the worker.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Worker`] if the worker thread has exited.
    pub fn post(&self, message: WorkerMessage) -> Result<()> {
        self.requests
            .as_ref()
            .ok_or_else(|| AptdeskError::Worker("worker already shut down".to_string()))?
            .send(message)
            .map_err(|_| AptdeskError::Worker("worker thread has exited".to_string()))
    }

    /// Returns a finished response without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Worker`] if the worker thread has exited.
    pub fn try_recv(&self) -> Result<Option<WorkerResponse>> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(AptdeskError::Worker("worker thread has exited".to_string()))
            }
        }
    }

    /// Waits up to `timeout` for the next response.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Worker`] if the worker thread has exited.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerResponse>> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AptdeskError::Worker("worker thread has exited".to_string()))
            }
        }
    }

    /// Closes the request channel and waits for the thread to finish.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryApi, ScriptedFailure};
    use serde_json::json;

    fn api() -> InMemoryApi {
        InMemoryApi::new().with_records(
            EntityKind::Household,
            vec![json!({"_id": "1"}), json!({"_id": "2"})],
        )
    }

    #[test]
    fn fetch_echoes_generation_and_request() {
        let worker = ApiWorker::new(api());
        let response = worker.handle_message(WorkerMessage::fetch_list(
            EntityKind::Household,
            4,
            9,
            FetchReason::Initial,
            ListQuery::new(),
        ));
        match response {
            WorkerResponse::ListLoaded {
                generation,
                request_id,
                records,
                ..
            } => {
                assert_eq!(generation, 4);
                assert_eq!(request_id, 9);
                assert_eq!(records.len(), 2);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn auth_failures_keep_status() {
        let client = api();
        client.set_list_failure(Some(ScriptedFailure::Auth(401)));
        let worker = ApiWorker::new(client);
        let response = worker.handle_message(WorkerMessage::fetch_list(
            EntityKind::Household,
            1,
            1,
            FetchReason::Initial,
            ListQuery::new(),
        ));
        match response {
            WorkerResponse::Failed { failure, .. } => assert_eq!(failure.auth_status, Some(401)),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn cancelled_generations_never_reach_the_api() {
        let handle = WorkerHandle::spawn(api()).unwrap();
        handle.cancel_before(5);
        for generation in [4, 5] {
            handle
                .post(WorkerMessage::fetch_list(
                    EntityKind::Household,
                    generation,
                    generation,
                    FetchReason::Initial,
                    ListQuery::new(),
                ))
                .unwrap();
        }

        let response = handle.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(response.generation(), 5);
        assert!(handle
            .recv_timeout(Duration::from_millis(100))
            .unwrap()
            .is_none());
    }

    #[test]
    fn threaded_handle_round_trips_messages() {
        let handle = WorkerHandle::spawn(api()).unwrap();
        handle
            .post(WorkerMessage::export_all(
                EntityKind::Household,
                2,
                ExportFormat::Csv,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ))
            .unwrap();
        let response = handle
            .recv_timeout(Duration::from_secs(5))
            .unwrap()
            .unwrap();
        match response {
            WorkerResponse::ExportReady { file, .. } => {
                assert_eq!(file.filename, "households_2024-03-01.csv");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
