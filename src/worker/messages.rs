//! Worker thread message types for cross-thread communication.
//!
//! This module defines the request and response protocol between a screen's
//! reducer and the background worker that talks to the API. Every request
//! carries the screen `generation` it was issued under; the reducer discards
//! responses from an older generation, which is how unmount cancels in-flight
//! work. Requests also carry a tracing context so worker spans join the
//! caller's trace.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ListQuery;
use crate::app::bulk::{BulkAction, BulkReport, DeleteConfirmation};
use crate::domain::{AptdeskError, EntityId, EntityKind, ExportFile, ExportFormat};

/// Distributed tracing context for cross-thread span propagation.
///
/// Captures the current trace and span IDs from OpenTelemetry to maintain
/// trace continuity when passing messages to the worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// OpenTelemetry trace ID as a hex string.
    pub trace_id: String,

    /// Parent span ID for linking spans across threads.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Creates a trace context from the current tracing span.
    ///
    /// Returns `None` when no OpenTelemetry layer is installed or the current
    /// span context is invalid.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let otel_context = tracing::Span::current().context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if !span_context.is_valid() {
            return None;
        }

        Some(Self {
            trace_id: format!("{:032x}", span_context.trace_id()),
            parent_span_id: format!("{:016x}", span_context.span_id()),
        })
    }
}

/// Why a list fetch was issued. Decides the phase it runs under and whether a
/// changed result is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchReason {
    /// First load after mount.
    Initial,
    /// Explicit retry from the error state.
    Retry,
    /// User-requested refresh.
    Manual,
    /// Periodic silent refresh; announces changed data.
    AutoRefresh,
    /// Server-side filter parameters changed.
    QueryChanged,
    /// Follow-up after a bulk mutation or restore.
    AfterMutation,
}

impl FetchReason {
    /// Whether the cached view stays interactive while this fetch runs.
    #[must_use]
    pub const fn is_silent(self) -> bool {
        !matches!(self, Self::Initial | Self::Retry)
    }
}

/// Macro to generate builder methods for `WorkerMessage` variants.
///
/// Generates constructors that attach the current trace context to each
/// message variant.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("Create a ", stringify!($variant), " message with current trace context")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    fetch_list(FetchList {
        kind: EntityKind,
        generation: u64,
        request_id: u64,
        reason: FetchReason,
        query: ListQuery,
    }),
    run_bulk(RunBulk {
        kind: EntityKind,
        generation: u64,
        action: BulkAction,
        ids: Vec<EntityId>,
        confirmation: Option<DeleteConfirmation>,
        today: NaiveDate,
    }),
    export_all(ExportAll {
        kind: EntityKind,
        generation: u64,
        format: ExportFormat,
        today: NaiveDate,
    }),
    restore(Restore {
        kind: EntityKind,
        generation: u64,
        id: EntityId,
    }),
    import_preview(ImportPreview {
        kind: EntityKind,
        generation: u64,
        filename: String,
        bytes: Vec<u8>,
    }),
    import_confirm(ImportConfirm {
        kind: EntityKind,
        generation: u64,
        rows: Vec<Value>,
    }),
}

/// Requests sent from a screen to the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Fetch the collection for `kind`.
    FetchList {
        kind: EntityKind,
        generation: u64,
        /// Monotonic per screen; older fetches are superseded by newer ones.
        request_id: u64,
        reason: FetchReason,
        query: ListQuery,
        trace_context: Option<TraceContext>,
    },

    /// Apply a bulk action to the given ids.
    RunBulk {
        kind: EntityKind,
        generation: u64,
        action: BulkAction,
        ids: Vec<EntityId>,
        confirmation: Option<DeleteConfirmation>,
        today: NaiveDate,
        trace_context: Option<TraceContext>,
    },

    /// Export the whole collection.
    ExportAll {
        kind: EntityKind,
        generation: u64,
        format: ExportFormat,
        today: NaiveDate,
        trace_context: Option<TraceContext>,
    },

    /// Undo a soft delete.
    Restore {
        kind: EntityKind,
        generation: u64,
        id: EntityId,
        trace_context: Option<TraceContext>,
    },

    /// Upload a spreadsheet and get back the rows the server parsed from it.
    ImportPreview {
        kind: EntityKind,
        generation: u64,
        filename: String,
        bytes: Vec<u8>,
        trace_context: Option<TraceContext>,
    },

    /// Store previously previewed rows.
    ImportConfirm {
        kind: EntityKind,
        generation: u64,
        rows: Vec<Value>,
        trace_context: Option<TraceContext>,
    },
}

impl WorkerMessage {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::FetchList { generation, .. }
            | Self::RunBulk { generation, .. }
            | Self::ExportAll { generation, .. }
            | Self::Restore { generation, .. }
            | Self::ImportPreview { generation, .. }
            | Self::ImportConfirm { generation, .. } => *generation,
        }
    }

    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::FetchList { trace_context, .. }
            | Self::RunBulk { trace_context, .. }
            | Self::ExportAll { trace_context, .. }
            | Self::Restore { trace_context, .. }
            | Self::ImportPreview { trace_context, .. }
            | Self::ImportConfirm { trace_context, .. } => trace_context.as_ref(),
        }
    }
}

/// Which request a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Fetch { request_id: u64, reason: FetchReason },
    Bulk(BulkAction),
    Export(ExportFormat),
    Restore(EntityId),
    ImportPreview,
    ImportConfirm,
}

/// Transport-friendly summary of an [`AptdeskError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub message: String,
    /// HTTP status for auth failures.
    pub auth_status: Option<u16>,
    pub validation: bool,
}

impl From<&AptdeskError> for WorkerFailure {
    fn from(err: &AptdeskError) -> Self {
        Self {
            message: err.reason(),
            auth_status: match err {
                AptdeskError::Auth { status } => Some(*status),
                _ => None,
            },
            validation: err.is_validation(),
        }
    }
}

/// Responses sent from the worker thread back to the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerResponse {
    /// The collection was fetched. `records` are raw JSON, decoded by the screen.
    ListLoaded {
        kind: EntityKind,
        generation: u64,
        request_id: u64,
        reason: FetchReason,
        records: Vec<Value>,
    },

    /// A bulk action finished (possibly with per-id failures).
    BulkCompleted {
        kind: EntityKind,
        generation: u64,
        report: BulkReport,
    },

    /// A whole-collection export is ready to be written.
    ExportReady {
        kind: EntityKind,
        generation: u64,
        file: ExportFile,
    },

    /// A soft-deleted record was restored.
    Restored {
        kind: EntityKind,
        generation: u64,
        id: EntityId,
    },

    /// The server parsed an import file; nothing is stored yet.
    ImportPreviewed {
        kind: EntityKind,
        generation: u64,
        rows: Vec<Value>,
    },

    /// Previewed rows were stored.
    Imported {
        kind: EntityKind,
        generation: u64,
        count: usize,
    },

    /// The request failed as a whole.
    Failed {
        kind: EntityKind,
        generation: u64,
        operation: Operation,
        failure: WorkerFailure,
    },
}

impl WorkerResponse {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        match self {
            Self::ListLoaded { generation, .. }
            | Self::BulkCompleted { generation, .. }
            | Self::ExportReady { generation, .. }
            | Self::Restored { generation, .. }
            | Self::ImportPreviewed { generation, .. }
            | Self::Imported { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::ListLoaded { kind, .. }
            | Self::BulkCompleted { kind, .. }
            | Self::ExportReady { kind, .. }
            | Self::Restored { kind, .. }
            | Self::ImportPreviewed { kind, .. }
            | Self::Imported { kind, .. }
            | Self::Failed { kind, .. } => *kind,
        }
    }
}
