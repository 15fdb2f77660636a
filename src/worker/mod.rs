//! Background worker thread for API operations.
//!
//! Screens never call the API directly. They post [`WorkerMessage`]s and
//! receive [`WorkerResponse`]s, so a slow network never blocks input handling.
//! Messages carry distributed tracing context so worker spans join the
//! originating trace.
//!
//! # Architecture
//!
//! - `messages`: Request/response protocol types with trace context propagation
//! - `handler`: Worker implementation, message processing and the thread handle

pub mod handler;
pub mod messages;

pub use handler::{ApiWorker, WorkerHandle};
pub use messages::{
    FetchReason, Operation, TraceContext, WorkerFailure, WorkerMessage, WorkerResponse,
};
