//! Registry API access.
//!
//! - [`client`]: The object-safe [`ApiClient`] trait and batch reply types
//! - [`http`]: [`HttpApiClient`], the `reqwest` implementation
//! - [`memory`]: [`InMemoryApi`], an offline implementation used by tests and fixtures
//! - [`query`]: [`ListQuery`], server-side filter parameters

pub mod client;
pub mod http;
pub mod memory;
pub mod query;

pub use client::{ApiClient, BatchFailure, BatchOp, BatchReply};
pub use http::HttpApiClient;
pub use memory::{InMemoryApi, ScriptedFailure};
pub use query::ListQuery;
