//! The API client seam.
//!
//! Everything that talks to the registry API goes through [`ApiClient`]. The
//! trait is object-safe and keyed by [`EntityKind`] so a single worker can
//! serve all three screens, and so tests can swap in
//! [`InMemoryApi`](super::memory::InMemoryApi).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::query::ListQuery;
use crate::domain::{EntityId, EntityKind, ExportFormat, Result};

/// Mutations that may have a dedicated batch endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOp {
    Activate,
    Deactivate,
    Delete,
}

/// Per-id failure reported by a batch endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub id: EntityId,
    pub reason: String,
}

/// Outcome of a batch request that succeeded as a whole.
///
/// Ids not listed in `failed` are treated as succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReply {
    pub failed: Vec<BatchFailure>,
}

impl BatchReply {
    /// Reads the optional `failed` array of a batch response body.
    ///
    /// Entries may use `id` or `_id` and `message` or `reason`; entries without
    /// an id are ignored. A body without `failed` means every id succeeded.
    #[must_use]
    pub fn from_body(body: &Value) -> Self {
        let failed = body
            .get("failed")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let id = entry
                            .get("id")
                            .or_else(|| entry.get("_id"))
                            .and_then(Value::as_str)?;
                        let reason = entry
                            .get("message")
                            .or_else(|| entry.get("reason"))
                            .and_then(Value::as_str)
                            .unwrap_or("rejected by server");
                        Some(BatchFailure {
                            id: EntityId::from(id),
                            reason: reason.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { failed }
    }
}

/// Registry API operations used by the list screens.
///
/// Implementations return raw JSON records from [`ApiClient::list`]; decoding
/// into concrete entities happens in the view state that knows the type.
pub trait ApiClient: Send {
    /// `GET /api/{kind}` with the query's parameters.
    fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<Vec<Value>>;

    /// `PUT /api/{kind}/:id` with `{"active": active}`.
    fn set_active(&self, kind: EntityKind, id: &EntityId, active: bool) -> Result<()>;

    /// Batch form of [`ApiClient::set_active`].
    fn bulk_set_active(&self, kind: EntityKind, ids: &[EntityId], active: bool)
        -> Result<BatchReply>;

    /// `DELETE /api/{kind}/:id`.
    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<()>;

    /// `DELETE /api/{kind}/bulk-delete`.
    fn bulk_delete(&self, kind: EntityKind, ids: &[EntityId]) -> Result<BatchReply>;

    /// `PUT /api/{kind}/:id/restore`.
    fn restore(&self, kind: EntityKind, id: &EntityId) -> Result<()>;

    /// Export body for the selected ids, or the whole collection when `ids` is `None`.
    fn export(
        &self,
        kind: EntityKind,
        format: ExportFormat,
        ids: Option<&[EntityId]>,
    ) -> Result<Vec<u8>>;

    /// `POST /api/{kind}/import` with the file as multipart form data.
    ///
    /// Returns the rows the server parsed for review. Nothing is stored yet.
    fn import_preview(&self, kind: EntityKind, filename: &str, bytes: &[u8]) -> Result<Vec<Value>>;

    /// `POST /api/{kind}/import/confirm` with the reviewed rows.
    ///
    /// Returns how many records the server stored.
    fn import_confirm(&self, kind: EntityKind, rows: &[Value]) -> Result<usize>;

    /// Whether `op` has a batch endpoint for `kind`; otherwise callers fan out per id.
    fn supports_batch(&self, kind: EntityKind, op: BatchOp) -> bool;
}

impl<C: ApiClient + Sync + ?Sized> ApiClient for std::sync::Arc<C> {
    fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<Vec<Value>> {
        (**self).list(kind, query)
    }

    fn set_active(&self, kind: EntityKind, id: &EntityId, active: bool) -> Result<()> {
        (**self).set_active(kind, id, active)
    }

    fn bulk_set_active(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        active: bool,
    ) -> Result<BatchReply> {
        (**self).bulk_set_active(kind, ids, active)
    }

    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        (**self).delete(kind, id)
    }

    fn bulk_delete(&self, kind: EntityKind, ids: &[EntityId]) -> Result<BatchReply> {
        (**self).bulk_delete(kind, ids)
    }

    fn restore(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        (**self).restore(kind, id)
    }

    fn export(
        &self,
        kind: EntityKind,
        format: ExportFormat,
        ids: Option<&[EntityId]>,
    ) -> Result<Vec<u8>> {
        (**self).export(kind, format, ids)
    }

    fn import_preview(&self, kind: EntityKind, filename: &str, bytes: &[u8]) -> Result<Vec<Value>> {
        (**self).import_preview(kind, filename, bytes)
    }

    fn import_confirm(&self, kind: EntityKind, rows: &[Value]) -> Result<usize> {
        (**self).import_confirm(kind, rows)
    }

    fn supports_batch(&self, kind: EntityKind, op: BatchOp) -> bool {
        (**self).supports_batch(kind, op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_reply_reads_failed_entries() {
        let reply = BatchReply::from_body(&json!({
            "success": true,
            "failed": [
                {"_id": "2", "message": "Household has active residents"},
                {"id": "5"},
                {"message": "no id"}
            ]
        }));
        assert_eq!(reply.failed.len(), 2);
        assert_eq!(reply.failed[0].reason, "Household has active residents");
        assert_eq!(reply.failed[1].reason, "rejected by server");
    }

    #[test]
    fn batch_reply_without_failures_is_empty() {
        assert!(BatchReply::from_body(&json!({"modifiedCount": 3})).failed.is_empty());
    }
}
