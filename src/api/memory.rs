//! In-memory [`ApiClient`] for offline use and tests.
//!
//! Holds raw JSON records per entity kind behind a mutex and applies mutations
//! to them the way the server would. Failures can be scripted per id, for
//! whole batches, or for list fetches, and every call is recorded so tests
//! can assert on the traffic a screen produced.

use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::client::{ApiClient, BatchFailure, BatchOp, BatchReply};
use super::query::ListQuery;
use crate::domain::{AptdeskError, EntityId, EntityKind, ExportFormat, Result};

/// A failure the fake server should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    Network(String),
    Auth(u16),
    Api(u16, String),
}

impl ScriptedFailure {
    fn to_error(&self) -> AptdeskError {
        match self {
            Self::Network(message) => AptdeskError::Network(message.clone()),
            Self::Auth(status) => AptdeskError::Auth { status: *status },
            Self::Api(status, message) => AptdeskError::Api {
                status: *status,
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<EntityKind, Vec<Value>>,
    deleted: HashMap<EntityKind, Vec<Value>>,
    failing_ids: HashMap<EntityId, String>,
    list_failure: Option<ScriptedFailure>,
    batch_failure: Option<ScriptedFailure>,
    batch_enabled: bool,
    calls: Vec<String>,
}

/// Fake registry API backed by in-memory JSON records.
#[derive(Debug)]
pub struct InMemoryApi {
    inner: Mutex<Inner>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("_id").and_then(Value::as_str)
}

/// Applies the forwarded list parameters the way the server does.
///
/// `status` reads the `active` flag. `startDate`/`endDate` compare the day of
/// `createdAt`, both bounds inclusive. Records without the field never match.
fn matches_query(record: &Value, query: &ListQuery) -> bool {
    query.pairs().iter().all(|(key, wanted)| match key.as_str() {
        "status" => {
            let active = record.get("active").and_then(Value::as_bool).unwrap_or(true);
            wanted == (if active { "active" } else { "inactive" })
        }
        "startDate" => created_day(record).is_some_and(|day| day >= wanted.as_str()),
        "endDate" => created_day(record).is_some_and(|day| day <= wanted.as_str()),
        _ => match record.get(key) {
            Some(Value::String(text)) => text == wanted,
            Some(Value::Number(number)) => number.to_string() == *wanted,
            _ => false,
        },
    })
}

/// Parses an import upload: a JSON array of objects, or CSV with a header row.
fn parse_import(bytes: &[u8]) -> Result<Vec<Value>> {
    let unreadable = || AptdeskError::Api {
        status: 400,
        message: "import file is neither a JSON array nor CSV".to_string(),
    };
    let text = std::str::from_utf8(bytes).map_err(|_| unreadable())?;
    if let Ok(Value::Array(rows)) = serde_json::from_str::<Value>(text) {
        return Ok(rows);
    }

    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header: Vec<&str> = lines.next().ok_or_else(unreadable)?.split(',').map(str::trim).collect();
    if header.len() < 2 {
        return Err(unreadable());
    }
    Ok(lines
        .map(|line| {
            let row = header
                .iter()
                .zip(line.split(',').map(str::trim))
                .map(|(key, cell)| {
                    let value = match cell {
                        "true" => Value::Bool(true),
                        "false" => Value::Bool(false),
                        _ => Value::String(cell.to_string()),
                    };
                    ((*key).to_string(), value)
                })
                .collect();
            Value::Object(row)
        })
        .collect())
}

fn created_day(record: &Value) -> Option<&str> {
    record
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|text| text.get(..10))
}

impl InMemoryApi {
    /// Empty store with batch endpoints enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                batch_enabled: true,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads records from a JSON fixture keyed by collection name.
    ///
    /// ```json
    /// { "households": [...], "residents": [...], "vehicles": [...] }
    /// ```
    ///
    /// Missing collections start empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON object of arrays.
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut collections: HashMap<String, Vec<Value>> = serde_json::from_str(&contents)?;
        let api = Self::new();
        for kind in [EntityKind::Household, EntityKind::Resident, EntityKind::Vehicle] {
            if let Some(records) = collections.remove(kind.resource()) {
                tracing::debug!(%kind, count = records.len(), "fixture loaded");
                api.set_records(kind, records);
            }
        }
        Ok(api)
    }

    /// Replaces the records of one kind.
    #[must_use]
    pub fn with_records(self, kind: EntityKind, records: Vec<Value>) -> Self {
        self.lock().records.insert(kind, records);
        self
    }

    pub fn set_records(&self, kind: EntityKind, records: Vec<Value>) {
        self.lock().records.insert(kind, records);
    }

    /// Current records of one kind.
    #[must_use]
    pub fn records(&self, kind: EntityKind) -> Vec<Value> {
        self.lock().records.get(&kind).cloned().unwrap_or_default()
    }

    /// Makes every mutation of `id` fail with `reason`.
    pub fn fail_id(&self, id: impl Into<EntityId>, reason: impl Into<String>) {
        self.lock().failing_ids.insert(id.into(), reason.into());
    }

    pub fn set_list_failure(&self, failure: Option<ScriptedFailure>) {
        self.lock().list_failure = failure;
    }

    pub fn set_batch_failure(&self, failure: Option<ScriptedFailure>) {
        self.lock().batch_failure = failure;
    }

    /// Toggles whether batch endpoints exist; without them callers fan out.
    pub fn set_batch_enabled(&self, enabled: bool) {
        self.lock().batch_enabled = enabled;
    }

    /// Calls received so far, as `"<op> <kind> [<ids>]"` strings.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn check_id(inner: &Inner, id: &EntityId) -> Result<()> {
        match inner.failing_ids.get(id) {
            Some(reason) => Err(AptdeskError::Api {
                status: 422,
                message: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn update_active(inner: &mut Inner, kind: EntityKind, id: &EntityId, active: bool) -> Result<()> {
        Self::check_id(inner, id)?;
        let record = inner
            .records
            .get_mut(&kind)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|r| record_id(r) == Some(id.as_str()))
            })
            .ok_or_else(|| AptdeskError::Api {
                status: 404,
                message: format!("{id} not found"),
            })?;
        if let Some(object) = record.as_object_mut() {
            object.insert("active".to_string(), Value::Bool(active));
        }
        Ok(())
    }

    fn remove(inner: &mut Inner, kind: EntityKind, id: &EntityId) -> Result<()> {
        Self::check_id(inner, id)?;
        let records = inner.records.entry(kind).or_default();
        let position = records
            .iter()
            .position(|r| record_id(r) == Some(id.as_str()))
            .ok_or_else(|| AptdeskError::Api {
                status: 404,
                message: format!("{id} not found"),
            })?;
        let record = records.remove(position);
        inner.deleted.entry(kind).or_default().push(record);
        Ok(())
    }

    fn batch<F>(&self, kind: EntityKind, ids: &[EntityId], label: &str, mut apply: F) -> Result<BatchReply>
    where
        F: FnMut(&mut Inner, &EntityId) -> Result<()>,
    {
        let mut inner = self.lock();
        inner.calls.push(format!("{label} {kind} {ids:?}"));
        if !inner.batch_enabled {
            return Err(AptdeskError::Validation(format!("{kind} has no batch endpoint")));
        }
        if let Some(failure) = &inner.batch_failure {
            return Err(failure.to_error());
        }
        let mut reply = BatchReply::default();
        for id in ids {
            if let Err(err) = apply(&mut inner, id) {
                reply.failed.push(BatchFailure {
                    id: id.clone(),
                    reason: err.reason(),
                });
            }
        }
        Ok(reply)
    }
}

impl ApiClient for InMemoryApi {
    fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<Vec<Value>> {
        let mut inner = self.lock();
        inner.calls.push(format!("list {kind} {:?}", query.pairs()));
        if let Some(failure) = &inner.list_failure {
            return Err(failure.to_error());
        }
        Ok(inner
            .records
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|record| matches_query(record, query))
            .cloned()
            .collect())
    }

    fn set_active(&self, kind: EntityKind, id: &EntityId, active: bool) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("set_active {kind} {id} {active}"));
        Self::update_active(&mut inner, kind, id, active)
    }

    fn bulk_set_active(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        active: bool,
    ) -> Result<BatchReply> {
        self.batch(kind, ids, "bulk_set_active", |inner, id| {
            Self::update_active(inner, kind, id, active)
        })
    }

    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("delete {kind} {id}"));
        Self::remove(&mut inner, kind, id)
    }

    fn bulk_delete(&self, kind: EntityKind, ids: &[EntityId]) -> Result<BatchReply> {
        self.batch(kind, ids, "bulk_delete", |inner, id| Self::remove(inner, kind, id))
    }

    fn restore(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(format!("restore {kind} {id}"));
        let deleted = inner.deleted.entry(kind).or_default();
        let position = deleted
            .iter()
            .position(|r| record_id(r) == Some(id.as_str()))
            .ok_or_else(|| AptdeskError::Api {
                status: 404,
                message: format!("{id} not found"),
            })?;
        let record = deleted.remove(position);
        inner.records.entry(kind).or_default().push(record);
        Ok(())
    }

    fn export(
        &self,
        kind: EntityKind,
        format: ExportFormat,
        ids: Option<&[EntityId]>,
    ) -> Result<Vec<u8>> {
        let mut inner = self.lock();
        inner.calls.push(format!("export {kind} {format} {ids:?}"));
        if ids.is_some() {
            if let Some(failure) = &inner.batch_failure {
                return Err(failure.to_error());
            }
        }
        let mut out = String::from("id,active\n");
        for record in inner.records.get(&kind).into_iter().flatten() {
            let Some(id) = record_id(record) else { continue };
            if ids.is_some_and(|ids| !ids.iter().any(|i| i.as_str() == id)) {
                continue;
            }
            let active = record.get("active").and_then(Value::as_bool).unwrap_or(true);
            out.push_str(&format!("{id},{active}\n"));
        }
        Ok(out.into_bytes())
    }

    fn import_preview(&self, kind: EntityKind, filename: &str, bytes: &[u8]) -> Result<Vec<Value>> {
        self.lock()
            .calls
            .push(format!("import_preview {kind} {filename}"));
        parse_import(bytes)
    }

    fn import_confirm(&self, kind: EntityKind, rows: &[Value]) -> Result<usize> {
        let mut inner = self.lock();
        inner.calls.push(format!("import_confirm {kind} {}", rows.len()));
        if let Some(failure) = &inner.batch_failure {
            return Err(failure.to_error());
        }
        let records = inner.records.entry(kind).or_default();
        for row in rows {
            let mut row = row.clone();
            if let Some(object) = row.as_object_mut() {
                if !object.contains_key("_id") {
                    let id = format!("imported-{}", records.len() + 1);
                    object.insert("_id".to_string(), Value::String(id));
                }
            }
            records.push(row);
        }
        Ok(rows.len())
    }

    fn supports_batch(&self, _kind: EntityKind, _op: BatchOp) -> bool {
        self.lock().batch_enabled
    }
}
