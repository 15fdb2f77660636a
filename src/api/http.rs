//! HTTP implementation of [`ApiClient`] over `reqwest`'s blocking client.
//!
//! Runs on the worker thread only. Status handling:
//!
//! - 401/403 become [`AptdeskError::Auth`] and are never retried here.
//! - Other non-2xx statuses become [`AptdeskError::Api`] carrying the server's
//!   `message` field when the body has one.
//! - Transport failures (connect, timeout) become [`AptdeskError::Network`].

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::client::{ApiClient, BatchOp, BatchReply};
use super::query::ListQuery;
use crate::domain::{AptdeskError, EntityId, EntityKind, ExportFormat, Result};

/// Registry API client speaking JSON over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApiClient {
    /// Builds a client for `base_url` (e.g. `http://localhost:5000`).
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Config`] if the URL is empty or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AptdeskError::Config("api_base_url is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AptdeskError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Builds a client from the crate configuration.
    ///
    /// # Errors
    ///
    /// Same as [`HttpApiClient::new`].
    pub fn from_config(config: &crate::Config) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            config.token.clone(),
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )
    }

    fn url(&self, kind: EntityKind, suffix: &str) -> String {
        format!("{}/api/{}{}", self.base_url, kind.resource(), suffix)
    }

    fn send(&self, method: &'static str, path: &str, request: RequestBuilder) -> Result<Response> {
        let _span = tracing::debug_span!("api_request", method, path).entered();

        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().map_err(|e| {
            tracing::warn!(error = %e, "request failed before a response");
            if e.is_timeout() {
                AptdeskError::Network(format!("request timed out: {path}"))
            } else {
                AptdeskError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "response received");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AptdeskError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(AptdeskError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    fn json_body(response: Response) -> Result<Value> {
        let text = response
            .text()
            .map_err(|e| AptdeskError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Finds the record array in a list response.
///
/// Accepts a bare array or an object wrapping it under `data`, `items`, or the
/// resource name (`{"households": [...]}`).
fn extract_list(kind: EntityKind, body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => ["data", "items", kind.resource()]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                AptdeskError::Decode(format!("list response for {kind} has no record array"))
            }),
        other => Err(AptdeskError::Decode(format!(
            "unexpected list response for {kind}: {other}"
        ))),
    }
}

/// Reads the `preview` rows of an import upload response.
fn extract_preview(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("preview") {
            Some(Value::Array(rows)) => Ok(rows),
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(AptdeskError::Decode(format!(
                "import preview is not an array: {other}"
            ))),
        },
        other => Err(AptdeskError::Decode(format!(
            "unexpected import response: {other}"
        ))),
    }
}

/// Reads the `imported` count of an import confirmation.
fn extract_imported(body: &Value) -> Result<usize> {
    body.get("imported")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| AptdeskError::Decode(format!("import confirmation has no count: {body}")))
}

impl ApiClient for HttpApiClient {
    fn list(&self, kind: EntityKind, query: &ListQuery) -> Result<Vec<Value>> {
        let url = self.url(kind, "");
        let request = self.client.get(&url).query(query.pairs());
        let response = self.send("GET", &url, request)?;
        extract_list(kind, Self::json_body(response)?)
    }

    fn set_active(&self, kind: EntityKind, id: &EntityId, active: bool) -> Result<()> {
        let url = self.url(kind, &format!("/{id}"));
        let request = self.client.put(&url).json(&json!({ "active": active }));
        self.send("PUT", &url, request)?;
        Ok(())
    }

    fn bulk_set_active(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        active: bool,
    ) -> Result<BatchReply> {
        let (method, url, request) = match kind {
            EntityKind::Household => {
                let url = self.url(kind, "/bulk-update");
                let body = json!({ kind.ids_field(): ids, "updates": { "active": active } });
                ("PATCH", url.clone(), self.client.patch(&url).json(&body))
            }
            EntityKind::Resident => {
                let suffix = if active { "/bulk-activate" } else { "/bulk-deactivate" };
                let url = self.url(kind, suffix);
                let body = json!({ kind.ids_field(): ids });
                ("PUT", url.clone(), self.client.put(&url).json(&body))
            }
            EntityKind::Vehicle => {
                return Err(AptdeskError::Validation(format!(
                    "{kind} has no batch status endpoint"
                )))
            }
        };
        let response = self.send(method, &url, request)?;
        Ok(BatchReply::from_body(&Self::json_body(response)?))
    }

    fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        let url = self.url(kind, &format!("/{id}"));
        let request = self.client.delete(&url);
        self.send("DELETE", &url, request)?;
        Ok(())
    }

    fn bulk_delete(&self, kind: EntityKind, ids: &[EntityId]) -> Result<BatchReply> {
        let url = self.url(kind, "/bulk-delete");
        let request = self
            .client
            .delete(&url)
            .json(&json!({ kind.ids_field(): ids }));
        let response = self.send("DELETE", &url, request)?;
        Ok(BatchReply::from_body(&Self::json_body(response)?))
    }

    fn restore(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        let url = self.url(kind, &format!("/{id}/restore"));
        let request = self.client.put(&url);
        self.send("PUT", &url, request)?;
        Ok(())
    }

    fn export(
        &self,
        kind: EntityKind,
        format: ExportFormat,
        ids: Option<&[EntityId]>,
    ) -> Result<Vec<u8>> {
        let (method, url, request) = match ids {
            Some(ids) => {
                let url = self.url(kind, "/export-selected");
                let body = json!({ kind.ids_field(): ids, "format": format.as_param() });
                ("POST", url.clone(), self.client.post(&url).json(&body))
            }
            None => {
                let url = self.url(kind, "/export");
                let request = self
                    .client
                    .get(&url)
                    .query(&[("format", format.as_param())]);
                ("GET", url, request)
            }
        };
        let response = self.send(method, &url, request)?;
        let bytes = response
            .bytes()
            .map_err(|e| AptdeskError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn import_preview(&self, kind: EntityKind, filename: &str, bytes: &[u8]) -> Result<Vec<Value>> {
        let url = self.url(kind, "/import");
        let part = Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let request = self.client.post(&url).multipart(Form::new().part("file", part));
        let response = self.send("POST", &url, request)?;
        extract_preview(Self::json_body(response)?)
    }

    fn import_confirm(&self, kind: EntityKind, rows: &[Value]) -> Result<usize> {
        let url = self.url(kind, "/import/confirm");
        let request = self.client.post(&url).json(&json!({ "data": rows }));
        let response = self.send("POST", &url, request)?;
        extract_imported(&Self::json_body(response)?)
    }

    fn supports_batch(&self, kind: EntityKind, op: BatchOp) -> bool {
        match (kind, op) {
            (EntityKind::Household, _) => true,
            (EntityKind::Resident, BatchOp::Activate | BatchOp::Deactivate) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_bodies_may_be_wrapped() {
        let bare = extract_list(EntityKind::Household, json!([{"_id": "1"}])).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped =
            extract_list(EntityKind::Resident, json!({"residents": [{"_id": "r1"}, {"_id": "r2"}]}))
                .unwrap();
        assert_eq!(wrapped.len(), 2);

        let data = extract_list(EntityKind::Vehicle, json!({"success": true, "data": []})).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn unrecognised_list_bodies_are_decode_errors() {
        let err = extract_list(EntityKind::Household, json!({"count": 3})).unwrap_err();
        assert!(matches!(err, AptdeskError::Decode(_)));
    }

    #[test]
    fn import_bodies_are_read() {
        let rows = extract_preview(json!({"preview": [{"apartmentNumber": "A-101"}]})).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(extract_preview(json!({"message": "ok"})).unwrap().is_empty());
        assert!(extract_preview(json!({"preview": "A-101"})).is_err());

        assert_eq!(extract_imported(&json!({"imported": 4})).unwrap(), 4);
        assert!(matches!(
            extract_imported(&json!({"success": true})),
            Err(AptdeskError::Decode(_))
        ));
    }

    #[test]
    fn default_config_targets_api_root_once() {
        let client = HttpApiClient::from_config(&crate::Config::default()).unwrap();
        assert_eq!(
            client.url(EntityKind::Household, ""),
            "http://localhost:5000/api/households"
        );
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = HttpApiClient::new("  ", None, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, AptdeskError::Config(_)));
    }

    #[test]
    fn urls_join_base_and_resource() {
        let client =
            HttpApiClient::new("http://localhost:5000/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.url(EntityKind::Household, "/bulk-delete"),
            "http://localhost:5000/api/households/bulk-delete"
        );
    }
}
