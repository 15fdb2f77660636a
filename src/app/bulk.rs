//! Bulk action dispatcher.
//!
//! Applies one action to a set of selected ids and reports which ids succeeded
//! and which failed. A batch endpoint is used when the client has one for the
//! action; otherwise the dispatcher fans out one request per id and keeps going
//! after individual failures. Auth errors always propagate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::notifications::NotificationKind;
use crate::api::{ApiClient, BatchOp};
use crate::domain::{AptdeskError, EntityId, EntityKind, ExportFile, ExportFormat, Result};

/// Action applied to every selected id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "action", content = "format")]
pub enum BulkAction {
    Activate,
    Deactivate,
    Delete,
    Export(ExportFormat),
}

impl BulkAction {
    /// Past-tense verb used in summaries and the activity log.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Activate => "activated",
            Self::Deactivate => "deactivated",
            Self::Delete => "deleted",
            Self::Export(_) => "exported",
        }
    }

    #[must_use]
    pub const fn batch_op(self) -> Option<BatchOp> {
        match self {
            Self::Activate => Some(BatchOp::Activate),
            Self::Deactivate => Some(BatchOp::Deactivate),
            Self::Delete => Some(BatchOp::Delete),
            Self::Export(_) => None,
        }
    }

    /// Whether the action changes server data (and so triggers a refetch).
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Export(_))
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => f.write_str("activate"),
            Self::Deactivate => f.write_str("deactivate"),
            Self::Delete => f.write_str("delete"),
            Self::Export(format) => write!(f, "export ({format})"),
        }
    }
}

impl std::str::FromStr for BulkAction {
    type Err = AptdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export(ExportFormat::default())),
            other => match other.strip_prefix("export:") {
                Some(format) => Ok(Self::Export(format.parse()?)),
                None => Err(AptdeskError::Validation(format!("unknown bulk action: {other}"))),
            },
        }
    }
}

/// Proof that the user confirmed deleting a specific number of records.
///
/// Created by the confirmation prompt; a delete whose id count differs from the
/// confirmed count is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfirmation {
    count: usize,
}

impl DeleteConfirmation {
    /// Confirms deletion of exactly `ids.len()` records.
    #[must_use]
    pub fn for_ids(ids: &[EntityId]) -> Self {
        Self { count: ids.len() }
    }

    #[must_use]
    pub const fn count(self) -> usize {
        self.count
    }
}

/// One id that the action could not be applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: EntityId,
    pub reason: String,
}

/// Aggregate outcome of one bulk invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub action: BulkAction,
    pub succeeded: Vec<EntityId>,
    pub failed: Vec<BulkFailure>,
    pub export: Option<ExportFile>,
}

impl BulkReport {
    fn new(action: BulkAction) -> Self {
        Self {
            action,
            succeeded: Vec::new(),
            failed: Vec::new(),
            export: None,
        }
    }

    fn fail_all(action: BulkAction, ids: &[EntityId], reason: &str) -> Self {
        Self {
            failed: ids
                .iter()
                .map(|id| BulkFailure {
                    id: id.clone(),
                    reason: reason.to_string(),
                })
                .collect(),
            ..Self::new(action)
        }
    }

    /// Single notification text and severity summarizing the outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use aptdesk::app::bulk::{BulkAction, BulkFailure, BulkReport};
    /// use aptdesk::app::notifications::NotificationKind;
    /// use aptdesk::domain::EntityId;
    ///
    /// let report = BulkReport {
    ///     action: BulkAction::Activate,
    ///     succeeded: vec![EntityId::from("1"), EntityId::from("3")],
    ///     failed: vec![BulkFailure { id: EntityId::from("2"), reason: "locked".into() }],
    ///     export: None,
    /// };
    /// assert_eq!(report.summary(), ("activated 2 / failed 1".to_string(), NotificationKind::Warning));
    /// ```
    #[must_use]
    pub fn summary(&self) -> (String, NotificationKind) {
        let ok = self.succeeded.len();
        let failed = self.failed.len();
        let verb = self.action.verb();
        match (ok, failed) {
            (_, 0) => (format!("{verb} {ok}"), NotificationKind::Success),
            (0, _) => {
                let reason = self.failed.first().map_or("", |f| f.reason.as_str());
                (
                    format!("{verb} 0 / failed {failed}: {reason}"),
                    NotificationKind::Error,
                )
            }
            _ => (
                format!("{verb} {ok} / failed {failed}"),
                NotificationKind::Warning,
            ),
        }
    }
}

fn fan_out<F>(action: BulkAction, ids: &[EntityId], mut apply: F) -> Result<BulkReport>
where
    F: FnMut(&EntityId) -> Result<()>,
{
    let mut report = BulkReport::new(action);
    for id in ids {
        match apply(id) {
            Ok(()) => report.succeeded.push(id.clone()),
            Err(err) if err.is_auth() => return Err(err),
            Err(err) => {
                tracing::debug!(%id, error = %err, "bulk item failed");
                report.failed.push(BulkFailure {
                    id: id.clone(),
                    reason: err.reason(),
                });
            }
        }
    }
    Ok(report)
}

/// Runs `action` against `ids`.
///
/// # Parameters
///
/// * `client` - API client, used through the batch endpoint when it has one
/// * `kind` - Registry the ids belong to
/// * `action` - Action to apply
/// * `ids` - Target ids, typically the current selection
/// * `confirmation` - Required for [`BulkAction::Delete`]; must cover `ids.len()`
/// * `today` - Date stamped into export filenames
///
/// # Errors
///
/// - [`AptdeskError::Validation`] for an empty id set or an unconfirmed delete
/// - [`AptdeskError::Auth`] when the API rejects the session
///
/// Any other failure is folded into [`BulkReport::failed`].
pub fn execute(
    client: &dyn ApiClient,
    kind: EntityKind,
    action: BulkAction,
    ids: &[EntityId],
    confirmation: Option<DeleteConfirmation>,
    today: NaiveDate,
) -> Result<BulkReport> {
    let _span = tracing::debug_span!("bulk_execute", %kind, %action, count = ids.len()).entered();

    if ids.is_empty() {
        return Err(AptdeskError::Validation("no records selected".to_string()));
    }
    if action == BulkAction::Delete {
        match confirmation {
            Some(confirmed) if confirmed.count() == ids.len() => {}
            Some(confirmed) => {
                return Err(AptdeskError::Validation(format!(
                    "delete confirmed for {} records but {} are selected",
                    confirmed.count(),
                    ids.len()
                )))
            }
            None => {
                return Err(AptdeskError::Validation(
                    "delete requires confirmation".to_string(),
                ))
            }
        }
    }

    if let BulkAction::Export(format) = action {
        return match client.export(kind, format, Some(ids)) {
            Ok(bytes) => Ok(BulkReport {
                succeeded: ids.to_vec(),
                export: Some(ExportFile {
                    filename: ExportFile::selected_name(kind, format, today),
                    bytes,
                }),
                ..BulkReport::new(action)
            }),
            Err(err) if err.is_auth() => Err(err),
            Err(err) => Ok(BulkReport::fail_all(action, ids, &err.reason())),
        };
    }

    let use_batch = action
        .batch_op()
        .is_some_and(|op| client.supports_batch(kind, op));

    let report = if use_batch {
        let reply = match action {
            BulkAction::Delete => client.bulk_delete(kind, ids),
            _ => client.bulk_set_active(kind, ids, action == BulkAction::Activate),
        };
        match reply {
            Ok(reply) => {
                let mut report = BulkReport::new(action);
                for id in ids {
                    match reply.failed.iter().find(|f| &f.id == id) {
                        Some(failure) => report.failed.push(BulkFailure {
                            id: id.clone(),
                            reason: failure.reason.clone(),
                        }),
                        None => report.succeeded.push(id.clone()),
                    }
                }
                report
            }
            Err(err) if err.is_auth() => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "batch request failed as a whole");
                BulkReport::fail_all(action, ids, &err.reason())
            }
        }
    } else {
        fan_out(action, ids, |id| match action {
            BulkAction::Delete => client.delete(kind, id),
            _ => client.set_active(kind, id, action == BulkAction::Activate),
        })?
    };

    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        batch = use_batch,
        "bulk action finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryApi, ScriptedFailure};
    use serde_json::json;

    fn api() -> InMemoryApi {
        InMemoryApi::new().with_records(
            EntityKind::Household,
            vec![json!({"_id": "1"}), json!({"_id": "2"}), json!({"_id": "3"})],
        )
    }

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn fan_out_collects_partial_failures() {
        let api = api();
        api.set_batch_enabled(false);
        api.fail_id("2", "Household has unpaid fees");
        let report = execute(
            &api,
            EntityKind::Household,
            BulkAction::Deactivate,
            &ids(&["1", "2", "3"]),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(report.succeeded, ids(&["1", "3"]));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].reason, "Household has unpaid fees");
        assert_eq!(api.calls().len(), 3);
    }

    #[test]
    fn batch_is_one_request() {
        let api = api();
        execute(
            &api,
            EntityKind::Household,
            BulkAction::Activate,
            &ids(&["1", "2"]),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(api.calls().len(), 1);
        assert!(api.calls()[0].starts_with("bulk_set_active"));
    }

    #[test]
    fn whole_batch_failure_marks_every_id() {
        let api = api();
        api.set_batch_failure(Some(ScriptedFailure::Api(500, "database offline".into())));
        let report = execute(
            &api,
            EntityKind::Household,
            BulkAction::Activate,
            &ids(&["1", "2"]),
            None,
            today(),
        )
        .unwrap();
        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|f| f.reason == "database offline"));
        assert_eq!(report.summary().1, NotificationKind::Error);
    }

    #[test]
    fn auth_failures_propagate() {
        let api = api();
        api.set_batch_failure(Some(ScriptedFailure::Auth(401)));
        let err = execute(
            &api,
            EntityKind::Household,
            BulkAction::Activate,
            &ids(&["1"]),
            None,
            today(),
        )
        .unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn delete_needs_matching_confirmation() {
        let api = api();
        let targets = ids(&["1", "2"]);
        let missing = execute(&api, EntityKind::Household, BulkAction::Delete, &targets, None, today());
        assert!(missing.unwrap_err().is_validation());

        let stale = DeleteConfirmation::for_ids(&ids(&["1"]));
        let mismatched =
            execute(&api, EntityKind::Household, BulkAction::Delete, &targets, Some(stale), today());
        assert!(mismatched.unwrap_err().is_validation());
        assert!(api.calls().is_empty());

        let confirmed = DeleteConfirmation::for_ids(&targets);
        let report =
            execute(&api, EntityKind::Household, BulkAction::Delete, &targets, Some(confirmed), today())
                .unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(api.records(EntityKind::Household).len(), 1);
    }

    #[test]
    fn export_names_the_file() {
        let api = api();
        let report = execute(
            &api,
            EntityKind::Household,
            BulkAction::Export(ExportFormat::Excel),
            &ids(&["1"]),
            None,
            today(),
        )
        .unwrap();
        let file = report.export.unwrap();
        assert_eq!(file.filename, "selected_households_2024-03-01.xlsx");
        assert!(!file.bytes.is_empty());
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = execute(&api(), EntityKind::Household, BulkAction::Activate, &[], None, today())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn actions_parse_from_cli_names() {
        assert_eq!("activate".parse::<BulkAction>().unwrap(), BulkAction::Activate);
        assert_eq!(
            "export:csv".parse::<BulkAction>().unwrap(),
            BulkAction::Export(ExportFormat::Csv)
        );
        assert!("archive".parse::<BulkAction>().is_err());
    }
}
