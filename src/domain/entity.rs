//! Entity capability trait shared by the registry screens.
//!
//! Households, residents and vehicles are structurally interchangeable for the
//! list engine: each has a stable id, an `active` flag, a creation timestamp,
//! a handful of searchable strings and named fields used by filters and sorts.
//! The [`Entity`] trait captures exactly that, so the filter, pagination,
//! selection and bulk-action code is written once and reused by every screen.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use super::error::AptdeskError;

/// Stable server-side identifier (`_id` in the API payloads).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps a raw id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which registry a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Household,
    Resident,
    Vehicle,
}

impl EntityKind {
    /// REST collection segment, e.g. `households` in `/api/households`.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Household => "households",
            Self::Resident => "residents",
            Self::Vehicle => "vehicles",
        }
    }

    /// Body key the bulk endpoints expect for the id list.
    #[must_use]
    pub const fn ids_field(self) -> &'static str {
        match self {
            Self::Household => "householdIds",
            Self::Resident => "residentIds",
            Self::Vehicle => "vehicleIds",
        }
    }

    /// Storage key prefix for per-screen client data.
    #[must_use]
    pub const fn screen_key(self) -> &'static str {
        match self {
            Self::Household => "householdList",
            Self::Resident => "residentList",
            Self::Vehicle => "vehicleList",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

impl FromStr for EntityKind {
    type Err = AptdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "household" | "households" => Ok(Self::Household),
            "resident" | "residents" => Ok(Self::Resident),
            "vehicle" | "vehicles" => Ok(Self::Vehicle),
            other => Err(AptdeskError::Validation(format!("unknown entity kind: {other}"))),
        }
    }
}

/// A field read off an entity for filtering or sorting.
///
/// `Missing` stands for an absent or null field. Sorting treats it as the zero
/// value of whatever it is compared against; filters never match it unless they
/// explicitly target unspecified fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(i64),
    Date(DateTime<Utc>),
    Bool(bool),
    Missing,
}

impl<'a> FieldValue<'a> {
    /// Borrowed text for present optional strings, `Missing` otherwise.
    #[must_use]
    pub fn text(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, |v| Self::Text(Cow::Borrowed(v)))
    }

    /// Date for present timestamps, `Missing` otherwise.
    #[must_use]
    pub fn date(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Missing, Self::Date)
    }

    /// Number for present values, `Missing` otherwise.
    #[must_use]
    pub fn number(value: Option<i64>) -> Self {
        value.map_or(Self::Missing, Self::Number)
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Text form used for exact-match filters.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(s) => Some(Cow::Borrowed(s.as_ref())),
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::Bool(b) => Some(Cow::Owned(b.to_string())),
            Self::Date(d) => Some(Cow::Owned(d.to_rfc3339())),
            Self::Missing => None,
        }
    }
}

/// How a filter key interprets its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Field text must equal the value.
    Exact,
    /// Numeric field must fall into an inclusive bucket (`2-3`, `6+`, `under18`).
    Bucket,
    /// Date field must fall into an inclusive `start..end` range.
    DateRange,
}

/// Context needed by derived fields such as age or days-until-expiry.
///
/// Keeping the reference date explicit keeps view derivation pure: the same
/// inputs always give the same view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldContext {
    /// Day relative to which ages and expiry deltas are computed.
    pub as_of: Option<NaiveDate>,
}

/// Capability interface implemented by every registry record.
pub trait Entity: Clone + fmt::Debug + PartialEq + serde::de::DeserializeOwned + Send + 'static {
    /// Registry this type belongs to.
    const KIND: EntityKind;

    /// Sort key used when the requested key is unknown.
    const DEFAULT_SORT: &'static str;

    /// Field whose values group the statistics panel.
    const GROUP_KEY: &'static str;

    fn id(&self) -> &EntityId;

    fn is_active(&self) -> bool;

    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Strings matched by the free-text search box (present fields only).
    fn searchable_fields(&self) -> Vec<&str>;

    /// Reads a named field. Unknown keys fall back to [`Entity::common_field`].
    fn field(&self, key: &str, ctx: &FieldContext) -> FieldValue<'_>;

    /// Keys accepted by the sort selector.
    fn sort_keys() -> &'static [&'static str];

    /// Primary label (apartment number, full name, licence plate).
    fn display_name(&self) -> String;

    /// Secondary label shown next to the primary one.
    fn display_detail(&self) -> String;

    /// How values for `key` are interpreted by filters.
    fn filter_kind(key: &str) -> FilterKind {
        match key {
            "createdAt" => FilterKind::DateRange,
            _ => FilterKind::Exact,
        }
    }

    /// Fields every entity has: `id`, `status`, `active`, `createdAt`.
    fn common_field(&self, key: &str) -> FieldValue<'_> {
        match key {
            "id" | "_id" => FieldValue::Text(Cow::Borrowed(self.id().as_str())),
            "status" => FieldValue::Text(Cow::Borrowed(if self.is_active() {
                "active"
            } else {
                "inactive"
            })),
            "active" => FieldValue::Bool(self.is_active()),
            "createdAt" => FieldValue::date(self.created_at()),
            _ => FieldValue::Missing,
        }
    }

    /// Resolves a requested sort key, falling back to [`Entity::DEFAULT_SORT`].
    fn resolve_sort_key(key: &str) -> &'static str {
        Self::sort_keys()
            .iter()
            .find(|k| **k == key)
            .copied()
            .unwrap_or(Self::DEFAULT_SORT)
    }
}

/// Association to another record, either populated or as a bare id.
///
/// The API populates `household` and `owner` references on some endpoints and
/// returns plain ids on others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Populated {
        #[serde(rename = "_id")]
        id: EntityId,
        #[serde(default, rename = "apartmentNumber")]
        apartment_number: Option<String>,
        #[serde(default, rename = "fullName")]
        full_name: Option<String>,
    },
    Id(EntityId),
}

impl Reference {
    #[must_use]
    pub const fn id(&self) -> &EntityId {
        match self {
            Self::Populated { id, .. } | Self::Id(id) => id,
        }
    }

    /// Human label of the referenced record when it was populated.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Populated {
                apartment_number,
                full_name,
                ..
            } => apartment_number.as_deref().or(full_name.as_deref()),
            Self::Id(_) => None,
        }
    }
}

/// Accepts strings, numbers and booleans for fields the API types loosely
/// (`floor` arrives as `3` or `"3"` depending on who created the record).
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Parses RFC 3339 timestamps and bare `YYYY-MM-DD` dates; anything else is
/// treated as missing rather than failing the whole record.
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

/// Parses the date formats accepted in payloads and on the command line.
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub(crate) const fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_parses_singular_and_plural() {
        assert_eq!("households".parse::<EntityKind>().unwrap(), EntityKind::Household);
        assert_eq!("Vehicle".parse::<EntityKind>().unwrap(), EntityKind::Vehicle);
        assert!("payments".parse::<EntityKind>().is_err());
    }

    #[test]
    fn reference_accepts_populated_and_bare_ids() {
        let populated: Reference =
            serde_json::from_str(r#"{"_id":"h1","apartmentNumber":"A-101"}"#).unwrap();
        assert_eq!(populated.id().as_str(), "h1");
        assert_eq!(populated.label(), Some("A-101"));

        let bare: Reference = serde_json::from_str(r#""h2""#).unwrap();
        assert_eq!(bare.id().as_str(), "h2");
        assert_eq!(bare.label(), None);
    }

    #[test]
    fn parse_datetime_accepts_dates_and_timestamps() {
        let date = parse_datetime("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let ts = parse_datetime("2024-03-01T10:30:00.000Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:30:00+00:00");

        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn field_value_text_conversion() {
        assert_eq!(FieldValue::Number(3).as_text().as_deref(), Some("3"));
        assert_eq!(FieldValue::text(None).as_text(), None);
    }
}
