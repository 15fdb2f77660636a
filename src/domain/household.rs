//! Household records.
//!
//! A household is one apartment unit: its number, building, floor, the owner's
//! contact details and the residents registered to it. The API returns the
//! residents array either populated or as ids; only its length matters here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::entity::{
    default_active, lenient_datetime, text_or_number, Entity, EntityId, EntityKind, FieldContext,
    FieldValue, FilterKind,
};

/// An apartment unit as returned by `GET /api/households`.
///
/// # Examples
///
/// ```
/// use aptdesk::domain::{Entity, Household};
///
/// let json = r#"{"_id":"h1","apartmentNumber":"A-101","building":"A","floor":1,
///                "ownerName":"Tran Van An","residents":["r1","r2"],"active":true}"#;
/// let household: Household = serde_json::from_str(json).unwrap();
/// assert_eq!(household.residents_count(), 2);
/// assert_eq!(household.floor.as_deref(), Some("1"));
/// assert!(household.is_active());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub apartment_number: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub building: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub floor: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub area: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub residents: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Household {
    /// Number of residents registered to this unit.
    #[must_use]
    pub fn residents_count(&self) -> usize {
        self.residents.len()
    }
}

const SORT_KEYS: &[&str] = &[
    "apartmentNumber",
    "building",
    "floor",
    "ownerName",
    "residentsCount",
    "createdAt",
    "id",
];

impl Entity for Household {
    const KIND: EntityKind = EntityKind::Household;
    const DEFAULT_SORT: &'static str = "apartmentNumber";
    const GROUP_KEY: &'static str = "building";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn searchable_fields(&self) -> Vec<&str> {
        [
            self.apartment_number.as_deref(),
            self.address.as_deref(),
            self.owner_name.as_deref(),
            self.phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn field(&self, key: &str, _ctx: &FieldContext) -> FieldValue<'_> {
        match key {
            "apartmentNumber" => FieldValue::text(self.apartment_number.as_deref()),
            "building" => FieldValue::text(self.building.as_deref()),
            "floor" => FieldValue::text(self.floor.as_deref()),
            "ownerName" => FieldValue::text(self.owner_name.as_deref()),
            "phone" => FieldValue::text(self.phone.as_deref()),
            "address" => FieldValue::text(self.address.as_deref()),
            "residents" | "residentsCount" => {
                FieldValue::Number(i64::try_from(self.residents_count()).unwrap_or(i64::MAX))
            }
            _ => self.common_field(key),
        }
    }

    fn sort_keys() -> &'static [&'static str] {
        SORT_KEYS
    }

    fn filter_kind(key: &str) -> FilterKind {
        match key {
            "residents" | "residentsCount" => FilterKind::Bucket,
            "createdAt" => FilterKind::DateRange,
            _ => FilterKind::Exact,
        }
    }

    fn display_name(&self) -> String {
        self.apartment_number
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    fn display_detail(&self) -> String {
        let location = match (self.building.as_deref(), self.floor.as_deref()) {
            (Some(b), Some(f)) => Cow::Owned(format!("Bldg {b} / Fl {f}")),
            (Some(b), None) => Cow::Owned(format!("Bldg {b}")),
            (None, Some(f)) => Cow::Owned(format!("Fl {f}")),
            (None, None) => Cow::Borrowed("-"),
        };
        match self.owner_name.as_deref() {
            Some(owner) => format!("{location}  {owner}"),
            None => location.into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Household {
        serde_json::from_str(
            r#"{
                "_id": "h1",
                "apartmentNumber": "B-1204",
                "building": "B",
                "floor": "12",
                "ownerName": "Nguyen Thi Lan",
                "phone": "0901234567",
                "residents": [{"_id": "r1"}, {"_id": "r2"}, {"_id": "r3"}],
                "createdAt": "2024-02-10T08:00:00.000Z"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn missing_active_defaults_to_true() {
        assert!(sample().is_active());
    }

    #[test]
    fn residents_are_counted_for_bucket_filters() {
        let household = sample();
        let ctx = FieldContext::default();
        assert_eq!(household.field("residents", &ctx), FieldValue::Number(3));
        assert_eq!(Household::filter_kind("residents"), FilterKind::Bucket);
    }

    #[test]
    fn search_skips_absent_fields() {
        let household = sample();
        let fields = household.searchable_fields();
        assert_eq!(fields, vec!["B-1204", "Nguyen Thi Lan", "0901234567"]);
    }

    #[test]
    fn unknown_sort_key_falls_back_to_apartment_number() {
        assert_eq!(Household::resolve_sort_key("nope"), "apartmentNumber");
        assert_eq!(Household::resolve_sort_key("floor"), "floor");
    }

    #[test]
    fn detail_combines_location_and_owner() {
        assert_eq!(sample().display_detail(), "Bldg B / Fl 12  Nguyen Thi Lan");
    }
}
