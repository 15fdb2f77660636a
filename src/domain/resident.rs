//! Resident records.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{
    default_active, lenient_datetime, Entity, EntityId, EntityKind, FieldContext, FieldValue,
    FilterKind, Reference,
};

/// A person registered to a household.
///
/// `household` is populated (`{"_id", "apartmentNumber"}`) on the list
/// endpoint and a bare id elsewhere; both forms deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub id_card: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub relationship_to_owner: Option<String>,
    #[serde(default)]
    pub household: Option<Reference>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Resident {
    /// Age in whole years as of `ctx.as_of`, by calendar year difference.
    #[must_use]
    pub fn age(&self, ctx: &FieldContext) -> Option<i64> {
        let today = ctx.as_of?;
        let born = self.date_of_birth?;
        Some(i64::from(today.year() - born.year()))
    }

    /// Apartment number of the linked household, when populated.
    #[must_use]
    pub fn apartment_number(&self) -> Option<&str> {
        self.household.as_ref().and_then(Reference::label)
    }
}

const SORT_KEYS: &[&str] = &[
    "fullName",
    "idCard",
    "dateOfBirth",
    "gender",
    "phone",
    "household",
    "createdAt",
    "id",
];

impl Entity for Resident {
    const KIND: EntityKind = EntityKind::Resident;
    const DEFAULT_SORT: &'static str = "fullName";
    const GROUP_KEY: &'static str = "gender";

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
            self.full_name.as_deref(),
            self.id_card.as_deref(),
            self.phone.as_deref(),
            self.apartment_number(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn field(&self, key: &str, ctx: &FieldContext) -> FieldValue<'_> {
        match key {
            "fullName" => FieldValue::text(self.full_name.as_deref()),
            "idCard" => FieldValue::text(self.id_card.as_deref()),
            "gender" => FieldValue::text(self.gender.as_deref()),
            "phone" => FieldValue::text(self.phone.as_deref()),
            "occupation" => FieldValue::text(self.occupation.as_deref()),
            "dateOfBirth" => FieldValue::date(self.date_of_birth),
            "household" => FieldValue::text(self.apartment_number()),
            "householdId" => FieldValue::text(self.household.as_ref().map(|h| h.id().as_str())),
            "age" => FieldValue::number(self.age(ctx)),
            _ => self.common_field(key),
        }
    }

    fn sort_keys() -> &'static [&'static str] {
        SORT_KEYS
    }

    fn filter_kind(key: &str) -> FilterKind {
        match key {
            "age" => FilterKind::Bucket,
            "createdAt" | "dateOfBirth" => FilterKind::DateRange,
            _ => FilterKind::Exact,
        }
    }

    fn display_name(&self) -> String {
        self.full_name.clone().unwrap_or_else(|| self.id.to_string())
    }

    fn display_detail(&self) -> String {
        let apartment = self.apartment_number().unwrap_or("-");
        match self.id_card.as_deref() {
            Some(card) => format!("{card}  Apt {apartment}"),
            None => format!("Apt {apartment}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn resident(json: &str) -> Resident {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn age_uses_reference_date() {
        let r = resident(r#"{"_id":"r1","fullName":"Le Minh","dateOfBirth":"1990-06-15"}"#);
        let ctx = FieldContext {
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        assert_eq!(r.field("age", &ctx), FieldValue::Number(34));
        assert!(r.field("age", &FieldContext::default()).is_missing());
    }

    #[test]
    fn populated_household_is_searchable() {
        let r = resident(
            r#"{"_id":"r1","fullName":"Le Minh","household":{"_id":"h1","apartmentNumber":"A-101"}}"#,
        );
        assert_eq!(r.searchable_fields(), vec!["Le Minh", "A-101"]);
        assert_eq!(
            r.field("household", &FieldContext::default()),
            FieldValue::text(Some("A-101"))
        );
    }

    #[test]
    fn bare_household_id_has_no_label() {
        let r = resident(r#"{"_id":"r1","household":"h9","active":false}"#);
        assert_eq!(r.apartment_number(), None);
        assert!(!r.is_active());
        assert_eq!(r.display_name(), "r1");
    }
}
