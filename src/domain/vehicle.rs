//! Vehicle records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{
    default_active, lenient_datetime, text_or_number, Entity, EntityId, EntityKind, FieldContext,
    FieldValue, FilterKind, Reference,
};

/// A vehicle registered to a household's parking allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub household: Option<Reference>,
    #[serde(default)]
    pub owner: Option<Reference>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub parking_slot: Option<String>,
    /// Free-form usage status set by staff (in use, parked elsewhere, sold).
    #[serde(default, rename = "status")]
    pub usage_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub registration_expiry: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub insurance_expiry: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// Days from `ctx.as_of` until the registration expires; negative once expired.
    #[must_use]
    pub fn days_until_expiry(&self, ctx: &FieldContext) -> Option<i64> {
        let today = ctx.as_of?;
        let expiry = self.registration_expiry?.date_naive();
        Some((expiry - today).num_days())
    }
}

const SORT_KEYS: &[&str] = &[
    "licensePlate",
    "vehicleType",
    "brand",
    "year",
    "household",
    "registrationExpiry",
    "createdAt",
    "id",
];

impl Entity for Vehicle {
    const KIND: EntityKind = EntityKind::Vehicle;
    const DEFAULT_SORT: &'static str = "licensePlate";
    const GROUP_KEY: &'static str = "vehicleType";

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
            self.license_plate.as_deref(),
            self.brand.as_deref(),
            self.model.as_deref(),
            self.owner.as_ref().and_then(Reference::label),
            self.household.as_ref().and_then(Reference::label),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn field(&self, key: &str, ctx: &FieldContext) -> FieldValue<'_> {
        match key {
            "licensePlate" => FieldValue::text(self.license_plate.as_deref()),
            "vehicleType" => FieldValue::text(self.vehicle_type.as_deref()),
            "brand" => FieldValue::text(self.brand.as_deref()),
            "model" => FieldValue::text(self.model.as_deref()),
            "color" => FieldValue::text(self.color.as_deref()),
            "year" => FieldValue::number(self.year),
            "parkingSlot" => FieldValue::text(self.parking_slot.as_deref()),
            "usage" => FieldValue::text(self.usage_status.as_deref()),
            "household" => FieldValue::text(self.household.as_ref().and_then(Reference::label)),
            "owner" => FieldValue::text(self.owner.as_ref().and_then(Reference::label)),
            "registrationExpiry" => FieldValue::date(self.registration_expiry),
            "insuranceExpiry" => FieldValue::date(self.insurance_expiry),
            "expiry" => FieldValue::number(self.days_until_expiry(ctx)),
            _ => self.common_field(key),
        }
    }

    fn sort_keys() -> &'static [&'static str] {
        SORT_KEYS
    }

    fn filter_kind(key: &str) -> FilterKind {
        match key {
            "expiry" | "year" => FilterKind::Bucket,
            "createdAt" | "registrationExpiry" | "insuranceExpiry" => FilterKind::DateRange,
            _ => FilterKind::Exact,
        }
    }

    fn display_name(&self) -> String {
        self.license_plate
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    fn display_detail(&self) -> String {
        let make = [self.brand.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let kind = self.vehicle_type.as_deref().unwrap_or("vehicle");
        if make.is_empty() {
            kind.to_string()
        } else {
            format!("{kind}  {make}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn expiry_counts_days_from_reference_date() {
        let v: Vehicle = serde_json::from_str(
            r#"{"_id":"v1","licensePlate":"51A-123.45","registrationExpiry":"2024-01-31"}"#,
        )
        .unwrap();
        let ctx = FieldContext {
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        assert_eq!(v.field("expiry", &ctx), FieldValue::Number(30));
        assert_eq!(Vehicle::filter_kind("expiry"), FilterKind::Bucket);
    }

    #[test]
    fn owner_label_is_searchable() {
        let v: Vehicle = serde_json::from_str(
            r#"{"_id":"v1","licensePlate":"30F-999.99","owner":{"_id":"r1","fullName":"Pham Hoa"}}"#,
        )
        .unwrap();
        assert_eq!(v.searchable_fields(), vec!["30F-999.99", "Pham Hoa"]);
    }

    #[test]
    fn detail_falls_back_to_generic_kind() {
        let v: Vehicle = serde_json::from_str(r#"{"_id":"v1","brand":"Honda"}"#).unwrap();
        assert_eq!(v.display_detail(), "vehicle  Honda");
        assert_eq!(v.display_name(), "v1");
    }
}
