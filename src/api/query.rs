//! Query parameters forwarded on list fetches.
//!
//! The server narrows the collection by a few exact-match keys and by creation
//! date. Forwarding them keeps payloads small; the client still re-applies
//! every filter locally, so a server that ignores a parameter changes nothing.

use crate::app::filter::{FilterSpec, FilterValue};

/// Filter keys the list endpoints understand as exact-match parameters.
const FORWARDED_KEYS: &[&str] = &["building", "floor", "status", "gender", "vehicleType"];

/// Ordered `key=value` pairs for `GET /api/{kind}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    params: Vec<(String, String)>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the server query for the active filters.
    ///
    /// # Examples
    ///
    /// ```
    /// use aptdesk::api::ListQuery;
    /// use aptdesk::app::filter::FilterSpec;
    /// use aptdesk::domain::Household;
    ///
    /// let filters = FilterSpec::new()
    ///     .with::<Household>("building", "A").unwrap()
    ///     .with::<Household>("createdAt", "2024-01-01..2024-01-31").unwrap()
    ///     .with::<Household>("residents", "2-3").unwrap();
    /// let query = ListQuery::from_filters(&filters);
    /// assert_eq!(
    ///     query.pairs(),
    ///     &[
    ///         ("building".to_string(), "A".to_string()),
    ///         ("startDate".to_string(), "2024-01-01".to_string()),
    ///         ("endDate".to_string(), "2024-01-31".to_string()),
    ///     ]
    /// );
    /// ```
    #[must_use]
    pub fn from_filters(filters: &FilterSpec) -> Self {
        let mut query = Self::new();
        for (key, value) in &filters.predicates {
            match value {
                FilterValue::Exact(text) if FORWARDED_KEYS.contains(&key.as_str()) => {
                    query.push(key, text);
                }
                FilterValue::Range { start, end } if key == "createdAt" => {
                    if let Some(start) = start {
                        query.push("startDate", start.format("%Y-%m-%d").to_string());
                    }
                    if let Some(end) = end {
                        query.push("endDate", end.format("%Y-%m-%d").to_string());
                    }
                }
                _ => {}
            }
        }
        query
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.push((key.into(), value.into()));
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Value of the first pair named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Resident;

    #[test]
    fn status_and_gender_are_forwarded() {
        let filters = FilterSpec::new()
            .with::<Resident>("status", "inactive")
            .unwrap()
            .with::<Resident>("gender", "female")
            .unwrap()
            .with::<Resident>("fullName", "Le Minh")
            .unwrap();
        let query = ListQuery::from_filters(&filters);
        assert_eq!(query.get("status"), Some("inactive"));
        assert_eq!(query.get("gender"), Some("female"));
        assert_eq!(query.get("fullName"), None);
    }

    #[test]
    fn unspecified_values_stay_local() {
        let filters = FilterSpec::new()
            .with::<Resident>("gender", "unspecified")
            .unwrap();
        assert!(ListQuery::from_filters(&filters).is_empty());
    }
}
