//! Filter-sort engine: pure derivation of the visible view.
//!
//! [`derive_view`] takes the cached source collection, the active
//! [`FilterSpec`], the committed search term and a [`SortSpec`] and returns a
//! fresh, ordered `Vec`. It never mutates the source, never performs I/O and
//! returns the same output for the same inputs, which is what lets the reducer
//! call it after every state change.
//!
//! # Filter values
//!
//! Raw filter input is parsed against the entity's [`FilterKind`] for the key:
//!
//! | Kind        | Accepted input                                         |
//! |-------------|--------------------------------------------------------|
//! | `Exact`     | any text, compared verbatim                            |
//! | `Bucket`    | `3`, `2-3`, `6+`, `under18`, `over50`, `within30`, `expired` |
//! | `DateRange` | `2024-01-01..2024-03-31`, either side may be empty     |
//!
//! `all` (or an empty value) removes the constraint and `unspecified` matches
//! only entities that lack the field.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{
    parse_datetime, AptdeskError, Entity, FieldContext, FieldValue, FilterKind, Result,
};

/// Accepted value for one filter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterValue {
    /// No constraint.
    All,
    /// Matches entities whose field is absent.
    Unspecified,
    /// Field text equals the value.
    Exact(String),
    /// Numeric field within inclusive bounds; `None` is unbounded.
    Bucket {
        label: String,
        min: Option<i64>,
        max: Option<i64>,
    },
    /// Date field within inclusive bounds; `None` is unbounded.
    Range {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl FilterValue {
    /// Parses raw filter input for a key of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Validation`] for unparseable buckets, dates, or a
    /// date range whose start lies after its end.
    ///
    /// # Examples
    ///
    /// ```
    /// use aptdesk::app::filter::FilterValue;
    /// use aptdesk::domain::FilterKind;
    ///
    /// let bucket = FilterValue::parse(FilterKind::Bucket, "2-3").unwrap();
    /// assert!(matches!(bucket, FilterValue::Bucket { min: Some(2), max: Some(3), .. }));
    /// assert_eq!(FilterValue::parse(FilterKind::Exact, "all").unwrap(), FilterValue::All);
    /// assert!(FilterValue::parse(FilterKind::Bucket, "lots").is_err());
    /// ```
    pub fn parse(kind: FilterKind, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if raw.eq_ignore_ascii_case("unspecified") {
            return Ok(Self::Unspecified);
        }

        match kind {
            FilterKind::Exact => Ok(Self::Exact(raw.to_string())),
            FilterKind::Bucket => parse_bucket(raw),
            FilterKind::DateRange => parse_range(raw),
        }
    }

    /// Returns `true` when the value imposes no constraint.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether a field value satisfies this filter.
    #[must_use]
    pub fn matches(&self, field: &FieldValue<'_>) -> bool {
        match self {
            Self::All => true,
            Self::Unspecified => field.is_missing(),
            Self::Exact(expected) => field.as_text().is_some_and(|text| text == expected.as_str()),
            Self::Bucket { min, max, .. } => match field {
                FieldValue::Number(n) => {
                    min.map_or(true, |lo| *n >= lo) && max.map_or(true, |hi| *n <= hi)
                }
                _ => false,
            },
            Self::Range { start, end } => match field {
                FieldValue::Date(d) => {
                    start.map_or(true, |lo| *d >= lo) && end.map_or(true, |hi| *d <= hi)
                }
                _ => false,
            },
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Unspecified => f.write_str("unspecified"),
            Self::Exact(value) => f.write_str(value),
            Self::Bucket { label, .. } => f.write_str(label),
            Self::Range { start, end } => {
                let day = |d: &Option<DateTime<Utc>>| {
                    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
                };
                write!(f, "{}..{}", day(start), day(end))
            }
        }
    }
}

fn invalid(what: &str, raw: &str) -> AptdeskError {
    AptdeskError::Validation(format!("invalid {what}: {raw:?}"))
}

fn parse_number(raw: &str, what: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| invalid(what, raw))
}

fn parse_bucket(raw: &str) -> Result<FilterValue> {
    let lower = raw.to_lowercase();
    let (min, max) = if lower == "expired" {
        (None, Some(-1))
    } else if let Some(n) = lower.strip_prefix("under") {
        let bound = parse_number(n, "bucket")?
            .checked_sub(1)
            .ok_or_else(|| invalid("bucket", raw))?;
        (None, Some(bound))
    } else if let Some(n) = lower.strip_prefix("over") {
        let bound = parse_number(n, "bucket")?
            .checked_add(1)
            .ok_or_else(|| invalid("bucket", raw))?;
        (Some(bound), None)
    } else if let Some(n) = lower.strip_prefix("within") {
        (Some(0), Some(parse_number(n, "bucket")?))
    } else if let Some(n) = lower.strip_suffix('+') {
        (Some(parse_number(n, "bucket")?), None)
    } else if let Some((lo, hi)) = lower.split_once('-').filter(|(lo, _)| !lo.is_empty()) {
        (Some(parse_number(lo, "bucket")?), Some(parse_number(hi, "bucket")?))
    } else {
        let n = parse_number(&lower, "bucket")?;
        (Some(n), Some(n))
    };

    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(invalid("bucket", raw));
        }
    }

    Ok(FilterValue::Bucket {
        label: raw.to_string(),
        min,
        max,
    })
}

fn parse_range(raw: &str) -> Result<FilterValue> {
    let (start_raw, end_raw) = raw
        .split_once("..")
        .or_else(|| raw.split_once(','))
        .unwrap_or((raw, ""));

    let bound = |text: &str| -> Result<Option<DateTime<Utc>>> {
        let text = text.trim();
        if text.is_empty() {
            Ok(None)
        } else {
            parse_datetime(text).map(Some).ok_or_else(|| invalid("date", text))
        }
    };

    let start = bound(start_raw)?;
    let mut end = bound(end_raw)?;

    // A bare end date covers that whole day.
    if end_raw.trim().len() == 10 {
        end = end.map(|d| d + Duration::days(1) - Duration::milliseconds(1));
    }

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid("date range", raw));
        }
    }

    Ok(FilterValue::Range { start, end })
}

/// Active filter predicates, keyed by entity field name.
///
/// Keys are AND-composed. Absent keys and [`FilterValue::All`] impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub predicates: BTreeMap<String, FilterValue>,
    /// Reference day for derived fields (age, days until expiry).
    #[serde(skip)]
    pub context: FieldContext,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a filter for `key`. `all` removes the key.
    ///
    /// # Errors
    ///
    /// Returns [`AptdeskError::Validation`] when `raw` does not parse for the
    /// key's [`FilterKind`]; the filters are left unchanged in that case.
    pub fn set<E: Entity>(&mut self, key: &str, raw: &str) -> Result<()> {
        let value = FilterValue::parse(E::filter_kind(key), raw)?;
        if value.is_all() {
            self.predicates.remove(key);
        } else {
            self.predicates.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Builder form of [`FilterSpec::set`].
    ///
    /// # Errors
    ///
    /// Same as [`FilterSpec::set`].
    pub fn with<E: Entity>(mut self, key: &str, raw: &str) -> Result<Self> {
        self.set::<E>(key, raw)?;
        Ok(self)
    }

    pub fn clear(&mut self) {
        self.predicates.clear();
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.predicates.get(key)
    }

    /// Number of keys that actually constrain the view.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.predicates.values().filter(|v| !v.is_all()).count()
    }

    /// Whether `entity` satisfies every predicate.
    #[must_use]
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.predicates
            .iter()
            .all(|(key, value)| value.matches(&entity.field(key, &self.context)))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl std::str::FromStr for SortDirection {
    type Err = AptdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(invalid("sort direction", other)),
        }
    }
}

/// Sort field plus direction. An empty or unknown field uses the entity default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Orders two field values, treating `Missing` as the zero value of the other side.
fn compare_fields(a: &FieldValue<'_>, b: &FieldValue<'_>) -> Ordering {
    use FieldValue::{Bool, Date, Missing, Number, Text};

    match (a, b) {
        (Missing, Missing) => Ordering::Equal,
        (Text(x), Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Number(x), Number(y)) => x.cmp(y),
        (Date(x), Date(y)) => x.cmp(y),
        (Bool(x), Bool(y)) => x.cmp(y),
        (Missing, other) => compare_fields(&zero_like(other), other),
        (other, Missing) => compare_fields(other, &zero_like(other)),
        (x, y) => {
            let left = x.as_text().unwrap_or_default().to_lowercase();
            let right = y.as_text().unwrap_or_default().to_lowercase();
            left.cmp(&right)
        }
    }
}

fn zero_like(value: &FieldValue<'_>) -> FieldValue<'static> {
    match value {
        FieldValue::Number(_) => FieldValue::Number(0),
        FieldValue::Date(_) => FieldValue::Date(DateTime::<Utc>::default()),
        FieldValue::Bool(_) => FieldValue::Bool(false),
        FieldValue::Text(_) | FieldValue::Missing => FieldValue::Text("".into()),
    }
}

/// Case-insensitive substring match over the entity's searchable fields.
fn matches_search<E: Entity>(entity: &E, term: &str) -> bool {
    term.is_empty()
        || entity
            .searchable_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(term))
}

/// Derives the ordered, filtered view of `source`.
///
/// Applies search, then the AND-composed filters, then a stable sort. The
/// source slice is never touched; a new `Vec` is returned every call.
///
/// # Parameters
///
/// * `source` - Cached collection as last fetched
/// * `filters` - Active predicates (and the reference day for derived fields)
/// * `search` - Committed search term; whitespace-only counts as empty
/// * `sort` - Sort field and direction; unknown fields use `E::DEFAULT_SORT`
///
/// # Examples
///
/// ```
/// use aptdesk::app::filter::{derive_view, FilterSpec, SortDirection, SortSpec};
/// use aptdesk::domain::Household;
///
/// let source: Vec<Household> = serde_json::from_str(
///     r#"[{"_id":"1","building":"A"},{"_id":"2","building":"B"},{"_id":"3","building":"A"}]"#,
/// ).unwrap();
/// let filters = FilterSpec::new().with::<Household>("building", "A").unwrap();
/// let view = derive_view(&source, &filters, "", &SortSpec::new("id", SortDirection::Asc));
/// let ids: Vec<_> = view.iter().map(|h| h.id.as_str()).collect();
/// assert_eq!(ids, ["1", "3"]);
/// ```
#[must_use]
pub fn derive_view<E: Entity>(
    source: &[E],
    filters: &FilterSpec,
    search: &str,
    sort: &SortSpec,
) -> Vec<E> {
    let _span = tracing::debug_span!(
        "derive_view",
        kind = %E::KIND,
        source_len = source.len(),
        filters = filters.active_count(),
        search_len = search.len(),
    )
    .entered();

    let term = search.trim().to_lowercase();
    let mut view: Vec<E> = source
        .iter()
        .filter(|entity| matches_search(*entity, &term))
        .filter(|entity| filters.matches(*entity))
        .cloned()
        .collect();

    let key = E::resolve_sort_key(&sort.field);
    let ctx = filters.context;
    view.sort_by(|a, b| {
        let ordering = compare_fields(&a.field(key, &ctx), &b.field(key, &ctx));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    tracing::debug!(view_len = view.len(), sort_key = key, "view derived");
    view
}

/// Counts shown in the statistics panel for the current view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Count per value of `E::GROUP_KEY`; absent values are grouped as `unspecified`.
    pub groups: BTreeMap<String, usize>,
}

impl ViewStats {
    #[must_use]
    pub fn compute<E: Entity>(view: &[E], ctx: &FieldContext) -> Self {
        let mut stats = Self {
            total: view.len(),
            ..Self::default()
        };
        for entity in view {
            if entity.is_active() {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            let group = entity
                .field(E::GROUP_KEY, ctx)
                .as_text()
                .map_or_else(|| "unspecified".to_string(), |g| g.into_owned());
            *stats.groups.entry(group).or_insert(0) += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Household, Resident};
    use chrono::NaiveDate;

    fn households(json: &str) -> Vec<Household> {
        serde_json::from_str(json).unwrap()
    }

    fn ids(view: &[Household]) -> Vec<&str> {
        view.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let source = households(
            r#"[{"_id":"1","ownerName":"Tran Van An"},{"_id":"2","ownerName":"Le Thi Binh"}]"#,
        );
        let view = derive_view(&source, &FilterSpec::new(), "  BINH ", &SortSpec::default());
        assert_eq!(ids(&view), ["2"]);

        let everything = derive_view(&source, &FilterSpec::new(), "   ", &SortSpec::default());
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn filters_are_and_composed() {
        let source = households(
            r#"[{"_id":"1","building":"A","floor":1},
                {"_id":"2","building":"A","floor":2},
                {"_id":"3","building":"B","floor":1}]"#,
        );
        let filters = FilterSpec::new()
            .with::<Household>("building", "A")
            .unwrap()
            .with::<Household>("floor", "1")
            .unwrap();
        let view = derive_view(&source, &filters, "", &SortSpec::default());
        assert_eq!(ids(&view), ["1"]);
    }

    #[test]
    fn missing_fields_only_match_unspecified() {
        let source = households(r#"[{"_id":"1","building":"A"},{"_id":"2"}]"#);
        let a = FilterSpec::new().with::<Household>("building", "A").unwrap();
        assert_eq!(ids(&derive_view(&source, &a, "", &SortSpec::default())), ["1"]);

        let none = FilterSpec::new()
            .with::<Household>("building", "unspecified")
            .unwrap();
        assert_eq!(ids(&derive_view(&source, &none, "", &SortSpec::default())), ["2"]);
    }

    #[test]
    fn resident_count_buckets_are_inclusive() {
        let source = households(
            r#"[{"_id":"1","residents":[1]},
                {"_id":"2","residents":[1,2]},
                {"_id":"3","residents":[1,2,3]},
                {"_id":"4","residents":[1,2,3,4,5,6,7]}]"#,
        );
        let two_three = FilterSpec::new().with::<Household>("residents", "2-3").unwrap();
        let sort = SortSpec::new("id", SortDirection::Asc);
        assert_eq!(ids(&derive_view(&source, &two_three, "", &sort)), ["2", "3"]);

        let six_plus = FilterSpec::new().with::<Household>("residents", "6+").unwrap();
        assert_eq!(ids(&derive_view(&source, &six_plus, "", &sort)), ["4"]);
    }

    #[test]
    fn date_range_end_covers_whole_day() {
        let source = households(
            r#"[{"_id":"1","createdAt":"2024-01-31T18:00:00Z"},
                {"_id":"2","createdAt":"2024-02-01T00:00:00Z"}]"#,
        );
        let filters = FilterSpec::new()
            .with::<Household>("createdAt", "2024-01-01..2024-01-31")
            .unwrap();
        assert_eq!(ids(&derive_view(&source, &filters, "", &SortSpec::default())), ["1"]);
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let mut filters = FilterSpec::new();
        let err = filters
            .set::<Household>("createdAt", "2024-03-01..2024-01-01")
            .unwrap_err();
        assert!(err.is_validation());
        assert!(filters.predicates.is_empty());
    }

    #[test]
    fn bucket_bounds_at_integer_limits_are_rejected() {
        for raw in ["over9223372036854775807", "under-9223372036854775808"] {
            let err = FilterValue::parse(FilterKind::Bucket, raw).unwrap_err();
            assert!(err.is_validation(), "{raw}");
        }

        let mut filters = FilterSpec::new();
        assert!(filters
            .set::<Household>("residents", "over9223372036854775807")
            .is_err());
        assert!(filters.predicates.is_empty());
    }

    #[test]
    fn age_buckets_use_reference_day() {
        let source: Vec<Resident> = serde_json::from_str(
            r#"[{"_id":"r1","dateOfBirth":"2010-05-01"},
                {"_id":"r2","dateOfBirth":"1990-05-01"},
                {"_id":"r3","dateOfBirth":"1960-05-01"},
                {"_id":"r4"}]"#,
        )
        .unwrap();
        let mut filters = FilterSpec::new().with::<Resident>("age", "under18").unwrap();
        filters.context.as_of = NaiveDate::from_ymd_opt(2024, 6, 1);
        let view = derive_view(&source, &filters, "", &SortSpec::default());
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id.as_str(), "r1");

        filters.set::<Resident>("age", "over50").unwrap();
        let view = derive_view(&source, &filters, "", &SortSpec::default());
        assert_eq!(view[0].id.as_str(), "r3");
    }

    #[test]
    fn sort_is_stable_and_missing_sorts_as_zero() {
        let source = households(
            r#"[{"_id":"1","building":"B"},
                {"_id":"2"},
                {"_id":"3","building":"a"},
                {"_id":"4","building":"B"}]"#,
        );
        let asc = derive_view(&source, &FilterSpec::new(), "", &SortSpec::new("building", SortDirection::Asc));
        assert_eq!(ids(&asc), ["2", "3", "1", "4"]);

        let desc = derive_view(&source, &FilterSpec::new(), "", &SortSpec::new("building", SortDirection::Desc));
        assert_eq!(ids(&desc), ["1", "4", "3", "2"]);
    }

    #[test]
    fn unknown_sort_field_uses_default() {
        let source = households(
            r#"[{"_id":"1","apartmentNumber":"B-2"},{"_id":"2","apartmentNumber":"A-1"}]"#,
        );
        let view = derive_view(&source, &FilterSpec::new(), "", &SortSpec::new("bogus", SortDirection::Asc));
        assert_eq!(ids(&view), ["2", "1"]);
    }

    #[test]
    fn derivation_leaves_source_untouched() {
        let source = households(r#"[{"_id":"2"},{"_id":"1"}]"#);
        let before = source.clone();
        let sort = SortSpec::new("id", SortDirection::Asc);
        let first = derive_view(&source, &FilterSpec::new(), "", &sort);
        let second = derive_view(&source, &FilterSpec::new(), "", &sort);
        assert_eq!(source, before);
        assert_eq!(first, second);
    }

    #[test]
    fn stats_group_by_building() {
        let source = households(
            r#"[{"_id":"1","building":"A"},{"_id":"2","building":"A","active":false},{"_id":"3"}]"#,
        );
        let stats = ViewStats::compute(&source, &FieldContext::default());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.groups.get("A"), Some(&2));
        assert_eq!(stats.groups.get("unspecified"), Some(&1));
    }

    #[test]
    fn bucket_labels_parse() {
        let parse = |raw| FilterValue::parse(FilterKind::Bucket, raw).unwrap();
        assert!(matches!(parse("under18"), FilterValue::Bucket { min: None, max: Some(17), .. }));
        assert!(matches!(parse("over50"), FilterValue::Bucket { min: Some(51), max: None, .. }));
        assert!(matches!(parse("within30"), FilterValue::Bucket { min: Some(0), max: Some(30), .. }));
        assert!(matches!(parse("expired"), FilterValue::Bucket { min: None, max: Some(-1), .. }));
        assert!(matches!(parse("1"), FilterValue::Bucket { min: Some(1), max: Some(1), .. }));
        assert!(FilterValue::parse(FilterKind::Bucket, "5-2").is_err());
    }
}
