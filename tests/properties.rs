//! Property tests for the pure list transforms.

use aptdesk::app::{
    derive_view, paginate, FilterSpec, NotificationKind, NotificationQueue, SelectionSet,
    SortDirection, SortSpec,
};
use aptdesk::domain::{EntityId, Household};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;

fn household(id: usize, building: &str, floor: u8) -> Household {
    serde_json::from_value(json!({
        "_id": format!("h{id}"),
        "apartmentNumber": format!("{building}-{floor}{id:02}"),
        "building": building,
        "floor": floor,
    }))
    .unwrap()
}

fn source_strategy() -> impl Strategy<Value = Vec<Household>> {
    prop::collection::vec((prop::sample::select(vec!["A", "B", "C"]), 0u8..10), 0..40).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (building, floor))| household(i, building, floor))
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn pages_partition_the_view(len in 0usize..200, page_size in 1usize..50, page in 0usize..20) {
        let view: Vec<usize> = (0..len).collect();
        let slice = paginate(&view, page, page_size);

        prop_assert!(slice.clamped_page >= 1);
        prop_assert!(slice.clamped_page <= slice.total_pages);
        prop_assert!(slice.items.len() <= page_size);

        let mut all = Vec::new();
        for p in 1..=slice.total_pages {
            all.extend(paginate(&view, p, page_size).items);
        }
        prop_assert_eq!(all, view);
    }

    #[test]
    fn filtered_view_is_an_ordered_subset(source in source_strategy(), desc in any::<bool>()) {
        let filters = FilterSpec::new().with::<Household>("building", "A").unwrap();
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        let view = derive_view(&source, &filters, "", &SortSpec::new("floor", direction));

        prop_assert!(view.iter().all(|h| h.building.as_deref() == Some("A")));
        prop_assert_eq!(
            view.len(),
            source.iter().filter(|h| h.building.as_deref() == Some("A")).count()
        );

        let floors: Vec<i64> = view
            .iter()
            .map(|h| h.floor.as_deref().unwrap_or("0").parse().unwrap())
            .collect();
        let sorted = floors.windows(2).all(|w| if desc { w[0] >= w[1] } else { w[0] <= w[1] });
        prop_assert!(sorted);
    }

    #[test]
    fn empty_search_and_filters_keep_everything(source in source_strategy()) {
        let view = derive_view(&source, &FilterSpec::new(), "   ", &SortSpec::default());
        prop_assert_eq!(view.len(), source.len());
    }

    #[test]
    fn select_all_is_an_involution(
        filtered in prop::collection::hash_set(0u16..100, 1..30),
        outside in prop::collection::hash_set(100u16..200, 0..10),
    ) {
        let filtered: Vec<EntityId> = filtered.iter().map(|i| EntityId::new(i.to_string())).collect();
        let mut selection = SelectionSet::new();
        for id in &outside {
            selection.toggle(&EntityId::new(id.to_string()));
        }

        selection.select_all(&filtered);
        prop_assert!(selection.is_all_selected(&filtered));
        selection.select_all(&filtered);
        prop_assert_eq!(selection.len(), outside.len());
    }

    #[test]
    fn nothing_outlives_its_ttl(ttls in prop::collection::vec(1u64..10_000, 0..20), wait in 0i64..12_000) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut queue = NotificationQueue::new();
        for ttl in &ttls {
            queue.push("saved", NotificationKind::Success, start, *ttl);
        }

        let now = start + Duration::milliseconds(wait);
        queue.expire(now);
        prop_assert!(queue.items().iter().all(|n| !n.is_expired(now)));
        prop_assert_eq!(
            queue.len(),
            ttls.iter().filter(|ttl| i64::try_from(**ttl).unwrap() > wait).count()
        );
    }
}
