//! End-to-end flows through the reducer with a synchronous in-memory worker.

use std::collections::VecDeque;

use aptdesk::api::InMemoryApi;
use aptdesk::app::{
    handle_event, Action, BulkAction, Event, ListState, NotificationKind, Restored,
    ScreenSettings, SortDirection, SortSpec, ViewPhase,
};
use aptdesk::domain::{EntityId, EntityKind, Household, Vehicle};
use aptdesk::worker::ApiWorker;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn households() -> InMemoryApi {
    InMemoryApi::new().with_records(
        EntityKind::Household,
        vec![
            json!({"_id": "1", "apartmentNumber": "A-101", "building": "A", "active": true}),
            json!({"_id": "2", "apartmentNumber": "B-201", "building": "B", "active": false}),
            json!({"_id": "3", "apartmentNumber": "A-102", "building": "A", "active": true}),
        ],
    )
}

/// Runs worker messages inline until the reducer stops producing them.
/// Returns every non-worker action in order.
fn drive<E: aptdesk::Entity>(
    state: &mut ListState<E>,
    worker: &ApiWorker<InMemoryApi>,
    event: Event,
) -> Vec<Action> {
    let mut side_effects = Vec::new();
    let mut events = VecDeque::from([event]);
    while let Some(event) = events.pop_front() {
        let (_, actions) = handle_event(state, event).unwrap();
        for action in actions {
            match action {
                Action::PostToWorker(message) => {
                    events.push_back(Event::Worker(worker.handle_message(message)));
                }
                other => side_effects.push(other),
            }
        }
    }
    side_effects
}

fn mounted<E: aptdesk::Entity>(worker: &ApiWorker<InMemoryApi>) -> ListState<E> {
    let mut state = ListState::new(ScreenSettings::default());
    drive(
        &mut state,
        worker,
        Event::Mount {
            now: t0(),
            restored: Restored::default(),
        },
    );
    assert_eq!(state.phase, ViewPhase::Ready);
    state
}

fn ids<E: aptdesk::Entity>(items: &[E]) -> Vec<String> {
    items.iter().map(|e| e.id().to_string()).collect()
}

#[test]
fn building_filter_sorted_by_id_pages_one_at_a_time() {
    let worker = ApiWorker::new(households());
    let mut state: ListState<Household> = mounted(&worker);

    drive(
        &mut state,
        &worker,
        Event::SetFilter {
            key: "building".into(),
            value: "A".into(),
        },
    );
    drive(
        &mut state,
        &worker,
        Event::SetSort(SortSpec::new("id", SortDirection::Asc)),
    );
    assert_eq!(ids(&state.view), ["1", "3"]);

    drive(&mut state, &worker, Event::SetPageSize(1));
    drive(&mut state, &worker, Event::SetPage(2));
    let page = state.current_page();
    assert_eq!(ids(&page.items), ["3"]);
    assert_eq!(page.total_pages, 2);
}

#[test]
fn out_of_range_page_is_clamped() {
    let records = (1..=25)
        .map(|i| json!({"_id": format!("{i:02}"), "apartmentNumber": format!("A-{i:03}")}))
        .collect();
    let worker =
        ApiWorker::new(InMemoryApi::new().with_records(EntityKind::Household, records));
    let mut state: ListState<Household> = mounted(&worker);

    drive(&mut state, &worker, Event::SetPageSize(10));
    drive(&mut state, &worker, Event::SetPage(10));
    assert_eq!(state.page, 3);
    assert_eq!(state.current_page().items.len(), 5);
}

#[test]
fn selection_survives_filters_that_hide_it() {
    let worker = ApiWorker::new(households());
    let mut state: ListState<Household> = mounted(&worker);
    let building = |value: &str| Event::SetFilter {
        key: "building".into(),
        value: value.into(),
    };

    drive(&mut state, &worker, building("A"));
    drive(&mut state, &worker, Event::ToggleSelection(EntityId::from("1")));

    drive(&mut state, &worker, building("B"));
    assert_eq!(ids(&state.source), ["2"]);
    assert!(state.selection.contains(&EntityId::from("1")));

    drive(&mut state, &worker, building("A"));
    assert_eq!(state.selection.sorted_ids(), vec![EntityId::from("1")]);

    drive(&mut state, &worker, Event::ClearFilters);
    assert_eq!(state.selection.len(), 1);
    assert_eq!(state.source.len(), 3);
}

#[test]
fn select_all_twice_round_trips() {
    let worker = ApiWorker::new(households());
    let mut state: ListState<Household> = mounted(&worker);

    drive(&mut state, &worker, Event::SelectAll);
    assert!(state.selection.is_all_selected(state.view.iter().map(|h| &h.id)));
    assert_eq!(state.selection.len(), 3);

    drive(&mut state, &worker, Event::SelectAll);
    assert!(state.selection.is_empty());
}

#[test]
fn partial_bulk_failure_keeps_only_failed_ids_selected() {
    let api = households();
    api.fail_id("2", "household has open invoices");
    let worker = ApiWorker::new(api);
    let mut state: ListState<Household> = mounted(&worker);

    drive(&mut state, &worker, Event::SelectAll);
    let effects = drive(
        &mut state,
        &worker,
        Event::RunBulk {
            action: BulkAction::Activate,
            confirmation: None,
        },
    );

    assert_eq!(state.phase, ViewPhase::Ready);
    assert_eq!(state.selection.sorted_ids(), vec![EntityId::from("2")]);

    let messages: Vec<_> = state.notifications.items().iter().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, NotificationKind::Warning);
    assert!(effects
        .iter()
        .any(|a| matches!(a, Action::RecordActivity { .. })));
}

#[test]
fn delete_without_confirmation_changes_nothing() {
    let worker = ApiWorker::new(households());
    let mut state: ListState<Household> = mounted(&worker);

    drive(&mut state, &worker, Event::ToggleSelection(EntityId::from("1")));
    drive(
        &mut state,
        &worker,
        Event::RunBulk {
            action: BulkAction::Delete,
            confirmation: None,
        },
    );

    assert_eq!(state.source.len(), 3);
    assert_eq!(state.phase, ViewPhase::Ready);
    assert!(worker.client().calls().iter().all(|c| !c.contains("delete")));
}

#[test]
fn vehicle_expiry_bucket_uses_screen_clock() {
    let api = InMemoryApi::new().with_records(
        EntityKind::Vehicle,
        vec![
            json!({"_id": "v1", "licensePlate": "AB-123", "registrationExpiry": "2024-02-20"}),
            json!({"_id": "v2", "licensePlate": "CD-456", "registrationExpiry": "2024-03-20"}),
            json!({"_id": "v3", "licensePlate": "EF-789", "registrationExpiry": "2024-09-01"}),
        ],
    );
    let worker = ApiWorker::new(api);
    let mut state: ListState<Vehicle> = mounted(&worker);

    drive(
        &mut state,
        &worker,
        Event::SetFilter {
            key: "expiry".into(),
            value: "within30".into(),
        },
    );
    assert_eq!(ids(&state.view), ["v2"]);

    drive(
        &mut state,
        &worker,
        Event::SetFilter {
            key: "expiry".into(),
            value: "expired".into(),
        },
    );
    assert_eq!(ids(&state.view), ["v1"]);
}
