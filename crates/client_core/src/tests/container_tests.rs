use std::{sync::atomic::Ordering, time::Duration};

use super::*;
use shared::{
    domain::RecordId,
    error::FilterError,
    protocol::{CaseFilterDelta, ContactFilterDelta, EntityFilter},
};

use crate::{
    strategy::{CaseStrategy, ContactStrategy, EmailStrategy},
    support::{record, FakeDefinitions, FakeRecords, TOTAL_RECORDS},
    MissingRecordService,
};

struct Harness {
    definitions: Arc<FakeDefinitions>,
    records: Arc<FakeRecords>,
    cache: Arc<DefinitionCache>,
}

impl Harness {
    fn new() -> Self {
        Self {
            definitions: Arc::new(FakeDefinitions::default()),
            records: Arc::new(FakeRecords::default()),
            cache: Arc::new(DefinitionCache::new()),
        }
    }

    fn container<S: EntityStrategy>(&self, strategy: S) -> Arc<RecordContainer<S>> {
        RecordContainer::new(
            strategy,
            self.definitions.clone(),
            self.cache.clone(),
            ContainerConfig::default(),
        )
    }

    fn contacts(&self) -> Arc<RecordContainer<ContactStrategy>> {
        self.container(ContactStrategy::new(self.records.clone()))
    }

    fn cases(&self) -> Arc<RecordContainer<CaseStrategy>> {
        self.container(CaseStrategy::new(self.records.clone()))
    }

    fn emails(&self) -> Arc<RecordContainer<EmailStrategy>> {
        self.container(EmailStrategy::new(self.records.clone()))
    }
}

fn names(snapshot: &ContainerSnapshot) -> Vec<String> {
    snapshot
        .records
        .iter()
        .filter_map(|record| record.str_field("Name").map(str::to_string))
        .collect()
}

#[tokio::test]
async fn initialize_seeds_filters_and_loads_first_page() {
    let harness = Harness::new();
    let container = harness.contacts();
    assert_eq!(container.phase().await, ContainerPhase::Uninitialized);

    let outcome = container.initialize().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Applied);
    assert_eq!(container.phase().await, ContainerPhase::Ready);

    let payload = harness.records.last_payload();
    assert_eq!(payload.general_filter.order_by_field, "Name");
    assert_eq!(payload.general_filter.direction, "ASC");
    assert_eq!(payload.general_filter.record_limit, 10);
    assert!(payload
        .entity_filters
        .contains_key(&FilterName::ContactFilter));

    let snapshot = container.snapshot().await;
    assert_eq!(snapshot.total_record_count, TOTAL_RECORDS);
    assert_eq!(snapshot.record_limit, 10);
    assert_eq!(snapshot.current_page, 1);
    assert!(!snapshot.is_loading);
    assert_eq!(names(&snapshot), ["all-0-0", "all-0-1"]);
    let limits: Vec<u32> = snapshot
        .record_limit_options
        .iter()
        .map(|option| option.value)
        .collect();
    assert_eq!(limits, [10, 25, 50]);
    assert_eq!(snapshot.paginator().total_pages(), 10);
}

#[tokio::test]
async fn initialize_broadcasts_loading_around_the_update() {
    let harness = Harness::new();
    let container = harness.contacts();
    let mut events = container.subscribe_events();

    container.initialize().await.unwrap();

    assert!(matches!(
        events.recv().await.unwrap(),
        ContainerEvent::LoadingChanged(true)
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        ContainerEvent::RecordsUpdated(_)
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        ContainerEvent::LoadingChanged(false)
    ));
}

#[tokio::test]
async fn recency_sorted_container_defaults_to_newest_first() {
    let harness = Harness::new();
    let container = harness.emails();
    container.initialize().await.unwrap();

    let general = container.general_filter().await.unwrap();
    assert_eq!(general.order_by_field, "CreatedDate");
    assert_eq!(general.direction, "DESC");
}

#[tokio::test]
async fn sort_change_toggles_and_switches_columns() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    container.on_page_turn(3).await.unwrap();

    container.on_sort_change(0).await.unwrap();
    let general = harness.records.last_payload().general_filter;
    assert_eq!((general.order_by_field.as_str(), general.direction.as_str()), ("Name", "DESC"));
    assert_eq!(general.record_offset, 2);

    container.on_sort_change(1).await.unwrap();
    let general = harness.records.last_payload().general_filter;
    assert_eq!(general.order_by_field, "Provider_Title__c");
    assert_eq!(general.direction, "ASC");

    let err = container.on_sort_change(42).await.unwrap_err();
    assert!(matches!(err, ContainerError::UnknownColumn { index: 42, .. }));
}

#[tokio::test]
async fn page_turn_sets_zero_based_offset() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();

    container.on_page_turn(3).await.unwrap();

    assert_eq!(harness.records.last_payload().general_filter.record_offset, 2);
    let snapshot = container.snapshot().await;
    assert_eq!(snapshot.current_page, 3);
    assert_eq!(names(&snapshot), ["all-2-0", "all-2-1"]);
}

#[tokio::test]
async fn general_change_does_not_reset_the_page() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    container.on_page_turn(4).await.unwrap();

    container
        .on_general_filter_change(GeneralFilterDelta {
            search_text: Some(Some("clinic".to_string())),
            ..GeneralFilterDelta::default()
        })
        .await
        .unwrap();

    let general = harness.records.last_payload().general_filter;
    assert_eq!(general.search_text.as_deref(), Some("clinic"));
    assert_eq!(general.record_offset, 3);
}

#[tokio::test]
async fn record_limit_change_starts_a_fresh_browse() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    container
        .on_general_filter_change(GeneralFilterDelta::search("clinic"))
        .await
        .unwrap();
    container.on_sort_change(0).await.unwrap();
    container.on_page_turn(2).await.unwrap();

    container.on_record_limit_change(25).await.unwrap();

    let general = harness.records.last_payload().general_filter;
    assert_eq!(general.record_limit, 25);
    assert_eq!(general.search_text, None);
    assert_eq!(general.record_offset, 0);
    assert_eq!(general.order_by_field, "Name");
    assert_eq!(general.direction, "ASC");

    let err = container.on_record_limit_change(0).await.unwrap_err();
    assert!(matches!(err, ContainerError::InvalidRecordLimit));
}

#[tokio::test]
async fn unique_filter_change_returns_to_first_page() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    container
        .on_general_filter_change(GeneralFilterDelta::search("clinic"))
        .await
        .unwrap();
    container.on_page_turn(4).await.unwrap();

    container
        .on_specific_filter_change(
            FilterName::ContactFilter,
            EntityFilterDelta::Contact(ContactFilterDelta {
                title: Some(Some("MD".to_string())),
                ..ContactFilterDelta::default()
            }),
        )
        .await
        .unwrap();

    let payload = harness.records.last_payload();
    assert_eq!(payload.general_filter.record_offset, 0);
    assert_eq!(payload.general_filter.search_text.as_deref(), Some("clinic"));
    let Some(EntityFilter::Contact(contact)) = payload.entity_filters.get(&FilterName::ContactFilter)
    else {
        panic!("contact filter missing from payload");
    };
    assert_eq!(contact.title.as_deref(), Some("MD"));
}

#[tokio::test]
async fn mismatched_delta_is_rejected_without_a_query() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    let sent = harness.records.queries().len();

    let err = container
        .on_specific_filter_change(
            FilterName::ContactFilter,
            EntityFilterDelta::Case(CaseFilterDelta::default()),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ContainerError::Filter(FilterError::KindMismatch { .. })
    ));
    assert_eq!(harness.records.queries().len(), sent);
}

#[tokio::test(start_paused = true)]
async fn stale_response_is_discarded() {
    let harness = Harness::new();
    harness
        .records
        .delay_search("slow", Duration::from_millis(100));
    let container = harness.contacts();
    container.initialize().await.unwrap();

    let (slow, fast) = tokio::join!(
        container.on_general_filter_change(GeneralFilterDelta::search("slow")),
        container.on_general_filter_change(GeneralFilterDelta::search("fast")),
    );

    assert_eq!(fast.unwrap(), FetchOutcome::Applied);
    assert_eq!(slow.unwrap(), FetchOutcome::Stale);
    let snapshot = container.snapshot().await;
    assert_eq!(names(&snapshot), ["fast-0-0", "fast-0-1"]);
    assert!(!snapshot.is_loading);
}

#[tokio::test(start_paused = true)]
async fn failed_newer_query_blocks_older_response() {
    let harness = Harness::new();
    harness
        .records
        .delay_search("older", Duration::from_millis(100));
    harness.records.fail_search("newer");
    let container = harness.contacts();
    container.initialize().await.unwrap();

    let (older, newer) = tokio::join!(
        container.on_general_filter_change(GeneralFilterDelta::search("older")),
        container.on_general_filter_change(GeneralFilterDelta::search("newer")),
    );

    assert_eq!(newer.unwrap(), FetchOutcome::Failed);
    assert_eq!(older.unwrap(), FetchOutcome::Stale);
    let snapshot = container.snapshot().await;
    assert_eq!(names(&snapshot), ["all-0-0", "all-0-1"]);
    assert!(!snapshot.is_loading);
    let general = container.general_filter().await.unwrap();
    assert_eq!(general.search_text.as_deref(), Some("newer"));
}

#[tokio::test]
async fn single_character_search_never_reaches_the_service() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    let sent = harness.records.queries().len();

    let outcome = container
        .on_general_filter_change(GeneralFilterDelta::search("a"))
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Skipped);

    let outcome = container
        .on_specific_filter_change(
            FilterName::ContactFilter,
            EntityFilterDelta::Contact(ContactFilterDelta {
                county: Some(Some("K".to_string())),
                ..ContactFilterDelta::default()
            }),
        )
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Skipped);

    assert_eq!(harness.records.queries().len(), sent);
    assert_eq!(container.general_filter().await.unwrap().search_text, None);

    let outcome = container
        .on_general_filter_change(GeneralFilterDelta::search("ab"))
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Applied);
}

#[tokio::test(start_paused = true)]
async fn loading_stays_set_until_the_latest_query_returns() {
    let harness = Harness::new();
    harness
        .records
        .delay_search("older", Duration::from_millis(50));
    harness
        .records
        .delay_search("newer", Duration::from_millis(100));
    let container = harness.contacts();
    container.initialize().await.unwrap();

    let (older, newer, loading_between) = tokio::join!(
        container.on_general_filter_change(GeneralFilterDelta::search("older")),
        container.on_general_filter_change(GeneralFilterDelta::search("newer")),
        async {
            tokio::time::sleep(Duration::from_millis(75)).await;
            container.snapshot().await
        },
    );

    assert_eq!(older.unwrap(), FetchOutcome::Applied);
    assert_eq!(newer.unwrap(), FetchOutcome::Applied);
    assert!(loading_between.is_loading);
    assert_eq!(names(&loading_between), ["older-0-0", "older-0-1"]);

    let snapshot = container.snapshot().await;
    assert!(!snapshot.is_loading);
    assert_eq!(names(&snapshot), ["newer-0-0", "newer-0-1"]);
}

#[tokio::test]
async fn failed_query_keeps_previous_page() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    let before = container.snapshot().await;
    let mut events = container.subscribe_events();

    harness.records.set_failing(true);
    let outcome = container.on_page_turn(2).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Failed);
    let after = container.snapshot().await;
    assert_eq!(after.records, before.records);
    assert!(!after.is_loading);
    assert_eq!(container.phase().await, ContainerPhase::Ready);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        saw_failure |= matches!(event, ContainerEvent::FetchFailed(_));
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn definition_failure_leaves_container_uninitialized() {
    let container = RecordContainer::new(
        ContactStrategy::new(Arc::new(MissingRecordService)),
        Arc::new(MissingRecordService),
        Arc::new(DefinitionCache::new()),
        ContainerConfig::default(),
    );

    let err = container.initialize().await.unwrap_err();

    assert!(matches!(err, ContainerError::Definition { .. }));
    assert_eq!(container.phase().await, ContainerPhase::Uninitialized);
    assert_eq!(container.fetch().await, FetchOutcome::Skipped);
    assert!(matches!(
        container.on_page_turn(2).await,
        Err(ContainerError::NotInitialized)
    ));
}

#[tokio::test]
async fn definitions_are_fetched_once_per_cache() {
    let harness = Harness::new();
    harness.contacts().initialize().await.unwrap();
    harness.contacts().initialize().await.unwrap();
    harness.emails().initialize().await.unwrap();

    assert_eq!(harness.definitions.general_calls.load(Ordering::SeqCst), 1);
    // contactFilter once, emailFilter once
    assert_eq!(harness.definitions.entity_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn case_container_waits_for_an_email() {
    let harness = Harness::new();
    let container = harness.cases();

    assert_eq!(container.initialize().await.unwrap(), FetchOutcome::Skipped);
    assert!(harness.records.queries().is_empty());
    assert_eq!(container.phase().await, ContainerPhase::Ready);

    let event = CaseStrategy::email_selected(&record("email-7", "Update")).unwrap();
    assert_eq!(container.handle_event(event).await.unwrap(), FetchOutcome::Applied);

    let payload = harness.records.last_payload();
    let Some(EntityFilter::Case(case)) = payload.entity_filters.get(&FilterName::CaseFilter) else {
        panic!("case filter missing from payload");
    };
    assert_eq!(case.email_id, Some(RecordId::new("email-7")));
}

#[tokio::test]
async fn email_dates_are_truncated() {
    let harness = Harness::new();
    let container = harness.emails();
    container.initialize().await.unwrap();

    let snapshot = container.snapshot().await;
    for record in &snapshot.records {
        assert_eq!(record.str_field("CreatedDate"), Some("2022-05-01"));
    }
}

#[tokio::test]
async fn contact_selection_survives_paging() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();

    container
        .set_selected_records(&[record("contacts-0", "Ada")])
        .await;
    let snapshot = container.snapshot().await;
    assert!(snapshot.records[0].is_selected());
    assert!(!snapshot.records[1].is_selected());

    container.on_page_turn(2).await.unwrap();
    let snapshot = container.snapshot().await;
    assert!(snapshot.records[0].is_selected());

    let outcome = container
        .handle_event(WidgetEvent::SelectionRemoved {
            ids: vec![RecordId::new("contacts-0")],
        })
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Skipped);
    assert!(!container.snapshot().await.records[0].is_selected());
}

#[tokio::test]
async fn run_applies_events_from_the_channel() {
    let harness = Harness::new();
    let container = harness.contacts();
    container.initialize().await.unwrap();
    let mut events = container.subscribe_events();

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = container.clone().run(rx);
    tx.send(WidgetEvent::PageTurn { current_page: 2 }).unwrap();

    let snapshot = loop {
        match events.recv().await.unwrap() {
            ContainerEvent::RecordsUpdated(snapshot) => break snapshot,
            _ => continue,
        }
    };
    assert_eq!(snapshot.current_page, 2);
    assert_eq!(names(&snapshot), ["all-1-0", "all-1-1"]);

    drop(tx);
    handle.await.unwrap();
}
