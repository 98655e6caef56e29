//! Fake services shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use shared::{
    domain::{FilterName, RecordKind, RecordView},
    protocol::{
        CaseFilter, ContactFilter, DateRange, EmailDraft, EmailFilter, EntityFilter,
        FilterDefinition, Page, QueryPayload, SelectOption,
    },
};

use crate::{FilterDefinitionService, MassEmailService, OptionsService, RecordQueryService};

pub(crate) const TOTAL_RECORDS: u64 = 95;

pub(crate) fn definition_range() -> DateRange {
    serde_json::from_value(json!({
        "startDate": "2022-01-01T00:00:00Z",
        "endDate": null
    }))
    .expect("date range fixture")
}

pub(crate) fn general_definition() -> FilterDefinition {
    serde_json::from_value(json!({
        "generalFilter": {
            "searchText": null,
            "recordLimit": 10,
            "recordOffset": 0,
            "orderByField": "",
            "direction": ""
        },
        "limits": [10, 25, 50],
        "directions": ["ASC", "DESC"]
    }))
    .expect("definition fixture")
}

pub(crate) fn record(id: &str, name: &str) -> RecordView {
    let value = json!({
        "Id": id,
        "Name": name,
        "CreatedDate": "2022-05-01T10:00:00.000+0000"
    });
    match value {
        serde_json::Value::Object(map) => RecordView(map),
        _ => unreachable!(),
    }
}

#[derive(Default)]
pub(crate) struct FakeDefinitions {
    pub general_calls: AtomicUsize,
    pub entity_calls: AtomicUsize,
    pub date_range_calls: AtomicUsize,
}

#[async_trait]
impl FilterDefinitionService for FakeDefinitions {
    async fn general_definition(&self) -> Result<FilterDefinition> {
        self.general_calls.fetch_add(1, Ordering::SeqCst);
        Ok(general_definition())
    }

    async fn entity_definition(&self, name: FilterName) -> Result<EntityFilter> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match name {
            FilterName::ContactFilter => EntityFilter::Contact(ContactFilter::default()),
            FilterName::CaseFilter => EntityFilter::Case(CaseFilter::default()),
            FilterName::EmailFilter => EntityFilter::Email(EmailFilter::default()),
        })
    }

    async fn date_range_definition(&self) -> Result<DateRange> {
        self.date_range_calls.fetch_add(1, Ordering::SeqCst);
        Ok(definition_range())
    }
}

/// Answers every query with two rows whose names encode the search text and
/// offset, so tests can tell which response is visible.
#[derive(Default)]
pub(crate) struct FakeRecords {
    queries: Mutex<Vec<(RecordKind, QueryPayload)>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing_searches: Mutex<HashSet<String>>,
    failing: AtomicBool,
}

impl FakeRecords {
    pub fn delay_search(&self, search: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(search.to_string(), delay);
    }

    pub fn fail_search(&self, search: &str) {
        self.failing_searches
            .lock()
            .unwrap()
            .insert(search.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<(RecordKind, QueryPayload)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> QueryPayload {
        self.queries
            .lock()
            .unwrap()
            .last()
            .map(|(_, payload)| payload.clone())
            .expect("no query was sent")
    }
}

#[async_trait]
impl RecordQueryService for FakeRecords {
    async fn query(&self, kind: RecordKind, payload: &QueryPayload) -> Result<Page> {
        self.queries.lock().unwrap().push((kind, payload.clone()));

        let search = payload
            .general_filter
            .search_text
            .clone()
            .unwrap_or_else(|| "all".to_string());
        let delay = self.delays.lock().unwrap().get(&search).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let search_fails = self.failing_searches.lock().unwrap().contains(&search);
        if search_fails || self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("query rejected"));
        }

        let offset = payload.general_filter.record_offset;
        Ok(Page {
            records: (0..2)
                .map(|i| record(&format!("{kind}-{i}"), &format!("{search}-{offset}-{i}")))
                .collect(),
            total_record_count: TOTAL_RECORDS,
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeOptions {
    pub failing: bool,
}

#[async_trait]
impl OptionsService for FakeOptions {
    async fn title_options(&self) -> Result<Vec<SelectOption>> {
        if self.failing {
            return Err(anyhow!("titles unavailable"));
        }
        Ok(vec![SelectOption {
            label: "Physician".to_string(),
            value: "MD".to_string(),
        }])
    }

    async fn network_options(&self) -> Result<Vec<SelectOption>> {
        if self.failing {
            return Err(anyhow!("networks unavailable"));
        }
        Ok(vec![SelectOption {
            label: "North".to_string(),
            value: "net-1".to_string(),
        }])
    }
}

#[derive(Default)]
pub(crate) struct FakeEmails {
    pub definition_calls: AtomicUsize,
    pub sent: Mutex<Vec<EmailDraft>>,
}

#[async_trait]
impl MassEmailService for FakeEmails {
    async fn email_definition(&self) -> Result<EmailDraft> {
        self.definition_calls.fetch_add(1, Ordering::SeqCst);
        Ok(EmailDraft {
            subject: "Network update".to_string(),
            ..EmailDraft::default()
        })
    }

    async fn send_emails(&self, draft: &EmailDraft) -> Result<u32> {
        self.sent.lock().unwrap().push(draft.clone());
        Ok(draft.recipients.len() as u32)
    }
}
