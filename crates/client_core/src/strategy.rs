use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{FilterName, RecordKind, RecordView},
    protocol::{
        CaseFilterDelta, EntityFilter, EntityFilterDelta, GeneralFilter, Page, QueryPayload,
        WidgetEvent, CREATED_DATE,
    },
};

use crate::{
    selection::{mark_selection, SelectionSet},
    RecordQueryService,
};

/// What a concrete record list plugs into the generic container.
#[async_trait]
pub trait EntityStrategy: Send + Sync + 'static {
    fn kind(&self) -> RecordKind;

    /// Sortable fields, in list column order. The first is the default sort.
    fn order_by_fields(&self) -> Vec<String>;

    /// Entity-filter slots this container hosts.
    fn filter_names(&self) -> &'static [FilterName];

    /// Whether the entity filters carry enough to query with.
    fn is_ready(&self, _entity: &BTreeMap<FilterName, EntityFilter>) -> bool {
        true
    }

    fn build_payload(
        &self,
        general: &GeneralFilter,
        entity: &BTreeMap<FilterName, EntityFilter>,
    ) -> QueryPayload {
        entity
            .values()
            .cloned()
            .fold(QueryPayload::new(general.clone()), QueryPayload::with_entity)
    }

    async fn fetch(&self, payload: QueryPayload) -> Result<Page>;

    fn apply_selection(&self, _records: &mut [RecordView], _selection: &SelectionSet) {}

    /// Runs on every freshly fetched page before it becomes visible.
    fn post_process(&self, records: &mut [RecordView], selection: &SelectionSet) {
        self.apply_selection(records, selection);
    }
}

const CONTACT_ORDER_BYS: &[&str] = &["Name", "Provider_Title__c", "AccountId", "Email", "Phone"];
const CASE_ORDER_BYS: &[&str] = &["CaseNumber", "Contact.Name", "Status", "Contact.Email"];
const EMAIL_ORDER_BYS: &[&str] = &[CREATED_DATE, "Subject__c", "CreatedBy.Name"];
const ATTACHMENT_NAMES_FIELD: &str = "Attachment_Names__c";

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|field| field.to_string()).collect()
}

/// Provider contacts; rows carry a checkbox that survives paging.
pub struct ContactStrategy {
    service: Arc<dyn RecordQueryService>,
}

impl ContactStrategy {
    pub fn new(service: Arc<dyn RecordQueryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EntityStrategy for ContactStrategy {
    fn kind(&self) -> RecordKind {
        RecordKind::Contact
    }

    fn order_by_fields(&self) -> Vec<String> {
        owned(CONTACT_ORDER_BYS)
    }

    fn filter_names(&self) -> &'static [FilterName] {
        &[FilterName::ContactFilter]
    }

    async fn fetch(&self, payload: QueryPayload) -> Result<Page> {
        self.service.query(self.kind(), &payload).await
    }

    fn apply_selection(&self, records: &mut [RecordView], selection: &SelectionSet) {
        mark_selection(records, selection);
    }
}

/// Cases opened by one mass email; idle until an email is chosen.
pub struct CaseStrategy {
    service: Arc<dyn RecordQueryService>,
}

impl CaseStrategy {
    pub fn new(service: Arc<dyn RecordQueryService>) -> Self {
        Self { service }
    }

    /// Click on a row of the email list scopes the case list to that email.
    pub fn email_selected(email: &RecordView) -> Option<WidgetEvent> {
        let email_id = email.id()?;
        Some(WidgetEvent::UniqueFilterChange {
            filter_name: FilterName::CaseFilter,
            delta: EntityFilterDelta::Case(CaseFilterDelta {
                email_id: Some(Some(email_id)),
            }),
        })
    }
}

/// Attachment titles of a sent email; stored space-separated on the row.
pub fn attachment_names(email: &RecordView) -> Vec<String> {
    email
        .str_field(ATTACHMENT_NAMES_FIELD)
        .map(|names| {
            names
                .split(' ')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl EntityStrategy for CaseStrategy {
    fn kind(&self) -> RecordKind {
        RecordKind::Case
    }

    fn order_by_fields(&self) -> Vec<String> {
        owned(CASE_ORDER_BYS)
    }

    fn filter_names(&self) -> &'static [FilterName] {
        &[FilterName::CaseFilter]
    }

    fn is_ready(&self, entity: &BTreeMap<FilterName, EntityFilter>) -> bool {
        matches!(
            entity.get(&FilterName::CaseFilter),
            Some(EntityFilter::Case(filter)) if filter.email_id.is_some()
        )
    }

    async fn fetch(&self, payload: QueryPayload) -> Result<Page> {
        self.service.query(self.kind(), &payload).await
    }
}

/// Previously sent mass emails, newest first.
pub struct EmailStrategy {
    service: Arc<dyn RecordQueryService>,
}

impl EmailStrategy {
    pub fn new(service: Arc<dyn RecordQueryService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EntityStrategy for EmailStrategy {
    fn kind(&self) -> RecordKind {
        RecordKind::Email
    }

    fn order_by_fields(&self) -> Vec<String> {
        owned(EMAIL_ORDER_BYS)
    }

    fn filter_names(&self) -> &'static [FilterName] {
        &[FilterName::EmailFilter]
    }

    async fn fetch(&self, payload: QueryPayload) -> Result<Page> {
        self.service.query(self.kind(), &payload).await
    }

    fn post_process(&self, records: &mut [RecordView], _selection: &SelectionSet) {
        for record in records {
            let date = record
                .str_field(CREATED_DATE)
                .and_then(|created| created.get(..10))
                .map(str::to_string);
            if let Some(date) = date {
                record.set_field(CREATED_DATE, date);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/strategy_tests.rs"]
mod tests;
