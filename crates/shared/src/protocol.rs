use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{FilterName, NetworkId, RecordId, RecordView},
    error::FilterError,
};

/// Recency field; sorts newest-first by default.
pub const CREATED_DATE: &str = "CreatedDate";

/// Free-text search rejects one-letter tokens; empty text clears the search.
pub fn is_searchable(text: &str) -> bool {
    text.chars().count() != 1
}

/// Pagination, sort and search criteria shared by every record type.
///
/// `record_offset` is the zero-based page index, not a row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralFilter {
    #[serde(default)]
    pub search_text: Option<String>,
    pub record_limit: u32,
    #[serde(default)]
    pub record_offset: u32,
    #[serde(default)]
    pub order_by_field: String,
    #[serde(default)]
    pub direction: String,
}

/// Partial update for [`GeneralFilter`]. `None` leaves a field alone;
/// `search_text: Some(None)` clears the search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralFilterDelta {
    pub search_text: Option<Option<String>>,
    pub record_limit: Option<u32>,
    pub record_offset: Option<u32>,
    pub order_by_field: Option<String>,
    pub direction: Option<String>,
}

impl GeneralFilterDelta {
    /// Search change as the filter widget sends it: new text, back to page one.
    pub fn search(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            search_text: Some((!text.is_empty()).then_some(text)),
            record_offset: Some(0),
            ..Self::default()
        }
    }

    pub fn offset(record_offset: u32) -> Self {
        Self {
            record_offset: Some(record_offset),
            ..Self::default()
        }
    }

    pub fn sort(order_by_field: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            order_by_field: Some(order_by_field.into()),
            direction: Some(direction.into()),
            ..Self::default()
        }
    }
}

impl GeneralFilterDelta {
    /// Whether this delta would send a search the service rejects.
    pub fn has_unsearchable_text(&self) -> bool {
        matches!(&self.search_text, Some(Some(text)) if !is_searchable(text))
    }
}

impl GeneralFilter {
    pub fn apply(&mut self, delta: GeneralFilterDelta) {
        if let Some(search_text) = delta.search_text {
            self.search_text = search_text;
        }
        if let Some(record_limit) = delta.record_limit {
            self.record_limit = record_limit;
        }
        if let Some(record_offset) = delta.record_offset {
            self.record_offset = record_offset;
        }
        if let Some(order_by_field) = delta.order_by_field {
            self.order_by_field = order_by_field;
        }
        if let Some(direction) = delta.direction {
            self.direction = direction;
        }
    }
}

/// The two ORDER BY direction tokens the service accepts, `[asc, desc]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DirectionTokens {
    pub ascending: String,
    pub descending: String,
}

impl DirectionTokens {
    pub fn new(ascending: impl Into<String>, descending: impl Into<String>) -> Self {
        Self {
            ascending: ascending.into(),
            descending: descending.into(),
        }
    }

    pub fn toggle(&self, current: &str) -> &str {
        if current == self.ascending {
            &self.descending
        } else {
            &self.ascending
        }
    }
}

impl Default for DirectionTokens {
    fn default() -> Self {
        Self::new("ASC", "DESC")
    }
}

impl TryFrom<Vec<String>> for DirectionTokens {
    type Error = FilterError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        match <[String; 2]>::try_from(value) {
            Ok([ascending, descending]) => Ok(Self {
                ascending,
                descending,
            }),
            Err(value) => Err(FilterError::DirectionCount(value.len())),
        }
    }
}

impl From<DirectionTokens> for Vec<String> {
    fn from(value: DirectionTokens) -> Self {
        vec![value.ascending, value.descending]
    }
}

/// Defaults served by the filter-definition endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub general_filter: GeneralFilter,
    pub limits: Vec<u32>,
    pub directions: DirectionTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLimitOption {
    pub label: String,
    pub value: u32,
}

impl RecordLimitOption {
    pub fn from_limits(limits: &[u32]) -> Vec<Self> {
        limits
            .iter()
            .map(|&value| Self {
                label: format!("{value} per page"),
                value,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn blank() -> Self {
        Self {
            label: String::new(),
            value: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn has_one_date(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    pub fn has_both_dates(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    pub fn is_invalid(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start > end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactFilter {
    pub title: Option<String>,
    pub network_id: Option<NetworkId>,
    pub county: Option<String>,
    pub fqhc: bool,
    pub cad: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilterDelta {
    pub title: Option<Option<String>>,
    pub network_id: Option<Option<NetworkId>>,
    pub county: Option<Option<String>>,
    pub fqhc: Option<bool>,
    pub cad: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaseFilter {
    pub email_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilterDelta {
    pub email_id: Option<Option<RecordId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailFilter {
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailFilterDelta {
    pub date_range: Option<Option<DateRange>>,
}

/// Record-type specific filter fragment, one variant per slot name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntityFilter {
    Contact(ContactFilter),
    Case(CaseFilter),
    Email(EmailFilter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityFilterDelta {
    Contact(ContactFilterDelta),
    Case(CaseFilterDelta),
    Email(EmailFilterDelta),
}

impl EntityFilter {
    /// Parses a definition payload into the shape registered for `name`.
    pub fn from_definition(name: FilterName, value: Value) -> serde_json::Result<Self> {
        Ok(match name {
            FilterName::ContactFilter => EntityFilter::Contact(serde_json::from_value(value)?),
            FilterName::CaseFilter => EntityFilter::Case(serde_json::from_value(value)?),
            FilterName::EmailFilter => EntityFilter::Email(serde_json::from_value(value)?),
        })
    }

    pub fn name(&self) -> FilterName {
        match self {
            EntityFilter::Contact(_) => FilterName::ContactFilter,
            EntityFilter::Case(_) => FilterName::CaseFilter,
            EntityFilter::Email(_) => FilterName::EmailFilter,
        }
    }

    pub fn apply(&mut self, delta: EntityFilterDelta) -> Result<(), FilterError> {
        match (self, delta) {
            (EntityFilter::Contact(filter), EntityFilterDelta::Contact(delta)) => {
                if let Some(title) = delta.title {
                    filter.title = title;
                }
                if let Some(network_id) = delta.network_id {
                    filter.network_id = network_id;
                }
                if let Some(county) = delta.county {
                    filter.county = county;
                }
                if let Some(fqhc) = delta.fqhc {
                    filter.fqhc = fqhc;
                }
                if let Some(cad) = delta.cad {
                    filter.cad = cad;
                }
                Ok(())
            }
            (EntityFilter::Case(filter), EntityFilterDelta::Case(delta)) => {
                if let Some(email_id) = delta.email_id {
                    filter.email_id = email_id;
                }
                Ok(())
            }
            (EntityFilter::Email(filter), EntityFilterDelta::Email(delta)) => {
                if let Some(date_range) = delta.date_range {
                    filter.date_range = date_range;
                }
                Ok(())
            }
            (target, delta) => Err(FilterError::KindMismatch {
                target: target.name(),
                delta: delta.name(),
            }),
        }
    }
}

impl EntityFilterDelta {
    /// County is a free-text search like the general one.
    pub fn has_unsearchable_text(&self) -> bool {
        matches!(
            self,
            EntityFilterDelta::Contact(ContactFilterDelta {
                county: Some(Some(county)),
                ..
            }) if !is_searchable(county)
        )
    }

    pub fn name(&self) -> FilterName {
        match self {
            EntityFilterDelta::Contact(_) => FilterName::ContactFilter,
            EntityFilterDelta::Case(_) => FilterName::CaseFilter,
            EntityFilterDelta::Email(_) => FilterName::EmailFilter,
        }
    }
}

/// Body posted to the record-query endpoint: the general filter joined with
/// each entity filter under its slot name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPayload {
    pub general_filter: GeneralFilter,
    #[serde(flatten)]
    pub entity_filters: BTreeMap<FilterName, EntityFilter>,
}

impl QueryPayload {
    pub fn new(general_filter: GeneralFilter) -> Self {
        Self {
            general_filter,
            entity_filters: BTreeMap::new(),
        }
    }

    pub fn with_entity(mut self, filter: EntityFilter) -> Self {
        self.entity_filters.insert(filter.name(), filter);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub records: Vec<RecordView>,
    pub total_record_count: u64,
}

/// Attachment metadata carried on an email draft. File bytes never travel
/// through this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(
        rename = "ContentDocumentId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_document_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailDraft {
    pub subject: String,
    pub message_body: String,
    pub recipients: Vec<RecordView>,
    pub attachments: Vec<AttachmentMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailsResponse {
    pub sent_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    Success,
    Warning,
    Error,
}

/// Toast-style notice raised by a widget instead of a change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: NotificationVariant::Warning,
        }
    }
}

/// Change events raised by filter, list and paginator widgets and consumed
/// by the owning record container.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    PageTurn {
        current_page: u32,
    },
    SortChange {
        column_index: usize,
    },
    UniqueFilterChange {
        filter_name: FilterName,
        delta: EntityFilterDelta,
    },
    GeneralFilterChange {
        delta: GeneralFilterDelta,
    },
    RecordLimitChange {
        limit: u32,
    },
    SelectionAdded {
        records: Vec<RecordView>,
    },
    SelectionRemoved {
        ids: Vec<RecordId>,
    },
}
