use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{FilterName, RecordKind},
    protocol::{
        DateRange, EmailDraft, EntityFilter, FilterDefinition, Page, QueryPayload, SelectOption,
    },
};

pub mod composer;
pub mod config;
pub mod container;
pub mod date_range;
pub mod debounce;
pub mod definitions;
pub mod error;
pub mod filter_state;
pub mod filters;
pub mod http;
pub mod pagination;
pub mod selection;
pub mod sort;
pub mod strategy;

pub use composer::MessageComposer;
pub use config::ContainerConfig;
pub use container::{
    ContainerEvent, ContainerPhase, ContainerSnapshot, FetchOutcome, RecordContainer,
};
pub use definitions::DefinitionCache;
pub use error::ContainerError;
pub use http::HttpRecordService;
pub use strategy::{CaseStrategy, ContactStrategy, EmailStrategy, EntityStrategy};

/// Source of the default filter shapes. Called once per process per shape;
/// results are kept in a [`DefinitionCache`].
#[async_trait]
pub trait FilterDefinitionService: Send + Sync {
    async fn general_definition(&self) -> Result<FilterDefinition>;
    async fn entity_definition(&self, name: FilterName) -> Result<EntityFilter>;
    /// Initial value of the email list's date range picker.
    async fn date_range_definition(&self) -> Result<DateRange>;
}

#[async_trait]
pub trait RecordQueryService: Send + Sync {
    async fn query(&self, kind: RecordKind, payload: &QueryPayload) -> Result<Page>;
}

#[async_trait]
pub trait OptionsService: Send + Sync {
    async fn title_options(&self) -> Result<Vec<SelectOption>>;
    async fn network_options(&self) -> Result<Vec<SelectOption>>;
}

#[async_trait]
pub trait MassEmailService: Send + Sync {
    async fn email_definition(&self) -> Result<EmailDraft>;
    async fn send_emails(&self, draft: &EmailDraft) -> Result<u32>;
}

/// Stand-in used when no record service is configured; every call fails.
pub struct MissingRecordService;

#[async_trait]
impl FilterDefinitionService for MissingRecordService {
    async fn general_definition(&self) -> Result<FilterDefinition> {
        Err(anyhow!("record service is unavailable"))
    }

    async fn entity_definition(&self, name: FilterName) -> Result<EntityFilter> {
        Err(anyhow!("record service is unavailable for {name}"))
    }

    async fn date_range_definition(&self) -> Result<DateRange> {
        Err(anyhow!("record service is unavailable"))
    }
}

#[async_trait]
impl RecordQueryService for MissingRecordService {
    async fn query(&self, kind: RecordKind, _payload: &QueryPayload) -> Result<Page> {
        Err(anyhow!("record service is unavailable for {kind}"))
    }
}

#[async_trait]
impl OptionsService for MissingRecordService {
    async fn title_options(&self) -> Result<Vec<SelectOption>> {
        Err(anyhow!("record service is unavailable"))
    }

    async fn network_options(&self) -> Result<Vec<SelectOption>> {
        Err(anyhow!("record service is unavailable"))
    }
}

#[async_trait]
impl MassEmailService for MissingRecordService {
    async fn email_definition(&self) -> Result<EmailDraft> {
        Err(anyhow!("record service is unavailable"))
    }

    async fn send_emails(&self, _draft: &EmailDraft) -> Result<u32> {
        Err(anyhow!("record service is unavailable"))
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod support;
