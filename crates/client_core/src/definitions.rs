use anyhow::Result;
use shared::{
    domain::FilterName,
    protocol::{DateRange, EmailDraft, EntityFilter, FilterDefinition},
};
use tokio::sync::OnceCell;
use tracing::info;

use crate::{FilterDefinitionService, MassEmailService};

/// Process-lifetime cache of the default filter shapes.
///
/// Each shape is fetched at most once successfully; a failed fetch is not
/// cached, so the next container to initialize asks again. Containers clone
/// what they get from here and never write back.
#[derive(Default)]
pub struct DefinitionCache {
    general: OnceCell<FilterDefinition>,
    contact: OnceCell<EntityFilter>,
    case: OnceCell<EntityFilter>,
    email: OnceCell<EntityFilter>,
    date_range: OnceCell<DateRange>,
    email_draft: OnceCell<EmailDraft>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn general(&self, service: &dyn FilterDefinitionService) -> Result<FilterDefinition> {
        let definition = self
            .general
            .get_or_try_init(|| async {
                info!("definitions: fetching general filter definition");
                service.general_definition().await
            })
            .await?;
        Ok(definition.clone())
    }

    pub async fn entity(
        &self,
        name: FilterName,
        service: &dyn FilterDefinitionService,
    ) -> Result<EntityFilter> {
        let filter = self
            .entity_cell(name)
            .get_or_try_init(|| async {
                info!(filter = %name, "definitions: fetching entity filter definition");
                service.entity_definition(name).await
            })
            .await?;
        Ok(filter.clone())
    }

    pub async fn date_range(&self, service: &dyn FilterDefinitionService) -> Result<DateRange> {
        let range = self
            .date_range
            .get_or_try_init(|| async {
                info!("definitions: fetching date range definition");
                service.date_range_definition().await
            })
            .await?;
        Ok(*range)
    }

    pub async fn email_draft(&self, service: &dyn MassEmailService) -> Result<EmailDraft> {
        let draft = self
            .email_draft
            .get_or_try_init(|| async {
                info!("definitions: fetching email draft definition");
                service.email_definition().await
            })
            .await?;
        Ok(draft.clone())
    }

    fn entity_cell(&self, name: FilterName) -> &OnceCell<EntityFilter> {
        match name {
            FilterName::ContactFilter => &self.contact,
            FilterName::CaseFilter => &self.case,
            FilterName::EmailFilter => &self.email,
        }
    }
}
