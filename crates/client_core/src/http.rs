use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{FilterName, RecordKind},
    error::ApiError,
    protocol::{
        DateRange, EmailDraft, EntityFilter, FilterDefinition, Page, QueryPayload, SelectOption,
        SendEmailsResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{FilterDefinitionService, MassEmailService, OptionsService, RecordQueryService};

/// JSON-over-HTTP binding for the record service.
#[derive(Clone)]
pub struct HttpRecordService {
    http: Client,
    base_url: Url,
}

impl HttpRecordService {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid service url {base_url:?}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path {path:?}"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "http: GET");
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "http: POST");
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => Err(api_error.into()),
        Err(_) => Err(anyhow!("record service returned {status}: {body}")),
    }
}

#[async_trait]
impl FilterDefinitionService for HttpRecordService {
    async fn general_definition(&self) -> Result<FilterDefinition> {
        self.get_json("filters/general").await
    }

    async fn entity_definition(&self, name: FilterName) -> Result<EntityFilter> {
        let value: Value = self.get_json(&format!("filters/{name}")).await?;
        EntityFilter::from_definition(name, value)
            .with_context(|| format!("malformed {name} definition"))
    }

    async fn date_range_definition(&self) -> Result<DateRange> {
        self.get_json("filters/dateRange").await
    }
}

#[async_trait]
impl RecordQueryService for HttpRecordService {
    async fn query(&self, kind: RecordKind, payload: &QueryPayload) -> Result<Page> {
        self.post_json(&format!("records/{}", kind.path_segment()), payload)
            .await
    }
}

#[async_trait]
impl OptionsService for HttpRecordService {
    async fn title_options(&self) -> Result<Vec<SelectOption>> {
        self.get_json("options/titles").await
    }

    async fn network_options(&self) -> Result<Vec<SelectOption>> {
        self.get_json("options/networks").await
    }
}

#[async_trait]
impl MassEmailService for HttpRecordService {
    async fn email_definition(&self) -> Result<EmailDraft> {
        self.get_json("emails/definition").await
    }

    async fn send_emails(&self, draft: &EmailDraft) -> Result<u32> {
        let response: SendEmailsResponse = self.post_json("emails", draft).await?;
        Ok(response.sent_count)
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
