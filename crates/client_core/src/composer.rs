use std::sync::Arc;

use anyhow::{anyhow, Result};
use shared::{
    domain::RecordView,
    protocol::{AttachmentMeta, EmailDraft, WidgetEvent},
};
use tracing::{info, warn};

use crate::{definitions::DefinitionCache, MassEmailService};

/// Mass-email form fed by the selection cart.
pub struct MessageComposer {
    service: Arc<dyn MassEmailService>,
    draft: EmailDraft,
}

impl MessageComposer {
    /// Seeds the draft from the cached email definition.
    pub async fn open(service: Arc<dyn MassEmailService>, cache: &DefinitionCache) -> Result<Self> {
        let draft = cache.email_draft(service.as_ref()).await?;
        Ok(Self { service, draft })
    }

    pub fn draft(&self) -> &EmailDraft {
        &self.draft
    }

    pub fn recipients(&self) -> &[RecordView] {
        &self.draft.recipients
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.draft.subject = subject.into();
    }

    pub fn set_message_body(&mut self, body: impl Into<String>) {
        self.draft.message_body = body.into();
    }

    /// Mirrors cart changes into the recipient list. Other events are ignored.
    pub fn handle_selection(&mut self, event: &WidgetEvent) {
        match event {
            WidgetEvent::SelectionAdded { records } => {
                for record in records {
                    let id = record.id();
                    if id.is_some() && self.draft.recipients.iter().any(|r| r.id() == id) {
                        continue;
                    }
                    self.draft.recipients.push(record.clone());
                }
            }
            WidgetEvent::SelectionRemoved { ids } => {
                self.draft
                    .recipients
                    .retain(|r| r.id().map_or(true, |id| !ids.contains(&id)));
            }
            _ => {}
        }
    }

    pub fn add_attachment(&mut self, attachment: AttachmentMeta) {
        self.draft.attachments.push(attachment);
    }

    /// Returns whether an attachment with that title was removed.
    pub fn delete_attachment(&mut self, title: &str) -> bool {
        let before = self.draft.attachments.len();
        self.draft.attachments.retain(|a| a.title != title);
        self.draft.attachments.len() != before
    }

    pub async fn send(&self) -> Result<u32> {
        if self.draft.recipients.is_empty() {
            warn!("composer: send requested with no recipients");
            return Err(anyhow!("no recipients selected"));
        }

        info!(
            recipients = self.draft.recipients.len(),
            attachments = self.draft.attachments.len(),
            "composer: sending mass email"
        );
        let sent = self.service.send_emails(&self.draft).await?;
        info!(sent, "composer: mass email accepted");
        Ok(sent)
    }
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
