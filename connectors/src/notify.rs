//! Webhook-based outcome notification.

use async_trait::async_trait;
use serde::Serialize;

use tokengate_engine::{NotificationChannel, OutcomeNote, ProviderError};
use tokengate_types::{ChallengeContext, SubjectId};

use crate::{status_err, transport_err};

/// Posts the outcome summary to a configured webhook. Delivery is
/// best-effort by contract; the caller logs failures and moves on.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomePayload<'a> {
    subject_id: &'a str,
    message_id: Option<&'a str>,
    channel_id: Option<&'a str>,
    outcome: &'a OutcomeNote,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookNotifier {
    async fn notify(
        &self,
        subject: &SubjectId,
        context: &ChallengeContext,
        note: &OutcomeNote,
    ) -> Result<(), ProviderError> {
        let payload = OutcomePayload {
            subject_id: subject.as_str(),
            message_id: context.message_id.as_ref().map(|m| m.as_str()),
            channel_id: context.channel_id.as_ref().map(|c| c.as_str()),
            outcome: note,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_err)?;
        if !response.status().is_success() {
            return Err(status_err("outcome webhook", response.status()));
        }
        Ok(())
    }
}
