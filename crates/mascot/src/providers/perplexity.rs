use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::base::{CompletionRequest, EventStream, ProviderAdapter};
use super::configs::PerplexityProviderConfig;
use super::sse::{normalize_sse, Termination};
use super::utils::{chat_completion_delta, turns_to_chat_spec};
use crate::errors::ProviderError;
use crate::models::message::{ChatTurn, Role};
use crate::routing::ProviderKind;

pub struct PerplexityAdapter {
    client: Client,
    config: PerplexityProviderConfig,
}

impl PerplexityAdapter {
    pub fn new(config: PerplexityProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

/// Perplexity requires the first non-system turn to be a user turn, so
/// any leading assistant turns are dropped from the history.
fn strip_leading_assistant(turns: &[ChatTurn]) -> &[ChatTurn] {
    let start = turns
        .iter()
        .position(|turn| turn.role != Role::Assistant)
        .unwrap_or(turns.len());
    &turns[start..]
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Perplexity
    }

    async fn stream_chat(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<EventStream, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let turns = strip_leading_assistant(request.turns);
        let payload = json!({
            "model": request.model,
            "messages": turns_to_chat_spec(request.system, turns, request.image),
            "stream": true
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "perplexity",
                status,
                body,
            });
        }

        Ok(normalize_sse(
            response.bytes_stream(),
            chat_completion_delta,
            Termination::DoneSentinel,
            request.model.to_string(),
            "perplexity",
        ))
    }
}
