use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::base::{CompletionRequest, EventStream, ProviderAdapter};
use super::configs::OpenAiProviderConfig;
use super::sse::{normalize_sse, Termination};
use super::utils::{chat_completion_delta, turns_to_chat_spec};
use crate::errors::ProviderError;
use crate::routing::ProviderKind;

pub struct OpenAiAdapter {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiAdapter {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn stream_chat(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<EventStream, ProviderError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let payload = json!({
            "model": request.model,
            "messages": turns_to_chat_spec(request.system, request.turns, request.image),
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
                provider: "openai",
                status,
                body,
            });
        }

        Ok(normalize_sse(
            response.bytes_stream(),
            chat_completion_delta,
            Termination::DoneSentinel,
            request.model.to_string(),
            "openai",
        ))
    }
}
