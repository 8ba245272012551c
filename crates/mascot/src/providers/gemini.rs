use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{CompletionRequest, EventStream, ProviderAdapter};
use super::configs::GeminiProviderConfig;
use super::sse::{normalize_sse, Termination};
use crate::errors::ProviderError;
use crate::models::message::{ChatTurn, ImageAttachment, Role};
use crate::routing::ProviderKind;

pub struct GeminiAdapter {
    client: Client,
    config: GeminiProviderConfig,
}

impl GeminiAdapter {
    pub fn new(config: GeminiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        _ => "user",
    }
}

/// Convert the history turns (everything but the live message) into
/// Gemini's `{role, parts}` shape. The provider requires a non-empty
/// history to open with a user turn, so a synthetic greeting pair is
/// prepended when it does not.
fn turns_to_history(turns: &[ChatTurn]) -> Vec<Value> {
    let mut history: Vec<Value> = turns
        .iter()
        .filter(|turn| turn.role != Role::System)
        .map(|turn| {
            json!({
                "role": gemini_role(turn.role),
                "parts": [{"text": turn.content}]
            })
        })
        .collect();

    if history.first().is_some_and(|first| first["role"] != "user") {
        history.splice(
            0..0,
            [
                json!({"role": "user", "parts": [{"text": "Hello"}]}),
                json!({
                    "role": "model",
                    "parts": [{"text": "Hello! How can I help you today?"}]
                }),
            ],
        );
    }

    history
}

fn live_message_parts(turn: &ChatTurn, image: Option<&ImageAttachment>) -> Vec<Value> {
    let mut parts = vec![json!({"text": turn.content})];
    if let Some(image) = image {
        parts.push(json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.base64
            }
        }));
    }
    parts
}

/// Extract the concatenated candidate text from a Gemini stream chunk.
fn candidate_text(value: &Value) -> Option<String> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn stream_chat(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<EventStream, ProviderError> {
        let Some((last, history_turns)) = request.turns.split_last() else {
            return Err(ProviderError::InvalidTurnOrder(
                "conversation is empty".to_string(),
            ));
        };
        if last.role != Role::User {
            return Err(ProviderError::InvalidTurnOrder(format!(
                "final turn has role {:?}",
                last.role
            )));
        }

        let mut contents = turns_to_history(history_turns);
        contents.push(json!({
            "role": "user",
            "parts": live_message_parts(last, request.image)
        }));

        let mut payload = json!({
            "contents": contents,
            "systemInstruction": {"parts": [{"text": request.system}]}
        });
        if request.web_search {
            payload["tools"] = json!([{"google_search": {}}]);
        }

        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.host.trim_end_matches('/'),
            request.model
        );

        // API key goes in a header so it never shows up in error text
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: "gemini",
                status,
                body,
            });
        }

        Ok(normalize_sse(
            response.bytes_stream(),
            candidate_text,
            Termination::EndOfStream,
            request.model.to_string(),
            "gemini",
        ))
    }
}
