use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;

use super::base::EventStream;
use crate::errors::ProviderError;
use crate::models::event::StreamEvent;

/// How an upstream marks the end of its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// OpenAI-style `data: [DONE]` sentinel line.
    DoneSentinel,
    /// The byte stream simply ends (Gemini's `alt=sse` framing).
    EndOfStream,
}

/// Normalize an upstream SSE byte stream into the client event
/// contract. Scans for `data:` lines, feeds each JSON payload to
/// `extract`, and emits a `content` event per non-empty delta. Lines
/// that are not JSON (keep-alives, comments) are skipped silently.
///
/// Exactly one terminal item ends the stream: `done` carrying the
/// resolved model and provider, or a single `Err` if the transport
/// breaks mid-stream.
pub fn normalize_sse<S, E>(
    bytes: S,
    extract: fn(&Value) -> Option<String>,
    termination: Termination,
    model: String,
    provider: &'static str,
) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let events = stream! {
        futures::pin_mut!(bytes);
        let mut buffer = String::new();

        'read: while let Some(result) = bytes.next().await {
            let chunk = match result {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ProviderError::Stream(e.to_string()));
                    return;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);

                let Some(payload) = line.strip_prefix("data:") else {
                    continue;
                };
                let payload = payload.trim_start();

                if termination == Termination::DoneSentinel && payload == "[DONE]" {
                    break 'read;
                }

                let Ok(value) = serde_json::from_str::<Value>(payload) else {
                    continue;
                };
                if let Some(text) = extract(&value) {
                    if !text.is_empty() {
                        yield Ok(StreamEvent::content(text));
                    }
                }
            }
        }

        yield Ok(StreamEvent::done(model, provider));
    };

    events.boxed()
}
