use serde::{Deserialize, Serialize};

/// Client-facing wire event. Every request stream is zero or more
/// `Content` events followed by exactly one terminal event, `Done` or
/// `Error`, after which the channel closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Content {
        content: String,
    },
    Done {
        done: bool,
        model: String,
        provider: String,
    },
    Error {
        error: String,
    },
}

impl StreamEvent {
    pub fn content<S: Into<String>>(text: S) -> Self {
        StreamEvent::Content {
            content: text.into(),
        }
    }

    pub fn done<S: Into<String>, T: Into<String>>(model: S, provider: T) -> Self {
        StreamEvent::Done {
            done: true,
            model: model.into(),
            provider: provider.into(),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        StreamEvent::Error {
            error: message.into(),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }

    /// Encode as a `data: {json}\n\n` SSE frame.
    pub fn to_sse_frame(&self) -> String {
        let encoded = serde_json::to_string(self).unwrap_or_else(|_| String::new());
        format!("data: {}\n\n", encoded)
    }
}
