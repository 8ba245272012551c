use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::ProviderError;
use crate::models::event::StreamEvent;
use crate::models::message::{ChatTurn, ImageAttachment};
use crate::routing::ProviderKind;

/// Normalized event stream produced by every adapter. Ends with exactly
/// one terminal item: `Ok(StreamEvent::Done { .. })` on success or a
/// single `Err` the relay turns into an error frame.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ProviderError>>;

/// A normalized chat completion request, ready for any provider.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub turns: &'a [ChatTurn],
    pub model: &'a str,
    pub image: Option<&'a ImageAttachment>,
    pub web_search: bool,
}

/// Uniform interface over the upstream LLM providers. Each adapter owns
/// its request-shape translation and raw-stream handling; provider
/// quirks (history seeding, leading-role stripping, image conventions)
/// stay behind this trait.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Issue the upstream call and return the normalized event stream.
    /// An `Err` here happened before any bytes streamed; failures after
    /// that point surface inside the stream.
    async fn stream_chat(&self, request: CompletionRequest<'_>)
        -> Result<EventStream, ProviderError>;
}
