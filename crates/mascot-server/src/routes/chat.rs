use crate::state::AppState;
use axum::{
    extract::State,
    http::{self, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use mascot::{
    errors::GatewayError,
    models::event::StreamEvent,
    models::message::{ChatTurn, ImageAttachment, Role},
    prompt::compose_system_prompt,
    providers::base::{CompletionRequest, EventStream},
    providers::factory,
    routing::{self, ProviderChoice},
};
use serde::Deserialize;
use serde_json::json;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

// Inbound JSON body for a chat turn
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    #[serde(default)]
    mascot_id: String,
    #[serde(default)]
    messages: Vec<ChatTurn>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    skill_id: Option<String>,
    #[serde(default)]
    provider: ProviderChoice,
    #[serde(default)]
    deep_thinking: bool,
    #[serde(default)]
    web_search: bool,
    #[serde(default)]
    task_category: Option<String>,
    #[serde(default)]
    image: Option<ImageAttachment>,
}

/// Errors surfaced before the stream starts, as `{error, details?}` JSON.
struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ApiError {
    fn internal<S: Into<String>>(details: S) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
            details: Some(details.into()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            // Credential failures stay generic so internals never leak
            GatewayError::MissingCredential | GatewayError::InvalidOrExpiredCredential => {
                ApiError {
                    status: StatusCode::UNAUTHORIZED,
                    message: "Unauthorized".to_string(),
                    details: None,
                }
            }
            GatewayError::Validation(message) => ApiError {
                status: StatusCode::BAD_REQUEST,
                message,
                details: None,
            },
            GatewayError::NotFound(message) => ApiError {
                status: StatusCode::NOT_FOUND,
                message,
                details: None,
            },
            GatewayError::UpstreamProvider(err) => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Upstream provider error".to_string(),
                details: Some(err.to_string()),
            },
            GatewayError::Store(message) => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Store error".to_string(),
                details: Some(message),
            },
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut body = json!({ "error": self.message });
        if let Some(details) = self.details {
            body["details"] = json!(details);
        }
        (self.status, Json(body)).into_response()
    }
}

// SSE response that relays normalized frames from the spawned task
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> axum::response::Response {
        let stream = self;
        let body = axum::body::Body::from_stream(stream);

        http::Response::builder()
            .header("Content-Type", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .header("Connection", "keep-alive")
            .body(body)
            .unwrap()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn validate(request: &ChatRequest) -> Result<(), GatewayError> {
    if request.mascot_id.is_empty() {
        return Err(GatewayError::Validation("mascotId is required".to_string()));
    }
    if request.messages.is_empty() {
        return Err(GatewayError::Validation(
            "messages must be non-empty".to_string(),
        ));
    }
    if request.messages.last().map(|turn| turn.role) != Some(Role::User) {
        return Err(GatewayError::Validation(
            "last message must have role user".to_string(),
        ));
    }
    Ok(())
}

/// Relay the normalized upstream stream into the client channel.
/// Guarantees a terminal frame and aborts the upstream read when the
/// client goes away (the heartbeat notices the closed channel).
async fn relay(mut events: EventStream, tx: mpsc::Sender<String>) {
    loop {
        match timeout(Duration::from_millis(500), events.next()).await {
            Ok(Some(Ok(event))) => {
                let terminal = event.is_terminal();
                if tx.send(event.to_sse_frame()).await.is_err() {
                    // Client disconnected; dropping `events` aborts the
                    // upstream read
                    tracing::info!("client disconnected, aborting upstream stream");
                    break;
                }
                if terminal {
                    break;
                }
            }
            Ok(Some(Err(e))) => {
                tracing::error!("upstream stream error: {}", e);
                let _ = tx
                    .send(StreamEvent::error(e.to_string()).to_sse_frame())
                    .await;
                break;
            }
            Ok(None) => {
                // The normalizer always ends with a terminal event; a bare
                // end means something upstream broke without reporting
                let _ = tx
                    .send(
                        StreamEvent::error("stream ended unexpectedly".to_string())
                            .to_sse_frame(),
                    )
                    .await;
                break;
            }
            Err(_) => {
                // Heartbeat, used to detect disconnected clients
                if tx.is_closed() {
                    break;
                }
            }
        }
    }
}

async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<SseResponse, ApiError> {
    let override_token = header_str(&headers, "x-user-token");
    let bearer = header_str(&headers, "authorization")
        .and_then(|value| value.strip_prefix("Bearer "));

    let principal = state.resolver.resolve(bearer, override_token).await?;

    validate(&request)?;

    let persona = state
        .store
        .fetch_persona(&request.mascot_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("mascot {}", request.mascot_id)))?;
    let personality = state.store.fetch_personality(&request.mascot_id).await?;
    let skill = match &request.skill_id {
        Some(skill_id) => {
            state
                .store
                .fetch_skill(&request.mascot_id, skill_id)
                .await?
        }
        None => None,
    };

    let system = compose_system_prompt(&persona, personality.as_deref(), skill.as_ref());

    let category = request
        .task_category
        .as_deref()
        .or(persona.task_category.as_deref());
    let route = routing::resolve(
        request.provider,
        category,
        request.web_search,
        request.deep_thinking,
    );

    let span = tracing::info_span!(
        "chat_request",
        mascot = %request.mascot_id,
        user = %principal,
        conversation = request.conversation_id.as_deref().unwrap_or("-"),
        provider = route.provider.as_str(),
        model = route.model,
    );
    span.in_scope(|| tracing::info!("routing chat request"));

    let adapter = factory::get_adapter(state.providers.for_kind(route.provider))
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let completion = CompletionRequest {
        system: &system,
        turns: &request.messages,
        model: route.model,
        image: request.image.as_ref(),
        web_search: request.web_search,
    };

    // A failure here happens before any bytes went out, so it can still
    // be a plain JSON error response
    let events = adapter
        .stream_chat(completion)
        .await
        .map_err(GatewayError::from)?;

    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    tokio::spawn(relay(events, tx).instrument(span));

    Ok(SseResponse::new(stream))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
