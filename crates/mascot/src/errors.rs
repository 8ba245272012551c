use thiserror::Error;

/// Errors raised while talking to an upstream LLM provider.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("conversation must end with a user turn: {0}")]
    InvalidTurnOrder(String),

    #[error("{provider} request failed with status {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Gateway-level error taxonomy. The server maps these onto HTTP statuses.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid or expired credential")]
    InvalidOrExpiredCredential,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("mascot not found: {0}")]
    NotFound(String),

    #[error("upstream provider error: {0}")]
    UpstreamProvider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(String),
}
