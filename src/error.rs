use thiserror::Error;

/// Failure reaching the completion provider. Every variant surfaces to
/// callers as the same "completion failed" kind.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0} API key is required")]
    MissingApiKey(String),

    #[error("invalid API key format: {0}")]
    InvalidApiKey(String),

    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("completion failed: {0}")]
    Completion(#[from] GatewayError),
}
