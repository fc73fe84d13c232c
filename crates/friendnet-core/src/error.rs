use thiserror::Error;

#[derive(Error, Debug)]
pub enum FriendNetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Security token not found in page: {0}")]
    TokenExtractionFailure(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Inconsistent data: {0}")]
    DataInconsistency(String),

    #[error("Timed out waiting for page content: {0}")]
    LoadingTimeout(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FriendNetError>;
