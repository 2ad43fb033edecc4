use thiserror::Error;

/// Failure taxonomy for one tool invocation. Every variant is mapped to a
/// user-visible text message at the adapter boundary; nothing is retried.
#[derive(Debug, Error)]
pub enum ArkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No retrieval method produced bytes for an input image.
    #[error("Image unavailable: {0}")]
    ImageUnavailable(String),

    #[error("Image encoding failed: {0}")]
    EncodingFailure(String),

    /// Network or HTTP failure during download or streaming.
    #[error("Transport error: {0}")]
    TransportFailure(String),

    /// The API reported a generation error.
    #[error("Remote generation failed: {0}")]
    RemoteGenerationFailure(String),

    /// A stream payload could not be parsed.
    #[error("Malformed response: {0}")]
    ResponseError(String),

    #[error("Unexpected error: {0}")]
    UnknownFailure(String),
}

pub type Result<T> = std::result::Result<T, ArkError>;
