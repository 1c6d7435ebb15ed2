use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsgExtractError {
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model output could not be parsed as JSON: {reason}")]
    UnparsableResponse { reason: String, raw_text: String },

    #[error("Performance report output did not match the report shape: {reason}")]
    AggregationUnparsable { reason: String, raw_text: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EsgExtractError>;
