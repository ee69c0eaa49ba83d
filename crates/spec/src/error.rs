use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpecError>;

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed entry: {0}")]
    Entry(#[from] oasgen_har::HarError),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),
}
