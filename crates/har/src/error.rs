use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarError>;

#[derive(Error, Debug)]
pub enum HarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unsupported capture file: {0}")]
    UnsupportedFile(String),
}
