//! Error handling for retrace

use thiserror::Error;

/// Main error type for retrace operations
#[derive(Error, Debug)]
pub enum RetraceError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Redirect loop: exceeded {0} hops")]
    RedirectLoop(usize),

    #[error("Redirect response has no Location header")]
    MissingLocation,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

/// Result type alias for retrace operations
pub type Result<T> = std::result::Result<T, RetraceError>;
