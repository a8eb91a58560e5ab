//! Error types for feedmux-core

use thiserror::Error;

/// Main error type for the feedmux-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error for a platform payload
    #[error("parse error in {platform} payload: {message}")]
    Parse { platform: String, message: String },

    /// Payload carried a source tag no parser handles
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            platform: platform.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for feedmux-core
pub type Result<T> = std::result::Result<T, Error>;
