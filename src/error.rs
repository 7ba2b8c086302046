//! Error types for callseq.
//!
//! Graph building and sequence synthesis never fail; errors only come from the
//! collaborators around them (files, the store, front-end parsing, config).

use thiserror::Error;

/// Result type used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("record encoding error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// A front end could not read a translation unit.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl Error {
    pub fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
