use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by preference stores
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access preference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("preference file {path} is not valid JSON: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preference store rejected the write: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, Error>;
