use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to a [`DocumentStore`](crate::pipeline::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("{key} is not valid UTF-8")]
    Encoding { key: String },
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }
}

/// Failure processing a single document or the index. Never fatal to a batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {key}: {source}")]
    Read { key: String, source: StoreError },
    #[error("failed to write {key}: {source}")]
    Write { key: String, source: StoreError },
    #[error("failed to update index: {source}")]
    Index { source: StoreError },
}
