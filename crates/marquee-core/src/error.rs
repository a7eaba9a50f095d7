use std::path::PathBuf;

use thiserror::Error;

use crate::identity::MediaKind;
use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Error reading directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error creating directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Per-entry failure of identity resolution. Recorded against the entry,
/// never propagated to siblings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("parse failure: {0}")]
    ParseFailure(String),

    #[error("no result")]
    NoResult,

    #[error("media type conflict: expected {expected}, found {found}")]
    MediaTypeConflict { expected: MediaKind, found: MediaKind },

    #[error("{0}")]
    MissingSelector(String),

    #[error("{0}")]
    NotFound(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<ProviderError> for ResolveError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NoResult => ResolveError::NoResult,
            ProviderError::NotFound(what) => ResolveError::NotFound(what),
            other => ResolveError::Provider(other.to_string()),
        }
    }
}

/// Per-entry failure of path planning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Unresolved(#[from] ResolveError),

    #[error("formatter produced no path components")]
    NoComponents,

    #[error("source and destination are the same")]
    IdenticalSourceDestination,

    #[error("duplicate source path")]
    DuplicateSource,

    #[error("could not deduplicate path")]
    DeduplicationExhausted,
}
