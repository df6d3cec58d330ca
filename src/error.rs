use thiserror::Error;

use crate::source::SourceError;

/// Failures surfaced by the catalog access layer.
///
/// A `NotFound` answer from the content source is not represented here:
/// it is a valid terminal result and is cached like any other success.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The caller omitted or malformed a required identifier, or paired a
    /// resource type with an operation it does not support. Never retried.
    #[error("invalid catalog request: {message}")]
    InvalidRequest { message: String },
    /// The content source could not complete the request.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// A cache entry held a value kind its key does not produce.
    #[error("catalog invariant violated: {message}")]
    Invariant { message: String },
}

impl CatalogError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}
