//! Error types for rmediator.

use thiserror::Error;

use crate::cache::CacheError;
use crate::database::RepoError;
use crate::domain::DomainError;

/// Main error type for dispatch and every layer of a handler chain.
///
/// Layers never wrap or rename an error raised further down the chain: whatever
/// the concrete handler returns is what the caller of
/// [`Mediator::send`](crate::mediator::Mediator::send) receives.
#[derive(Debug, Error)]
pub enum Error {
    /// No chain is registered for the dispatched request type.
    #[error("no handler registered for request type `{request_type}`")]
    Unregistered { request_type: &'static str },

    /// A second handler was registered for a request type at startup.
    #[error("a handler is already registered for request type `{request_type}`")]
    DuplicateHandler { request_type: &'static str },

    /// Domain validation rejected the request.
    #[error("validation failed: {0}")]
    Validation(#[from] DomainError),

    /// The entity addressed by the request does not exist.
    #[error("{entity} with id '{id}' was not found")]
    NotFound { entity: &'static str, id: String },

    /// The dispatch was cancelled through its [`CancelHandle`](crate::context::CancelHandle).
    #[error("request `{request_type}` was cancelled")]
    Cancelled { request_type: &'static str },

    /// The dispatch deadline elapsed before the chain completed.
    #[error("request `{request_type}` timed out")]
    TimedOut { request_type: &'static str },

    /// The cache store failed while the pipeline is configured to fail closed.
    #[error("cache store failure: {0}")]
    Cache(#[from] CacheError),

    /// The persistence collaborator failed.
    #[error("storage failure: {0}")]
    Storage(RepoError),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Free-form failure raised by a handler.
    #[error("{0}")]
    Handler(String),
}

impl From<RepoError> for Error {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, id } => Error::NotFound { entity, id },
            other => Error::Storage(other),
        }
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
