//! Error types for osml

use std::time::Duration;
use thiserror::Error;

/// Main error type for osml operations
#[derive(Error, Debug)]
pub enum Error {
    /// No catalog entry matched the identifier through any resolution tier.
    #[error("model not found: '{identifier}'")]
    ModelNotFound { identifier: String },

    /// A partial-match identifier failed to compile as a pattern.
    ///
    /// Distinct from [`Error::ModelNotFound`]: a malformed pattern is a
    /// client error, not an empty result.
    #[error("invalid identifier pattern '{pattern}': {reason}")]
    InvalidIdentifierPattern { pattern: String, reason: String },

    /// The cluster reported the task as FAILED. The reason is the cluster's
    /// error text, verbatim.
    #[error("task '{task_id}' failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    /// The task did not reach a terminal state within the polling timeout.
    #[error("task '{task_id}' timed out after {elapsed:?}")]
    TaskTimeout { task_id: String, elapsed: Duration },

    /// Model registration failed; wraps the underlying task failure.
    #[error("registration of model '{name}' failed")]
    Registration {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Model registration timed out; wraps the underlying task timeout.
    #[error("registration of model '{name}' timed out after {elapsed:?}")]
    RegistrationTimeout {
        name: String,
        elapsed: Duration,
        #[source]
        source: Box<Error>,
    },

    /// The cluster answered with a non-success HTTP status.
    #[error("cluster API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced a usable HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The cluster answered, but not in the shape we expect.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a model-not-found error
    pub fn model_not_found(identifier: impl Into<String>) -> Self {
        Error::ModelNotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Create an unexpected-response error
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Error::UnexpectedResponse(msg.into())
    }

    /// True for both registration error flavors (timeout is a subtype of
    /// registration failure).
    pub fn is_registration_failure(&self) -> bool {
        matches!(
            self,
            Error::Registration { .. } | Error::RegistrationTimeout { .. }
        )
    }

    /// True when resolution found nothing for the identifier.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ModelNotFound { .. })
    }
}
