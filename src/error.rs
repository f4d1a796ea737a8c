use thiserror::Error;

/// Failures reported by a persistence backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A unique field already holds this value.
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),

    #[error("{0}")]
    Backend(String),
}

/// Outcome of a service-layer operation that did not succeed.
///
/// Nothing below the HTTP layer knows how these map to status codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Missing, malformed or out-of-range input. Carries the joined field messages.
    #[error("{0}")]
    Validation(String),

    /// Missing or bad credentials. The message is deliberately generic.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate("username") => {
                ServiceError::Conflict("Username already exists".into())
            }
            StoreError::Duplicate(field) => {
                ServiceError::Conflict(format!("{field} already exists"))
            }
            StoreError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}
