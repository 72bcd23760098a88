use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure errors for the durable store (spec.md §7 `NotFoundError`
/// and the store-layer half of `ValidationError`).
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} violates uniqueness constraint: {detail}")]
    UniqueViolation { entity: &'static str, detail: String },

    #[error("invalid status transition on {entity} {id}: {from} -> {to}")]
    InvalidTransition { entity: &'static str, id: String, from: String, to: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal store error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
