//! Error types for the datacenter model.

use thiserror::Error;

use crate::plan::Action;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while manipulating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unable to apply {action}: precondition does not hold")]
    InapplicableAction { action: Action },

    #[error("invalid model: {0}")]
    Invalid(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}
