//! Model construction errors.

use thiserror::Error;

/// Result type for model construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building model values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Register block has the wrong byte count.
    #[error("register block must be {expected} bytes, got {found}")]
    InvalidRegisterBlock {
        /// Required block length.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
}
