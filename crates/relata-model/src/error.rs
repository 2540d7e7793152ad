//! Model-level error types.

use crate::value::ValueKind;
use thiserror::Error;

/// Errors raised while coercing runtime values.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A value had a different shape than the consumer required.
    #[error("value kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A textual value could not be parsed into the target shape.
    #[error("unparseable value: {0}")]
    Unparseable(String),
}
