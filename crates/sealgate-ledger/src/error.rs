//! Error types for ledger access.

use thiserror::Error;

use sealgate_core::ObjectId;

/// Errors that can occur reading from the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A read failed in transit. Transient; the next poll tick retries
    /// implicitly, never within the same tick.
    #[error("ledger read failed: {0}")]
    ReadFailure(String),

    /// The object exists but its content did not decode to the expected
    /// shape.
    #[error("malformed object {id}: {reason}")]
    Malformed {
        /// The offending object.
        id: ObjectId,
        /// What was wrong with it.
        reason: String,
    },

    /// The object does not exist on the ledger.
    #[error("object not found: {0}")]
    NotFound(ObjectId),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
