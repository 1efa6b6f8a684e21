//! Error types for the client layer.
//!
//! Per-item decrypt failures are state, not exceptions: they accumulate
//! in the batch outcome and never abort sibling items. Only setup errors
//! (no connected address) escalate to the caller.

use thiserror::Error;

use sealgate_core::CoreError;

use crate::collab::{BlobError, KeyServiceError};

/// Why one content object failed to decrypt.
///
/// Scoped to a single item in a batch; sibling items proceed regardless.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// A required credential id was absent; no collaborator was contacted.
    #[error("not authorized: missing credential")]
    MissingCredential,

    /// The ciphertext could not be fetched from storage.
    #[error("blob fetch failed: {0}")]
    Blob(String),

    /// The decryption service's on-ledger re-check refused the request.
    /// Never silently retried.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The service rejected the session credential.
    #[error("session rejected: {0}")]
    SessionRejected(String),

    /// Decryption failed for this item.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The decryption service was unreachable.
    #[error("key service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The owning view was torn down before this item was scheduled.
    #[error("batch cancelled before this item ran")]
    Cancelled,
}

impl From<KeyServiceError> for DecryptError {
    fn from(e: KeyServiceError) -> Self {
        match e {
            KeyServiceError::AuthorizationDenied(msg) => DecryptError::AuthorizationDenied(msg),
            KeyServiceError::SessionRejected(msg) => DecryptError::SessionRejected(msg),
            KeyServiceError::Decryption(msg) => DecryptError::Decryption(msg),
            KeyServiceError::Unavailable(msg) => DecryptError::ServiceUnavailable(msg),
        }
    }
}

impl From<BlobError> for DecryptError {
    fn from(e: BlobError) -> Self {
        DecryptError::Blob(e.to_string())
    }
}

impl From<CoreError> for DecryptError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingCredential { .. } => DecryptError::MissingCredential,
            CoreError::InvalidId(msg) => DecryptError::Decryption(msg),
        }
    }
}
