//! Error types for session management.

use thiserror::Error;

/// Errors from the external signing collaborator.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The viewer declined to sign the challenge.
    #[error("signature request rejected")]
    Rejected,

    /// The signer could not be reached or failed internally.
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Errors from session-key management.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The viewer rejected the signature prompt. Fatal to the current
    /// session attempt; the caller must retry explicitly.
    #[error("signature rejected by viewer")]
    SignatureRejected,

    /// The signing collaborator failed.
    #[error("signer error: {0}")]
    Signer(String),
}

impl From<SignerError> for SessionError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::Rejected => SessionError::SignatureRejected,
            SignerError::Unavailable(msg) => SessionError::Signer(msg),
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
