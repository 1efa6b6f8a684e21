//! External collaborator traits: the decryption service and the storage
//! network.
//!
//! The decryption service re-executes the authorization call against the
//! ledger before releasing key material; a locally valid check is never
//! sufficient on its own.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use sealgate_core::CallSpec;
use sealgate_session::SessionKey;

/// Errors from the threshold-decryption service.
#[derive(Debug, Error)]
pub enum KeyServiceError {
    /// The on-ledger re-check failed despite a locally valid credential.
    /// Surfaced verbatim; retrying without a state change cannot succeed.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The session credential was rejected (expired or mis-bound).
    #[error("session rejected: {0}")]
    SessionRejected(String),

    /// Decryption itself failed for this item.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The service could not be reached.
    #[error("key service unavailable: {0}")]
    Unavailable(String),
}

/// The threshold-decryption service.
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Decrypt one ciphertext, given the authorization call that proves
    /// entitlement and the session key that authenticates the requester.
    async fn decrypt(
        &self,
        ciphertext: Bytes,
        call: &CallSpec,
        session: &SessionKey,
    ) -> std::result::Result<Bytes, KeyServiceError>;
}

/// Errors from the content-addressed storage network.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No blob at this content id.
    #[error("blob not found")]
    NotFound,

    /// Transport or node fault.
    #[error("storage fault: {0}")]
    Fault(String),
}

/// The content-addressed storage network the ciphertexts live on.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch ciphertext bytes by content id.
    async fn fetch(&self, content_id: &[u8]) -> std::result::Result<Bytes, BlobError>;
}
