//! Error types for Sealgate core.

use thiserror::Error;

use crate::record::DomainKind;

/// Errors from pure core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required credential id is absent.
    ///
    /// Must short-circuit before any network call is attempted.
    #[error("missing credential for {domain:?} domain")]
    MissingCredential {
        /// Which domain the credential was required for.
        domain: DomainKind,
    },

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
