//! # Sealgate Session
//!
//! Session-key lifecycle: a short-lived credential is created unsigned,
//! becomes usable once the viewer's wallet signs its fixed challenge, and
//! expires after its ttl. The manager caches one key per address/domain
//! and guarantees at most one signature prompt in flight.

pub mod error;
pub mod key;
pub mod manager;

pub use error::{Result, SessionError, SignerError};
pub use key::{SessionKey, SessionState, DEFAULT_TTL_MIN};
pub use manager::{SessionConfig, SessionKeyManager, Signer};
