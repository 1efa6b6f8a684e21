//! # Sealgate Client
//!
//! The entitlement and decrypt-orchestration layer: a polling cache that
//! materializes who-may-decrypt-what from the ledger, and a batch state
//! machine that turns entitlement into plaintext via the decryption
//! service.
//!
//! ## Components
//!
//! - [`AccessRecordCache`] - polls the ledger, publishes immutable
//!   entitlement snapshots over a watch channel
//! - [`DecryptOrchestrator`] - per-batch state machine: session, proof,
//!   fetch, decrypt, aggregate
//! - [`SealgateClient`] - unified facade over both, scoped to one viewer
//!
//! ## Consistency model
//!
//! The ledger's truth changes asynchronously and is polled, not pushed.
//! Snapshots are eventually consistent; the decryption service re-checks
//! authorization on-ledger regardless of what a snapshot says.

pub mod cache;
pub mod cancel;
pub mod client;
pub mod collab;
pub mod error;
pub mod orchestrate;

pub use cache::{
    AccessRecordCache, AllowlistEntry, CacheHandle, Feed, ServiceEntry, Snapshot,
    ADMIN_POLL_INTERVAL, FEED_POLL_INTERVAL,
};
pub use cancel::{CancelToken, Canceller};
pub use client::{ClientConfig, SealgateClient};
pub use collab::{BlobError, BlobStore, KeyService, KeyServiceError};
pub use error::DecryptError;
pub use orchestrate::{
    BatchFailure, BatchResult, DecryptOrchestrator, DecryptRequest, DecryptionOutcome,
};
