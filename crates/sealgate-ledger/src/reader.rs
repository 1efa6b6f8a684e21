//! LedgerReader trait: the abstract interface for read-only ledger queries.
//!
//! This trait keeps the entitlement core transport-agnostic. A production
//! implementation wraps an RPC client; tests use [`crate::MemoryLedger`].

use async_trait::async_trait;

use sealgate_core::{Address, ObjectId};

use crate::error::Result;
use crate::object::RawObject;

/// Read-only ledger queries.
///
/// All reads are point-in-time snapshots; the ledger's truth changes
/// asynchronously underneath them and consumers reconcile by polling.
///
/// # Design Notes
///
/// - **No writes**: transaction construction lives in `sealgate-core`;
///   execution is outside this system entirely.
/// - **Causal ordering within a tick**: callers fetch capabilities before
///   the records they govern. The trait itself imposes no ordering.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Fetch an object by id, content included.
    ///
    /// Returns `Ok(None)` if the object does not exist; transport faults
    /// surface as `ReadFailure`.
    async fn get_object(&self, id: &ObjectId) -> Result<Option<RawObject>>;

    /// List objects owned by `owner` whose type tag ends with `type_suffix`.
    async fn owned_objects(&self, owner: &Address, type_suffix: &str) -> Result<Vec<RawObject>>;

    /// List the child record names of a parent object.
    ///
    /// For a governing allowlist or service these are the content ids of
    /// the ciphertexts published under it.
    async fn child_ids(&self, parent: &ObjectId) -> Result<Vec<Vec<u8>>>;

    /// Fetch the current timestamp (ms) from the singleton clock object.
    async fn clock_ms(&self) -> Result<u64>;
}
