//! In-memory implementation of the LedgerReader trait.
//!
//! This is primarily for testing. The clock is settable, reads can be
//! made to fail to exercise transient-error paths, and every read is
//! counted so tests can assert that teardown really stopped the polling
//! loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use sealgate_core::{Address, ObjectId};

use crate::error::{LedgerError, Result};
use crate::object::RawObject;
use crate::reader::LedgerReader;

/// In-memory ledger for tests.
///
/// All state is lost when dropped. Thread-safe via RwLock; the clock and
/// failure toggle are atomics so tests can flip them mid-run.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
    clock_ms: AtomicU64,
    fail_reads: AtomicBool,
    read_count: AtomicU64,
}

#[derive(Default)]
struct MemoryLedgerInner {
    /// Objects by id, with an optional owner for owned-object queries.
    objects: HashMap<ObjectId, (Option<Address>, RawObject)>,

    /// Child record names by parent object.
    children: HashMap<ObjectId, Vec<Vec<u8>>>,
}

impl MemoryLedger {
    /// Create a new empty ledger with the clock at zero.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner::default()),
            clock_ms: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            read_count: AtomicU64::new(0),
        }
    }

    /// Insert or replace an object, optionally marking its owner.
    pub fn put_object(&self, owner: Option<Address>, object: RawObject) {
        let mut inner = self.inner.write().expect("ledger lock poisoned");
        inner.objects.insert(object.id, (owner, object));
    }

    /// Remove an object.
    pub fn remove_object(&self, id: &ObjectId) {
        let mut inner = self.inner.write().expect("ledger lock poisoned");
        inner.objects.remove(id);
    }

    /// Append a child record name under a parent object.
    pub fn put_child(&self, parent: ObjectId, name: Vec<u8>) {
        let mut inner = self.inner.write().expect("ledger lock poisoned");
        inner.children.entry(parent).or_default().push(name);
    }

    /// Set the ledger clock.
    pub fn set_clock(&self, now_ms: u64) {
        self.clock_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Advance the ledger clock.
    pub fn advance_clock(&self, delta_ms: u64) {
        self.clock_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Make all subsequent reads fail with `ReadFailure`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// How many reads have been served (or rejected) so far.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(LedgerError::ReadFailure("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerReader for MemoryLedger {
    async fn get_object(&self, id: &ObjectId) -> Result<Option<RawObject>> {
        self.check()?;
        let inner = self.inner.read().expect("ledger lock poisoned");
        Ok(inner.objects.get(id).map(|(_, obj)| obj.clone()))
    }

    async fn owned_objects(&self, owner: &Address, type_suffix: &str) -> Result<Vec<RawObject>> {
        self.check()?;
        let inner = self.inner.read().expect("ledger lock poisoned");
        let mut matches: Vec<RawObject> = inner
            .objects
            .values()
            .filter(|(o, obj)| o.as_ref() == Some(owner) && obj.has_type(type_suffix))
            .map(|(_, obj)| obj.clone())
            .collect();
        // HashMap iteration order is arbitrary; keep results stable for tests
        matches.sort_by_key(|obj| obj.id.0);
        Ok(matches)
    }

    async fn child_ids(&self, parent: &ObjectId) -> Result<Vec<Vec<u8>>> {
        self.check()?;
        let inner = self.inner.read().expect("ledger lock poisoned");
        Ok(inner.children.get(parent).cloned().unwrap_or_default())
    }

    async fn clock_ms(&self) -> Result<u64> {
        self.check()?;
        Ok(self.clock_ms.load(Ordering::SeqCst))
    }
}
