//! # Sealgate Ledger
//!
//! Read-only ledger access: the [`LedgerReader`] trait, raw object
//! decoding, and an in-memory ledger for tests.
//!
//! The ledger is the source of truth for ownership, timestamps, and
//! authorization. This crate only reads it; write transactions are
//! constructed in `sealgate-core` and executed elsewhere.

pub mod error;
pub mod memory;
pub mod object;
pub mod reader;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use object::{
    decode_allowlist, decode_capability, decode_service, decode_subscription, RawObject,
};
pub use reader::LedgerReader;
