//! # Sealgate Testkit
//!
//! Testing utilities for the Sealgate entitlement core.
//!
//! ## Overview
//!
//! - **Fixtures**: a [`TestFixture`] wiring the in-memory ledger, a
//!   scripted wallet, a fake decryption service, and an in-memory blob
//!   store into one environment
//! - **Generators**: proptest strategies for ids, records, and terms
//!
//! ## Example
//!
//! ```rust,ignore
//! use sealgate_testkit::{random_address, TestFixture};
//!
//! let fx = TestFixture::new();
//! let creator = random_address();
//! let terms = fx.seed_service(creator, "premium", 5_000_000_000, 600_000);
//! fx.publish_content(terms.id, b"episode-1", b"plaintext");
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    random_address, random_id, FakeKeyService, MemoryBlobStore, ScriptedSigner, TestFixture,
};
