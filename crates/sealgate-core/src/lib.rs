//! # Sealgate Core
//!
//! Pure primitives for the Sealgate entitlement core: identifiers, access
//! records, subscription validity, and authorization call construction.
//!
//! This crate contains no I/O, no clocks, no cryptography. It is pure
//! computation over ledger data that something else fetched.
//!
//! ## Key Types
//!
//! - [`ObjectId`] / [`Address`] - strongly typed ledger identifiers
//! - [`Capability`] - proof of admin control over an allowlist or service
//! - [`ServiceTerms`] / [`SubscriptionRecord`] - a paid tier and a grant
//! - [`AuthDomain`] / [`CallSpec`] - authorization proof construction
//!
//! ## Validity
//!
//! A subscription grants access at time `t` iff `created_at + ttl > t`,
//! evaluated against the ledger clock. See [`validity`].

pub mod approve;
pub mod error;
pub mod record;
pub mod types;
pub mod validity;

pub use approve::{seal_approve, subscribe_tx, AuthDomain, CallArg, CallSpec, CallTarget, TxSpec};
pub use error::{CoreError, Result};
pub use record::{
    AllowlistRecord, Capability, ContentRef, DomainKind, ServiceTerms, SubscriptionRecord,
    ALLOWLIST_CAP_TYPE, SERVICE_CAP_TYPE, SUBSCRIPTION_TYPE,
};
pub use types::{Address, ObjectId, CLOCK_OBJECT_ID};
pub use validity::{find_active, is_active, remaining_ms};
