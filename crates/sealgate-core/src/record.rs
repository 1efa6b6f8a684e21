//! Access records: the on-ledger objects this core reads.
//!
//! These are read-only snapshots of ledger state. They are only ever
//! mutated by ledger transactions, which are outside this core; the
//! structs here are what a fetch materializes at one point in time.

use serde::{Deserialize, Serialize};

use crate::types::{Address, ObjectId};

/// Ledger type tag for allowlist admin capabilities.
pub const ALLOWLIST_CAP_TYPE: &str = "allowlist::Cap";

/// Ledger type tag for subscription-service admin capabilities.
pub const SERVICE_CAP_TYPE: &str = "subscription::Cap";

/// Ledger type tag for purchased subscription records.
pub const SUBSCRIPTION_TYPE: &str = "subscription::Subscription";

/// The two kinds of authorization domain a content object can live under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainKind {
    /// Creator-curated set of approved addresses.
    Allowlist,
    /// Time-bound paid access tier.
    Subscription,
}

impl DomainKind {
    /// The ledger type tag of the capability objects for this domain.
    pub fn cap_type(&self) -> &'static str {
        match self {
            DomainKind::Allowlist => ALLOWLIST_CAP_TYPE,
            DomainKind::Subscription => SERVICE_CAP_TYPE,
        }
    }
}

/// Proof of administrative control over one allowlist or service.
///
/// Owning a capability object is what makes an address an admin. Absence
/// of a capability is a distinct state, never inferred from empty fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// The capability object's own id.
    pub id: ObjectId,
    /// The allowlist or service this capability governs.
    pub governs: ObjectId,
}

/// A named set of approved viewer addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistRecord {
    /// The allowlist object id.
    pub id: ObjectId,
    /// Human-readable name chosen by the creator.
    pub name: String,
    /// Addresses permitted to decrypt content under this allowlist.
    pub members: Vec<Address>,
}

impl AllowlistRecord {
    /// Whether an address is on the list.
    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }
}

/// Terms of a paid access tier.
///
/// Fee and ttl are immutable after creation as far as this core is
/// concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTerms {
    /// The service object id.
    pub id: ObjectId,
    /// Human-readable name chosen by the creator.
    pub name: String,
    /// Subscription fee in the smallest currency unit.
    pub fee: u64,
    /// How long a purchased subscription stays valid, in milliseconds.
    pub ttl_ms: u64,
    /// The service creator.
    pub owner: Address,
}

/// One viewer's purchased access grant against a service.
///
/// Validity is derived from `created_at` and the service ttl; records are
/// never explicitly revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// The subscription object id.
    pub id: ObjectId,
    /// The service this subscription was purchased against.
    pub service_id: ObjectId,
    /// Ledger timestamp (ms) at purchase time.
    pub created_at: u64,
}

/// One ciphertext unit and the object governing access to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    /// Content identifier; also the blob address on the storage network.
    pub content_id: Vec<u8>,
    /// The allowlist or service that gates this content.
    pub governs: ObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_membership() {
        let a = Address::from_bytes([1; 32]);
        let b = Address::from_bytes([2; 32]);
        let list = AllowlistRecord {
            id: ObjectId::ZERO,
            name: "friends".into(),
            members: vec![a],
        };
        assert!(list.contains(&a));
        assert!(!list.contains(&b));
    }

    #[test]
    fn test_domain_cap_types_differ() {
        assert_ne!(
            DomainKind::Allowlist.cap_type(),
            DomainKind::Subscription.cap_type()
        );
    }
}
