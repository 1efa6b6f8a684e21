//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealgate_core::{Address, ObjectId, ServiceTerms, SubscriptionRecord};

/// Generate a random ObjectId.
pub fn object_id() -> impl Strategy<Value = ObjectId> {
    any::<[u8; 32]>().prop_map(ObjectId::from_bytes)
}

/// Generate a random Address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::from_bytes)
}

/// Generate a reasonable ledger timestamp (ms).
pub fn timestamp_ms() -> impl Strategy<Value = u64> {
    0u64..=u64::MAX / 2
}

/// Generate a subscription ttl, skewed toward realistic short windows.
pub fn ttl_ms() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        1u64..=1000,
        60_000u64..=86_400_000,
    ]
}

/// Generate a subscription record.
pub fn subscription_record() -> impl Strategy<Value = SubscriptionRecord> {
    (object_id(), object_id(), timestamp_ms()).prop_map(|(id, service_id, created_at)| {
        SubscriptionRecord {
            id,
            service_id,
            created_at,
        }
    })
}

/// Generate service terms.
pub fn service_terms() -> impl Strategy<Value = ServiceTerms> {
    (object_id(), "[a-z]{1,16}", 0u64..=10_000_000_000, ttl_ms(), address()).prop_map(
        |(id, name, fee, ttl_ms, owner)| ServiceTerms {
            id,
            name,
            fee,
            ttl_ms,
            owner,
        },
    )
}
