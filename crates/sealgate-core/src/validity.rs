//! Subscription validity.
//!
//! A subscription grants access at time `t` iff `created_at + ttl > t`,
//! where `t` is the ledger's own clock. The client-side check here is an
//! optimization to avoid doomed decryption calls; the decryption service
//! re-evaluates the same predicate on-ledger before releasing key material.

use crate::record::SubscriptionRecord;
use crate::types::ObjectId;

/// Whether a subscription record still grants access at `now_ms`.
///
/// `now_ms` must come from the ledger clock, never the local clock.
/// A ttl of zero is never valid.
pub fn is_active(record: &SubscriptionRecord, ttl_ms: u64, now_ms: u64) -> bool {
    record.created_at.saturating_add(ttl_ms) > now_ms
}

/// Milliseconds of validity remaining, or zero if expired.
pub fn remaining_ms(record: &SubscriptionRecord, ttl_ms: u64, now_ms: u64) -> u64 {
    record.created_at.saturating_add(ttl_ms).saturating_sub(now_ms)
}

/// Find a currently valid subscription for `service_id`.
///
/// Returns the first valid record in input order. When several valid
/// records exist for the same service any one of them authorizes, so the
/// choice only affects which id gets displayed; first-wins keeps the
/// result deterministic for a fixed ledger response.
pub fn find_active<'a>(
    records: &'a [SubscriptionRecord],
    service_id: &ObjectId,
    ttl_ms: u64,
    now_ms: u64,
) -> Option<&'a SubscriptionRecord> {
    records
        .iter()
        .filter(|r| &r.service_id == service_id)
        .find(|r| is_active(r, ttl_ms, now_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(created_at: u64) -> SubscriptionRecord {
        SubscriptionRecord {
            id: ObjectId::from_bytes([1; 32]),
            service_id: ObjectId::from_bytes([2; 32]),
            created_at,
        }
    }

    #[test]
    fn test_valid_inside_window() {
        // created_at 1000, ttl 10 min
        let r = record(1000);
        assert!(is_active(&r, 600_000, 600_999));
        assert!(!is_active(&r, 600_000, 601_000));
    }

    #[test]
    fn test_boundary() {
        let r = record(100);
        // boundary itself is expired, one ms earlier is not
        assert!(!is_active(&r, 50, 150));
        assert!(is_active(&r, 50, 149));
    }

    #[test]
    fn test_zero_ttl_never_valid() {
        // The ledger clock never runs behind a record's creation time.
        let r = record(1000);
        assert!(!is_active(&r, 0, 1000));
        assert!(!is_active(&r, 0, 1001));
        assert!(!is_active(&r, 0, u64::MAX));
    }

    #[test]
    fn test_remaining_ms() {
        let r = record(1000);
        assert_eq!(remaining_ms(&r, 600_000, 1000), 600_000);
        assert_eq!(remaining_ms(&r, 600_000, 400_000), 201_000);
        assert_eq!(remaining_ms(&r, 600_000, 700_000), 0);
    }

    #[test]
    fn test_find_active_filters_by_service() {
        let service = ObjectId::from_bytes([2; 32]);
        let other = ObjectId::from_bytes([9; 32]);
        let records = vec![
            SubscriptionRecord { id: ObjectId::from_bytes([3; 32]), service_id: other, created_at: 0 },
            SubscriptionRecord { id: ObjectId::from_bytes([4; 32]), service_id: service, created_at: 0 },
            SubscriptionRecord { id: ObjectId::from_bytes([5; 32]), service_id: service, created_at: 500 },
        ];
        // first record matches the other service, second is expired
        let found = find_active(&records, &service, 100, 400).unwrap();
        assert_eq!(found.id, ObjectId::from_bytes([5; 32]));
    }

    #[test]
    fn test_find_active_none_when_all_expired() {
        let service = ObjectId::from_bytes([2; 32]);
        let records = vec![record(0), record(10)];
        assert!(find_active(&records, &service, 100, 1000).is_none());
    }

    proptest! {
        #[test]
        fn prop_active_iff_window_open(created_at: u64, ttl: u64, now: u64) {
            let r = record(created_at);
            let expected = created_at.saturating_add(ttl) > now;
            prop_assert_eq!(is_active(&r, ttl, now), expected);
        }

        #[test]
        fn prop_remaining_zero_iff_inactive(created_at: u64, ttl: u64, now: u64) {
            let r = record(created_at);
            prop_assert_eq!(remaining_ms(&r, ttl, now) > 0, is_active(&r, ttl, now));
        }
    }
}
