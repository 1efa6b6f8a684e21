//! Session keys: short-lived, address-bound, signed credentials.
//!
//! A session key authorizes decryption requests without re-signing per
//! request. It starts unsigned, becomes usable once the bound address
//! signs its fixed challenge message, and expires after its ttl.

use serde::{Deserialize, Serialize};

use sealgate_core::{Address, ObjectId};

/// Default session lifetime in minutes.
pub const DEFAULT_TTL_MIN: u64 = 10;

/// Lifecycle state of a session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, challenge not yet signed.
    Unsigned,
    /// Signed and within its validity window.
    Signed,
    /// Signed but past its validity window.
    Expired,
}

/// A signed, time-boxed credential scoped to one viewer address and one
/// authorization domain (package).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    address: Address,
    package_id: ObjectId,
    ttl_min: u64,
    /// Set when the signature is attached; ms timestamp.
    created_at_ms: Option<u64>,
    /// The wallet's signature over the challenge message, once given.
    signature: Option<Vec<u8>>,
}

impl SessionKey {
    /// Create a new unsigned key.
    pub fn new(address: Address, package_id: ObjectId, ttl_min: u64) -> Self {
        Self {
            address,
            package_id,
            ttl_min,
            created_at_ms: None,
            signature: None,
        }
    }

    /// The address this key is bound to.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The authorization domain this key is scoped to.
    pub fn package_id(&self) -> &ObjectId {
        &self.package_id
    }

    /// The signature, if the challenge has been signed.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// The fixed challenge the bound address must sign.
    ///
    /// Derived from address, domain, and ttl; the same key always yields
    /// the same message.
    pub fn personal_message(&self) -> Vec<u8> {
        format!(
            "Requesting access to keys of package {} for {}, session valid for {} min",
            self.package_id.to_hex(),
            self.address.to_hex(),
            self.ttl_min,
        )
        .into_bytes()
    }

    /// Attach the wallet's signature, recording the creation timestamp.
    ///
    /// This is the UNSIGNED → SIGNED transition.
    pub fn attach_signature(&mut self, signature: Vec<u8>, now_ms: u64) {
        self.signature = Some(signature);
        self.created_at_ms = Some(now_ms);
    }

    /// Whether the challenge has been signed.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Whether the validity window has elapsed.
    ///
    /// An unsigned key is not expired; it is simply not yet usable.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.created_at_ms {
            Some(created) => now_ms.saturating_sub(created) >= self.ttl_min * 60_000,
            None => false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self, now_ms: u64) -> SessionState {
        if !self.is_signed() {
            SessionState::Unsigned
        } else if self.is_expired(now_ms) {
            SessionState::Expired
        } else {
            SessionState::Signed
        }
    }

    /// Whether this key authorizes requests from `requester` at `now_ms`.
    ///
    /// True iff signed, unexpired, and address-matched; the conjunction of
    /// exactly those three conditions.
    pub fn is_usable(&self, requester: &Address, now_ms: u64) -> bool {
        self.is_signed() && !self.is_expired(now_ms) && requester == &self.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    fn pkg() -> ObjectId {
        ObjectId::from_bytes([0x11; 32])
    }

    #[test]
    fn test_challenge_is_fixed() {
        let key = SessionKey::new(addr(1), pkg(), 10);
        assert_eq!(key.personal_message(), key.personal_message());

        let other = SessionKey::new(addr(2), pkg(), 10);
        assert_ne!(key.personal_message(), other.personal_message());
    }

    #[test]
    fn test_state_transitions() {
        let mut key = SessionKey::new(addr(1), pkg(), 10);
        assert_eq!(key.state(0), SessionState::Unsigned);

        key.attach_signature(vec![0xab], 1000);
        assert_eq!(key.state(1000), SessionState::Signed);
        assert_eq!(key.state(1000 + 10 * 60_000 - 1), SessionState::Signed);
        assert_eq!(key.state(1000 + 10 * 60_000), SessionState::Expired);
    }

    #[test]
    fn test_usable_is_exact_conjunction() {
        let me = addr(1);
        let someone_else = addr(2);

        // All eight combinations of (signed, unexpired, address-matched).
        for signed in [false, true] {
            for unexpired in [false, true] {
                for matched in [false, true] {
                    let mut key = SessionKey::new(me, pkg(), 10);
                    if signed {
                        key.attach_signature(vec![1], 0);
                    }
                    let now = if unexpired { 1 } else { 10 * 60_000 };
                    let requester = if matched { &me } else { &someone_else };

                    // An unsigned key is never expired, so the unexpired
                    // axis only varies once signed.
                    let expected = signed && !key.is_expired(now) && matched;
                    assert_eq!(key.is_usable(requester, now), expected);
                    if signed {
                        assert_eq!(key.is_usable(requester, now), unexpired && matched);
                    } else {
                        assert!(!key.is_usable(requester, now));
                    }
                }
            }
        }
    }
}
