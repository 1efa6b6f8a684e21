//! Strong type definitions for Sealgate.
//!
//! Ledger identifiers are newtypes to prevent misuse at compile time.
//! Both object ids and account addresses are 32 bytes, displayed as
//! `0x`-prefixed hex the way the ledger renders them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte ledger object identifier.
///
/// Identifies any on-ledger object: allowlists, services, subscriptions,
/// capabilities, and the singleton clock.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub [u8; 32]);

impl ObjectId {
    /// Create a new ObjectId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero object id (used as a sentinel in tests).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..18])
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte account address.
///
/// Distinct from [`ObjectId`] so an address can never be passed where an
/// object id is expected, and vice versa.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..18])
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// The id of the singleton on-ledger clock object.
///
/// The clock's `timestamp_ms` field is the only time source used for
/// subscription validity; local clocks are never consulted.
pub const CLOCK_OBJECT_ID: ObjectId = {
    let mut bytes = [0u8; 32];
    bytes[31] = 0x06;
    ObjectId(bytes)
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_hex_roundtrip() {
        let id = ObjectId::from_bytes([0x42; 32]);
        let hex = id.to_hex();
        assert!(hex.starts_with("0x"));
        let recovered = ObjectId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_object_id_parse_without_prefix() {
        let id = ObjectId::from_bytes([0xab; 32]);
        let bare = hex::encode(id.as_bytes());
        assert_eq!(ObjectId::from_hex(&bare).unwrap(), id);
    }

    #[test]
    fn test_address_rejects_short_input() {
        assert!(Address::from_hex("0xdead").is_err());
    }

    #[test]
    fn test_clock_object_id() {
        assert_eq!(CLOCK_OBJECT_ID.as_bytes()[31], 0x06);
        assert!(CLOCK_OBJECT_ID.to_hex().ends_with("06"));
    }
}
