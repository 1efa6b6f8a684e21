//! Raw ledger objects and typed decoding.
//!
//! Object content arrives as a JSON-shaped field bag; numeric fields come
//! back as strings as often as numbers, so decoding accepts both. Typed
//! decode helpers map missing or garbled fields to [`LedgerError::Malformed`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sealgate_core::{
    Address, AllowlistRecord, Capability, DomainKind, ObjectId, ServiceTerms, SubscriptionRecord,
};

use crate::error::{LedgerError, Result};

/// An object as fetched from the ledger, content included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObject {
    /// The object id.
    pub id: ObjectId,
    /// Full type tag, e.g. `<package>::subscription::Cap`.
    pub type_tag: String,
    /// The object's fields as returned by the ledger.
    pub fields: Value,
}

impl RawObject {
    /// Whether this object's type tag ends with the given suffix.
    ///
    /// Type tags are package-qualified; filters match on the
    /// `module::Struct` suffix.
    pub fn has_type(&self, suffix: &str) -> bool {
        self.type_tag.ends_with(suffix)
    }

    fn malformed(&self, reason: impl Into<String>) -> LedgerError {
        LedgerError::Malformed {
            id: self.id,
            reason: reason.into(),
        }
    }

    fn field(&self, name: &str) -> Result<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| self.malformed(format!("missing field `{name}`")))
    }

    fn str_field(&self, name: &str) -> Result<&str> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| self.malformed(format!("field `{name}` is not a string")))
    }

    /// Numeric fields may be rendered as JSON numbers or decimal strings.
    fn u64_field(&self, name: &str) -> Result<u64> {
        let value = self.field(name)?;
        if let Some(n) = value.as_u64() {
            return Ok(n);
        }
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.malformed(format!("field `{name}` is not a u64")))
    }

    fn id_field(&self, name: &str) -> Result<ObjectId> {
        ObjectId::from_hex(self.str_field(name)?)
            .map_err(|_| self.malformed(format!("field `{name}` is not an object id")))
    }

    fn address_field(&self, name: &str) -> Result<Address> {
        Address::from_hex(self.str_field(name)?)
            .map_err(|_| self.malformed(format!("field `{name}` is not an address")))
    }
}

/// Decode a capability object for the given domain.
///
/// Allowlist capabilities carry `allowlist_id`, service capabilities carry
/// `service_id`.
pub fn decode_capability(obj: &RawObject, kind: DomainKind) -> Result<Capability> {
    let governs = match kind {
        DomainKind::Allowlist => obj.id_field("allowlist_id")?,
        DomainKind::Subscription => obj.id_field("service_id")?,
    };
    Ok(Capability { id: obj.id, governs })
}

/// Decode an allowlist record.
pub fn decode_allowlist(obj: &RawObject) -> Result<AllowlistRecord> {
    let members = match obj.field("list")? {
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .and_then(|s| Address::from_hex(s).ok())
                    .ok_or_else(|| obj.malformed("entry in `list` is not an address"))
            })
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(obj.malformed("field `list` is not an array")),
    };
    Ok(AllowlistRecord {
        id: obj.id,
        name: obj.str_field("name")?.to_string(),
        members,
    })
}

/// Decode a subscription service's terms.
pub fn decode_service(obj: &RawObject) -> Result<ServiceTerms> {
    Ok(ServiceTerms {
        id: obj.id,
        name: obj.str_field("name")?.to_string(),
        fee: obj.u64_field("fee")?,
        ttl_ms: obj.u64_field("ttl")?,
        owner: obj.address_field("owner")?,
    })
}

/// Decode a purchased subscription record.
pub fn decode_subscription(obj: &RawObject) -> Result<SubscriptionRecord> {
    Ok(SubscriptionRecord {
        id: obj.id,
        service_id: obj.id_field("service_id")?,
        created_at: obj.u64_field("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(id_byte: u8, type_tag: &str, fields: Value) -> RawObject {
        RawObject {
            id: ObjectId::from_bytes([id_byte; 32]),
            type_tag: type_tag.to_string(),
            fields,
        }
    }

    #[test]
    fn test_decode_service_string_numbers() {
        let owner = Address::from_bytes([9; 32]);
        let raw = obj(
            1,
            "0x11::subscription::Service",
            json!({
                "name": "premium",
                "fee": "5000000000",
                "ttl": 600000,
                "owner": owner.to_hex(),
            }),
        );
        let terms = decode_service(&raw).unwrap();
        assert_eq!(terms.fee, 5_000_000_000);
        assert_eq!(terms.ttl_ms, 600_000);
        assert_eq!(terms.owner, owner);
    }

    #[test]
    fn test_decode_subscription() {
        let service = ObjectId::from_bytes([2; 32]);
        let raw = obj(
            3,
            "0x11::subscription::Subscription",
            json!({ "service_id": service.to_hex(), "created_at": "1000" }),
        );
        let sub = decode_subscription(&raw).unwrap();
        assert_eq!(sub.service_id, service);
        assert_eq!(sub.created_at, 1000);
    }

    #[test]
    fn test_decode_capability_both_kinds() {
        let governed = ObjectId::from_bytes([4; 32]);
        let a = obj(5, "0x11::allowlist::Cap", json!({ "allowlist_id": governed.to_hex() }));
        let s = obj(6, "0x11::subscription::Cap", json!({ "service_id": governed.to_hex() }));
        assert_eq!(decode_capability(&a, DomainKind::Allowlist).unwrap().governs, governed);
        assert_eq!(decode_capability(&s, DomainKind::Subscription).unwrap().governs, governed);
    }

    #[test]
    fn test_decode_allowlist() {
        let member = Address::from_bytes([7; 32]);
        let raw = obj(
            8,
            "0x11::allowlist::Allowlist",
            json!({ "name": "friends", "list": [member.to_hex()] }),
        );
        let list = decode_allowlist(&raw).unwrap();
        assert_eq!(list.name, "friends");
        assert_eq!(list.members, vec![member]);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let raw = obj(1, "0x11::subscription::Service", json!({ "name": "x" }));
        let err = decode_service(&raw).unwrap_err();
        assert!(matches!(err, LedgerError::Malformed { .. }));
    }

    #[test]
    fn test_has_type_suffix_match() {
        let raw = obj(1, "0xabc::subscription::Cap", json!({}));
        assert!(raw.has_type("subscription::Cap"));
        assert!(!raw.has_type("allowlist::Cap"));
    }
}
