//! Authorization call construction.
//!
//! Builds the exact on-ledger call arguments a decryption service needs to
//! verify, by contract execution, that the caller is entitled to a content
//! object's key material. Also builds the purchase transaction for the
//! subscription flow. Everything here is pure and deterministic; nothing
//! executes a call.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::record::DomainKind;
use crate::types::{Address, ObjectId};

/// Gas budget attached to constructed write transactions.
pub const TX_GAS_BUDGET: u64 = 10_000_000;

/// Fully qualified target of one contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTarget {
    /// The published package the contract lives in.
    pub package: ObjectId,
    /// Module within the package.
    pub module: String,
    /// Function within the module.
    pub function: String,
}

impl CallTarget {
    fn new(package: ObjectId, module: &str, function: &str) -> Self {
        Self {
            package,
            module: module.to_string(),
            function: function.to_string(),
        }
    }
}

/// One argument of a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    /// Raw bytes passed by value.
    Pure(Vec<u8>),
    /// A shared or owned object reference.
    Object(ObjectId),
    /// An account address passed by value.
    Address(Address),
    /// A reference to the singleton ledger clock object.
    Clock,
    /// A fee coin carrying exactly this balance, split from the sender's gas.
    Coin { balance: u64 },
    /// The result of an earlier call in the same transaction, by index.
    Result(u16),
}

/// One contract call, ready to be embedded in a transaction or handed to
/// the decryption service as an authorization proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSpec {
    /// Where the call goes.
    pub target: CallTarget,
    /// Positional arguments.
    pub args: Vec<CallArg>,
}

/// A write transaction constructed (never executed) by this core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSpec {
    /// The address that must sign and submit.
    pub sender: Address,
    /// Gas budget in the smallest currency unit.
    pub gas_budget: u64,
    /// Calls, executed in order; later calls may reference earlier results.
    pub calls: Vec<CallSpec>,
}

/// The authorization domain a decrypt request runs under.
///
/// Credential ids are optional because the viewer may simply not hold
/// them; the builder turns their absence into [`CoreError::MissingCredential`]
/// before anything network-shaped happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthDomain {
    /// Content gated by an allowlist membership check.
    Allowlist {
        /// The governing allowlist, if known.
        allowlist_id: Option<ObjectId>,
    },
    /// Content gated by a valid subscription.
    Subscription {
        /// The service whose terms apply.
        service_id: ObjectId,
        /// The viewer's subscription record, if one exists.
        subscription_id: Option<ObjectId>,
    },
}

impl AuthDomain {
    /// Which kind of domain this is.
    pub fn kind(&self) -> DomainKind {
        match self {
            AuthDomain::Allowlist { .. } => DomainKind::Allowlist,
            AuthDomain::Subscription { .. } => DomainKind::Subscription,
        }
    }
}

/// Build the `seal_approve` call proving entitlement to one content object.
///
/// Allowlist variant: `[content_id, allowlist]` — membership is checked
/// on-ledger against the allowlist's address set.
///
/// Subscription variant: `[content_id, subscription, service, clock]` —
/// the contract re-evaluates the validity window against the ledger's own
/// clock at call time.
pub fn seal_approve(package: ObjectId, domain: &AuthDomain, content_id: &[u8]) -> Result<CallSpec> {
    match domain {
        AuthDomain::Allowlist { allowlist_id } => {
            let allowlist = allowlist_id.ok_or(CoreError::MissingCredential {
                domain: DomainKind::Allowlist,
            })?;
            Ok(CallSpec {
                target: CallTarget::new(package, "allowlist", "seal_approve"),
                args: vec![CallArg::Pure(content_id.to_vec()), CallArg::Object(allowlist)],
            })
        }
        AuthDomain::Subscription {
            service_id,
            subscription_id,
        } => {
            let subscription = subscription_id.ok_or(CoreError::MissingCredential {
                domain: DomainKind::Subscription,
            })?;
            Ok(CallSpec {
                target: CallTarget::new(package, "subscription", "seal_approve"),
                args: vec![
                    CallArg::Pure(content_id.to_vec()),
                    CallArg::Object(subscription),
                    CallArg::Object(*service_id),
                    CallArg::Clock,
                ],
            })
        }
    }
}

/// Build the purchase transaction: `subscribe(fee, service, clock)` followed
/// by `transfer(subscription, sender)` so the new record lands in the
/// buyer's account.
pub fn subscribe_tx(package: ObjectId, service_id: ObjectId, fee: u64, sender: Address) -> TxSpec {
    let subscribe = CallSpec {
        target: CallTarget::new(package, "subscription", "subscribe"),
        args: vec![
            CallArg::Coin { balance: fee },
            CallArg::Object(service_id),
            CallArg::Clock,
        ],
    };
    let transfer = CallSpec {
        target: CallTarget::new(package, "subscription", "transfer"),
        args: vec![CallArg::Result(0), CallArg::Address(sender)],
    };
    TxSpec {
        sender,
        gas_budget: TX_GAS_BUDGET,
        calls: vec![subscribe, transfer],
    }
}
