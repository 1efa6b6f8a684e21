//! Test fixtures and fake collaborators.
//!
//! A [`TestFixture`] wires an in-memory ledger, a scripted wallet signer,
//! a fake threshold-decryption service that really re-checks authorization
//! against the ledger, and an in-memory blob store. Seeding helpers build
//! the same object shapes the real ledger returns.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use sealgate_client::{BlobError, BlobStore, DecryptOrchestrator, KeyService, KeyServiceError};
use sealgate_core::{
    is_active, Address, CallArg, CallSpec, ObjectId, ServiceTerms, SubscriptionRecord,
};
use sealgate_ledger::{
    decode_allowlist, decode_subscription, LedgerReader, MemoryLedger, RawObject,
};
use sealgate_session::{SessionConfig, SessionKey, SessionKeyManager, Signer, SignerError};

/// A complete test environment for the entitlement core.
pub struct TestFixture {
    /// The package all contract calls target.
    pub package: ObjectId,
    /// The in-memory ledger.
    pub ledger: Arc<MemoryLedger>,
    /// The scripted wallet.
    pub signer: Arc<ScriptedSigner>,
    /// The fake decryption service, bound to `ledger`.
    pub key_service: Arc<FakeKeyService>,
    /// The in-memory storage network.
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestFixture {
    /// Create a fresh environment.
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        Self {
            package: random_id(),
            ledger: ledger.clone(),
            signer: Arc::new(ScriptedSigner::new()),
            key_service: Arc::new(FakeKeyService::new(ledger)),
            blobs: Arc::new(MemoryBlobStore::new()),
        }
    }

    /// A session manager wired to the fixture's signer.
    pub fn session_manager(&self) -> Arc<SessionKeyManager<ScriptedSigner>> {
        Arc::new(SessionKeyManager::new(
            self.signer.clone(),
            self.package,
            SessionConfig::default(),
        ))
    }

    /// An orchestrator wired to all fixture collaborators.
    pub fn orchestrator(
        &self,
    ) -> DecryptOrchestrator<ScriptedSigner, FakeKeyService, MemoryBlobStore> {
        DecryptOrchestrator::new(
            self.package,
            self.session_manager(),
            self.key_service.clone(),
            self.blobs.clone(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ledger seeding
    // ─────────────────────────────────────────────────────────────────────

    /// Create a subscription service with an admin capability for `owner`.
    pub fn seed_service(&self, owner: Address, name: &str, fee: u64, ttl_ms: u64) -> ServiceTerms {
        let service_id = random_id();
        self.ledger.put_object(
            None,
            RawObject {
                id: service_id,
                type_tag: format!("{}::subscription::Service", self.package.to_hex()),
                // The ledger renders u64 fields as strings.
                fields: json!({
                    "name": name,
                    "fee": fee.to_string(),
                    "ttl": ttl_ms.to_string(),
                    "owner": owner.to_hex(),
                }),
            },
        );
        self.ledger.put_object(
            Some(owner),
            RawObject {
                id: random_id(),
                type_tag: format!("{}::subscription::Cap", self.package.to_hex()),
                fields: json!({ "service_id": service_id.to_hex() }),
            },
        );
        ServiceTerms {
            id: service_id,
            name: name.to_string(),
            fee,
            ttl_ms,
            owner,
        }
    }

    /// Create an allowlist with an admin capability for `owner`.
    pub fn seed_allowlist(&self, owner: Address, name: &str, members: &[Address]) -> ObjectId {
        let allowlist_id = random_id();
        let list: Vec<String> = members.iter().map(Address::to_hex).collect();
        self.ledger.put_object(
            None,
            RawObject {
                id: allowlist_id,
                type_tag: format!("{}::allowlist::Allowlist", self.package.to_hex()),
                fields: json!({ "name": name, "list": list }),
            },
        );
        self.ledger.put_object(
            Some(owner),
            RawObject {
                id: random_id(),
                type_tag: format!("{}::allowlist::Cap", self.package.to_hex()),
                fields: json!({ "allowlist_id": allowlist_id.to_hex() }),
            },
        );
        allowlist_id
    }

    /// Record a purchase: a subscription for `viewer` created at the
    /// current ledger clock, as the subscribe transaction would.
    pub async fn purchase(&self, viewer: Address, service_id: ObjectId) -> SubscriptionRecord {
        let created_at = self.ledger.clock_ms().await.expect("ledger clock");
        let id = random_id();
        self.ledger.put_object(
            Some(viewer),
            RawObject {
                id,
                type_tag: format!("{}::subscription::Subscription", self.package.to_hex()),
                fields: json!({
                    "service_id": service_id.to_hex(),
                    "created_at": created_at.to_string(),
                }),
            },
        );
        SubscriptionRecord {
            id,
            service_id,
            created_at,
        }
    }

    /// Publish one ciphertext under a governing object: registers the
    /// child record, the blob, and the plaintext the fake service will
    /// release on authorized requests.
    pub fn publish_content(&self, governs: ObjectId, content_id: &[u8], plaintext: &[u8]) {
        let mut ciphertext = b"sealed:".to_vec();
        ciphertext.extend_from_slice(content_id);
        self.ledger.put_child(governs, content_id.to_vec());
        self.blobs.put(content_id, Bytes::from(ciphertext.clone()));
        self.key_service
            .register(ciphertext, Bytes::copy_from_slice(plaintext));
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A random viewer address.
pub fn random_address() -> Address {
    Address::from_bytes(rand::random())
}

/// A random object id.
pub fn random_id() -> ObjectId {
    ObjectId::from_bytes(rand::random())
}

// ─────────────────────────────────────────────────────────────────────────
// Scripted signer
// ─────────────────────────────────────────────────────────────────────────

/// A wallet that signs on demand, counting prompts. Can be told to reject
/// or to delay, so tests can overlap concurrent signature requests.
pub struct ScriptedSigner {
    prompts: AtomicU64,
    reject: AtomicBool,
    delay: Mutex<Duration>,
}

impl ScriptedSigner {
    /// A signer that approves instantly.
    pub fn new() -> Self {
        Self {
            prompts: AtomicU64::new(0),
            reject: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        }
    }

    /// How many prompts the viewer has seen.
    pub fn prompt_count(&self) -> u64 {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Reject (or stop rejecting) subsequent prompts.
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Delay each signature, simulating a viewer deliberating.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("signer lock poisoned") = delay;
    }
}

impl Default for ScriptedSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Signer for ScriptedSigner {
    async fn sign_personal_message(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().expect("signer lock poisoned");
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        if self.reject.load(Ordering::SeqCst) {
            Err(SignerError::Rejected)
        } else {
            // Opaque signature; the fake service only checks presence.
            Ok(message.to_vec())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Fake key service
// ─────────────────────────────────────────────────────────────────────────

/// A threshold-decryption service stand-in that re-executes the
/// authorization call against the fixture ledger before releasing
/// plaintext, exactly as the real service would.
pub struct FakeKeyService {
    ledger: Arc<MemoryLedger>,
    plaintexts: Mutex<HashMap<Vec<u8>, Bytes>>,
    failing: Mutex<HashSet<Vec<u8>>>,
    calls: AtomicU64,
}

impl FakeKeyService {
    /// Create a service bound to a ledger.
    pub fn new(ledger: Arc<MemoryLedger>) -> Self {
        Self {
            ledger,
            plaintexts: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Register the plaintext behind a ciphertext.
    pub fn register(&self, ciphertext: Vec<u8>, plaintext: Bytes) {
        self.plaintexts
            .lock()
            .expect("service lock poisoned")
            .insert(ciphertext, plaintext);
    }

    /// Make decryption of one ciphertext fail, authorization aside.
    pub fn fail_ciphertext(&self, ciphertext: &[u8]) {
        self.failing
            .lock()
            .expect("service lock poisoned")
            .insert(ciphertext.to_vec());
    }

    /// How many decrypt calls the service has received.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn authorize(&self, call: &CallSpec, session: &SessionKey) -> Result<(), KeyServiceError> {
        let target = format!("{}::{}", call.target.module, call.target.function);
        match target.as_str() {
            "subscription::seal_approve" => {
                let (sub_id, service_id) = match (&call.args[1], &call.args[2]) {
                    (CallArg::Object(s), CallArg::Object(v)) => (*s, *v),
                    _ => {
                        return Err(KeyServiceError::AuthorizationDenied(
                            "malformed call arguments".into(),
                        ))
                    }
                };
                let sub = self
                    .fetch(&sub_id)
                    .await?
                    .ok_or_else(|| KeyServiceError::AuthorizationDenied("no subscription".into()))?;
                let sub = decode_subscription(&sub)
                    .map_err(|e| KeyServiceError::AuthorizationDenied(e.to_string()))?;
                if sub.service_id != service_id {
                    return Err(KeyServiceError::AuthorizationDenied(
                        "subscription is for another service".into(),
                    ));
                }
                let service = self
                    .fetch(&service_id)
                    .await?
                    .ok_or_else(|| KeyServiceError::AuthorizationDenied("no service".into()))?;
                let terms = sealgate_ledger::decode_service(&service)
                    .map_err(|e| KeyServiceError::AuthorizationDenied(e.to_string()))?;
                let now = self
                    .ledger
                    .clock_ms()
                    .await
                    .map_err(|e| KeyServiceError::Unavailable(e.to_string()))?;
                if !is_active(&sub, terms.ttl_ms, now) {
                    return Err(KeyServiceError::AuthorizationDenied(
                        "subscription expired".into(),
                    ));
                }
                Ok(())
            }
            "allowlist::seal_approve" => {
                let allowlist_id = match &call.args[1] {
                    CallArg::Object(id) => *id,
                    _ => {
                        return Err(KeyServiceError::AuthorizationDenied(
                            "malformed call arguments".into(),
                        ))
                    }
                };
                let raw = self
                    .fetch(&allowlist_id)
                    .await?
                    .ok_or_else(|| KeyServiceError::AuthorizationDenied("no allowlist".into()))?;
                let allowlist = decode_allowlist(&raw)
                    .map_err(|e| KeyServiceError::AuthorizationDenied(e.to_string()))?;
                if !allowlist.contains(session.address()) {
                    return Err(KeyServiceError::AuthorizationDenied(
                        "address not on allowlist".into(),
                    ));
                }
                Ok(())
            }
            other => Err(KeyServiceError::AuthorizationDenied(format!(
                "unknown target {other}"
            ))),
        }
    }

    async fn fetch(&self, id: &ObjectId) -> Result<Option<RawObject>, KeyServiceError> {
        self.ledger
            .get_object(id)
            .await
            .map_err(|e| KeyServiceError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl KeyService for FakeKeyService {
    async fn decrypt(
        &self,
        ciphertext: Bytes,
        call: &CallSpec,
        session: &SessionKey,
    ) -> Result<Bytes, KeyServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !session.is_signed() {
            return Err(KeyServiceError::SessionRejected("unsigned session".into()));
        }
        self.authorize(call, session).await?;

        if self
            .failing
            .lock()
            .expect("service lock poisoned")
            .contains(ciphertext.as_ref())
        {
            return Err(KeyServiceError::Decryption("injected failure".into()));
        }
        self.plaintexts
            .lock()
            .expect("service lock poisoned")
            .get(ciphertext.as_ref())
            .cloned()
            .ok_or_else(|| KeyServiceError::Decryption("unknown ciphertext".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Memory blob store
// ─────────────────────────────────────────────────────────────────────────

/// In-memory content-addressed storage.
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<Vec<u8>, Bytes>>,
    fetches: AtomicU64,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Store a blob under a content id.
    pub fn put(&self, content_id: &[u8], blob: Bytes) {
        self.blobs
            .lock()
            .expect("blob lock poisoned")
            .insert(content_id.to_vec(), blob);
    }

    /// How many fetches have been served.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn fetch(&self, content_id: &[u8]) -> Result<Bytes, BlobError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .expect("blob lock poisoned")
            .get(content_id)
            .cloned()
            .ok_or(BlobError::NotFound)
    }
}
