//! Session-key management: caching, reuse, and single-flight signing.
//!
//! The manager caches at most one key, scoped to one viewer address and
//! one authorization domain. Reuse always goes through the usability
//! check; an unusable key is replaced by a fresh create-and-sign, never
//! silently refreshed.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;

use sealgate_core::{Address, ObjectId};

use crate::error::{Result, SignerError};
use crate::key::{SessionKey, DEFAULT_TTL_MIN};

/// The external signing collaborator (wallet).
///
/// Signing is interactive: the viewer sees a prompt and may reject it.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign the fixed challenge message on behalf of the viewer.
    async fn sign_personal_message(
        &self,
        message: &[u8],
    ) -> std::result::Result<Vec<u8>, SignerError>;
}

/// Configuration for session-key management.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in minutes.
    pub ttl_min: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_min: DEFAULT_TTL_MIN,
        }
    }
}

/// Creates, signs, caches, and expires session keys.
///
/// Only one signature request may be outstanding at a time: `obtain`
/// serializes callers, so a concurrent caller waits for the in-flight
/// attempt and then reuses its key instead of issuing a second prompt.
pub struct SessionKeyManager<S: Signer> {
    signer: Arc<S>,
    package_id: ObjectId,
    config: SessionConfig,
    cached: Mutex<Option<SessionKey>>,
}

impl<S: Signer> SessionKeyManager<S> {
    /// Create a new manager scoped to one authorization domain.
    pub fn new(signer: Arc<S>, package_id: ObjectId, config: SessionConfig) -> Self {
        Self {
            signer,
            package_id,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Get a usable session key for `address`, signing a fresh one if the
    /// cached key is missing, expired, or bound to a different address.
    ///
    /// Holding the cache lock across the signing await is what enforces
    /// the single-in-flight rule.
    pub async fn obtain(&self, address: Address) -> Result<SessionKey> {
        let mut cached = self.cached.lock().await;

        if let Some(key) = cached.as_ref() {
            if key.is_usable(&address, now_millis()) {
                return Ok(key.clone());
            }
        }

        // Switching address or expiring invalidates rather than mutates.
        *cached = None;

        let mut key = SessionKey::new(address, self.package_id, self.config.ttl_min);
        tracing::debug!(address = %address, "requesting session signature");

        let signature = self
            .signer
            .sign_personal_message(&key.personal_message())
            .await?;

        key.attach_signature(signature, now_millis());
        *cached = Some(key.clone());
        Ok(key)
    }

    /// Drop the cached key, forcing the next `obtain` to re-sign.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Peek at the cached key without signing.
    pub async fn cached(&self) -> Option<SessionKey> {
        self.cached.lock().await.clone()
    }
}

/// Current wall-clock time in milliseconds.
///
/// Only used for session lifetimes; subscription validity always uses the
/// ledger clock.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingSigner {
        prompts: AtomicU64,
        reject: bool,
    }

    impl CountingSigner {
        fn new() -> Self {
            Self {
                prompts: AtomicU64::new(0),
                reject: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                prompts: AtomicU64::new(0),
                reject: true,
            }
        }
    }

    #[async_trait]
    impl Signer for CountingSigner {
        async fn sign_personal_message(
            &self,
            message: &[u8],
        ) -> std::result::Result<Vec<u8>, SignerError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent obtain() callers actually overlap here.
            tokio::task::yield_now().await;
            if self.reject {
                Err(SignerError::Rejected)
            } else {
                Ok(message.to_vec())
            }
        }
    }

    fn manager(signer: Arc<CountingSigner>) -> SessionKeyManager<CountingSigner> {
        SessionKeyManager::new(
            signer,
            ObjectId::from_bytes([0x11; 32]),
            SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_obtain_signs_once_then_reuses() {
        let signer = Arc::new(CountingSigner::new());
        let mgr = manager(signer.clone());
        let addr = Address::from_bytes([1; 32]);

        let a = mgr.obtain(addr).await.unwrap();
        let b = mgr.obtain(addr).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(signer.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_obtain_single_prompt() {
        let signer = Arc::new(CountingSigner::new());
        let mgr = Arc::new(manager(signer.clone()));
        let addr = Address::from_bytes([1; 32]);

        let m1 = mgr.clone();
        let m2 = mgr.clone();
        let (a, b) = tokio::join!(m1.obtain(addr), m2.obtain(addr));

        assert!(a.unwrap().is_usable(&addr, now_millis()));
        assert!(b.unwrap().is_usable(&addr, now_millis()));
        assert_eq!(signer.prompts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_address_switch_re_signs() {
        let signer = Arc::new(CountingSigner::new());
        let mgr = manager(signer.clone());

        let alice = Address::from_bytes([1; 32]);
        let bob = Address::from_bytes([2; 32]);

        let _ = mgr.obtain(alice).await.unwrap();
        let key = mgr.obtain(bob).await.unwrap();

        assert_eq!(key.address(), &bob);
        assert_eq!(signer.prompts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejection_leaves_no_half_signed_key() {
        let signer = Arc::new(CountingSigner::rejecting());
        let mgr = manager(signer);
        let addr = Address::from_bytes([1; 32]);

        let err = mgr.obtain(addr).await.unwrap_err();
        assert!(matches!(err, crate::error::SessionError::SignatureRejected));
        assert!(mgr.cached().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_prompt() {
        let signer = Arc::new(CountingSigner::new());
        let mgr = manager(signer.clone());
        let addr = Address::from_bytes([1; 32]);

        let _ = mgr.obtain(addr).await.unwrap();
        mgr.invalidate().await;
        let _ = mgr.obtain(addr).await.unwrap();

        assert_eq!(signer.prompts.load(Ordering::SeqCst), 2);
    }
}
