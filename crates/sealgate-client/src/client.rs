//! The unified Sealgate client.
//!
//! Ties the cache, session manager, and orchestrator together behind one
//! API for building viewer and admin surfaces.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use sealgate_core::{subscribe_tx, Address, AuthDomain, ObjectId, TxSpec};
use sealgate_ledger::LedgerReader;
use sealgate_session::{SessionConfig, SessionKeyManager, Signer};

use crate::cache::{
    AccessRecordCache, AllowlistEntry, CacheHandle, Feed, ServiceEntry, ADMIN_POLL_INTERVAL,
    FEED_POLL_INTERVAL,
};
use crate::cancel::CancelToken;
use crate::collab::{BlobStore, KeyService};
use crate::orchestrate::{BatchResult, DecryptOrchestrator, DecryptRequest};

/// Configuration for the unified client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Poll interval for viewer feed views.
    pub feed_interval: Duration,
    /// Poll interval for admin views.
    pub admin_interval: Duration,
    /// Session-key settings.
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            feed_interval: FEED_POLL_INTERVAL,
            admin_interval: ADMIN_POLL_INTERVAL,
            session: SessionConfig::default(),
        }
    }
}

/// The unified client: entitlement snapshots plus decrypt orchestration,
/// scoped to one connected viewer and one package.
pub struct SealgateClient<L, S: Signer, K: KeyService, B: BlobStore> {
    viewer: Address,
    cache: Arc<AccessRecordCache<L>>,
    orchestrator: DecryptOrchestrator<S, K, B>,
    config: ClientConfig,
    package: ObjectId,
}

impl<L, S: Signer, K: KeyService, B: BlobStore> std::fmt::Debug for SealgateClient<L, S, K, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealgateClient")
            .field("viewer", &self.viewer)
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}

impl<L, S, K, B> SealgateClient<L, S, K, B>
where
    L: LedgerReader + 'static,
    S: Signer,
    K: KeyService,
    B: BlobStore,
{
    /// Connect the client for a viewer.
    ///
    /// `viewer` is `None` when no wallet is connected; that is the one
    /// irrecoverable setup error that escalates to the caller.
    pub fn connect(
        viewer: Option<Address>,
        package: ObjectId,
        ledger: Arc<L>,
        signer: Arc<S>,
        key_service: Arc<K>,
        blobs: Arc<B>,
        config: ClientConfig,
    ) -> anyhow::Result<Self> {
        let viewer = viewer.context("no connected address")?;

        let cache = Arc::new(AccessRecordCache::new(ledger, viewer));
        let sessions = Arc::new(SessionKeyManager::new(
            signer,
            package,
            config.session.clone(),
        ));
        let orchestrator = DecryptOrchestrator::new(package, sessions, key_service, blobs);

        Ok(Self {
            viewer,
            cache,
            orchestrator,
            config,
            package,
        })
    }

    /// The connected viewer.
    pub fn viewer(&self) -> &Address {
        &self.viewer
    }

    /// Direct access to the entitlement cache.
    pub fn cache(&self) -> &Arc<AccessRecordCache<L>> {
        &self.cache
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entitlement views
    // ─────────────────────────────────────────────────────────────────────

    /// Start polling the viewer's allowlists (admin view).
    pub fn watch_owned_allowlists(&self) -> CacheHandle<Vec<AllowlistEntry>> {
        self.cache.spawn_owned_allowlists(self.config.admin_interval)
    }

    /// Start polling the viewer's services (admin view).
    pub fn watch_owned_services(&self) -> CacheHandle<Vec<ServiceEntry>> {
        self.cache.spawn_owned_services(self.config.admin_interval)
    }

    /// Start polling one service's feed (viewer view).
    pub fn watch_feed(&self, service_id: ObjectId) -> CacheHandle<Feed> {
        self.cache.spawn_feed(service_id, self.config.feed_interval)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Decrypt and purchase
    // ─────────────────────────────────────────────────────────────────────

    /// Decrypt everything in a feed snapshot.
    ///
    /// Routes to `SubscribeRequired` when the snapshot holds no valid
    /// subscription.
    pub async fn decrypt_feed(&self, feed: &Feed, cancel: &CancelToken) -> BatchResult {
        let request = DecryptRequest {
            domain: AuthDomain::Subscription {
                service_id: feed.terms.id,
                subscription_id: feed.subscription_id(),
            },
            content_ids: feed.content_ids.clone(),
            terms: Some(feed.terms.clone()),
        };
        self.orchestrator
            .decrypt_batch(self.viewer, request, cancel)
            .await
    }

    /// Decrypt content under an allowlist the viewer believes it is on.
    pub async fn decrypt_allowlisted(
        &self,
        allowlist_id: ObjectId,
        content_ids: Vec<Vec<u8>>,
        cancel: &CancelToken,
    ) -> BatchResult {
        let request = DecryptRequest {
            domain: AuthDomain::Allowlist {
                allowlist_id: Some(allowlist_id),
            },
            content_ids,
            terms: None,
        };
        self.orchestrator
            .decrypt_batch(self.viewer, request, cancel)
            .await
    }

    /// Build the purchase transaction for a service without going through
    /// a decrypt attempt.
    pub fn purchase_tx(&self, service_id: ObjectId, fee: u64) -> TxSpec {
        subscribe_tx(self.package, service_id, fee, self.viewer)
    }
}
