//! Access-record cache: polls the ledger and publishes entitlement
//! snapshots.
//!
//! Every tick re-reads the viewer's capability objects, the records they
//! govern, and (for viewer feeds) the subscription set and ledger clock.
//! Consumers subscribe to immutable snapshots over a watch channel; they
//! never mutate shared state.
//!
//! Reads within one tick are causally ordered (capabilities before their
//! governed records) but ticks are not ordered against each other: a slow
//! tick's result is discarded if a tick that started later has already
//! published.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use sealgate_core::{
    find_active, Address, AllowlistRecord, Capability, DomainKind, ObjectId, ServiceTerms,
    SubscriptionRecord, SUBSCRIPTION_TYPE,
};
use sealgate_ledger::{
    decode_allowlist, decode_capability, decode_service, decode_subscription, LedgerError,
    LedgerReader,
};

use crate::cancel::{CancelToken, Canceller};

/// Poll interval for viewer-facing list/feed views.
pub const FEED_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Poll interval for single-record admin views.
pub const ADMIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A versioned, immutable snapshot published on each refresh.
///
/// On refresh failure the last good `data` is retained and `error` is
/// set, so consumers always have something to show.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Start sequence of the tick that produced this snapshot.
    pub version: u64,
    /// Last successfully refreshed state, if any tick has succeeded.
    pub data: Option<T>,
    /// The most recent refresh failure, cleared on success.
    pub error: Option<String>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            version: 0,
            data: None,
            error: None,
        }
    }
}

/// One allowlist the viewer administers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistEntry {
    /// The capability proving admin rights.
    pub cap: Capability,
    /// The governed allowlist.
    pub record: AllowlistRecord,
}

/// One subscription service the viewer administers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// The capability proving admin rights.
    pub cap: Capability,
    /// The governed service's terms.
    pub terms: ServiceTerms,
}

/// A viewer's view of one subscription service: its terms, its content,
/// and whether the viewer currently holds a valid subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// The service's terms.
    pub terms: ServiceTerms,
    /// Content ids published under the service.
    pub content_ids: Vec<Vec<u8>>,
    /// The ledger clock at fetch time.
    pub clock_ms: u64,
    /// The viewer's currently valid subscription, if any, evaluated at
    /// `clock_ms`.
    pub subscription: Option<SubscriptionRecord>,
}

impl Feed {
    /// The valid subscription's id, if one exists.
    pub fn subscription_id(&self) -> Option<ObjectId> {
        self.subscription.map(|s| s.id)
    }
}

/// Materializes the viewer's entitlement state from the ledger.
///
/// `refresh_*` methods perform one tick's reads; `spawn_*` methods run
/// them on a fixed interval and publish snapshots until torn down.
pub struct AccessRecordCache<L> {
    ledger: Arc<L>,
    viewer: Address,
}

impl<L: LedgerReader + 'static> AccessRecordCache<L> {
    /// Create a cache for one viewer.
    pub fn new(ledger: Arc<L>, viewer: Address) -> Self {
        Self { ledger, viewer }
    }

    /// The viewer this cache is scoped to.
    pub fn viewer(&self) -> &Address {
        &self.viewer
    }

    // ─────────────────────────────────────────────────────────────────────
    // One-shot refreshes
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the allowlists the viewer administers.
    pub async fn refresh_owned_allowlists(&self) -> Result<Vec<AllowlistEntry>, LedgerError> {
        self.owned_allowlists_tick(&CancelToken::never()).await
    }

    /// Fetch the subscription services the viewer administers.
    pub async fn refresh_owned_services(&self) -> Result<Vec<ServiceEntry>, LedgerError> {
        self.owned_services_tick(&CancelToken::never()).await
    }

    /// Fetch one service's feed from the viewer's perspective.
    pub async fn refresh_feed(&self, service_id: ObjectId) -> Result<Feed, LedgerError> {
        self.feed_tick(service_id, &CancelToken::never()).await
    }

    async fn owned_allowlists_tick(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<AllowlistEntry>, LedgerError> {
        let kind = DomainKind::Allowlist;
        let caps = self.owned_caps(kind, cancel).await?;

        let mut entries = Vec::with_capacity(caps.len());
        for cap in caps {
            let raw = self.governed_object(&cap, cancel).await?;
            entries.push(AllowlistEntry {
                cap,
                record: decode_allowlist(&raw)?,
            });
        }
        Ok(entries)
    }

    async fn owned_services_tick(
        &self,
        cancel: &CancelToken,
    ) -> Result<Vec<ServiceEntry>, LedgerError> {
        let kind = DomainKind::Subscription;
        let caps = self.owned_caps(kind, cancel).await?;

        let mut entries = Vec::with_capacity(caps.len());
        for cap in caps {
            let raw = self.governed_object(&cap, cancel).await?;
            entries.push(ServiceEntry {
                cap,
                terms: decode_service(&raw)?,
            });
        }
        Ok(entries)
    }

    async fn feed_tick(
        &self,
        service_id: ObjectId,
        cancel: &CancelToken,
    ) -> Result<Feed, LedgerError> {
        guard(cancel)?;
        let content_ids = self.ledger.child_ids(&service_id).await?;

        guard(cancel)?;
        let raw = self
            .ledger
            .get_object(&service_id)
            .await?
            .ok_or(LedgerError::NotFound(service_id))?;
        let terms = decode_service(&raw)?;

        guard(cancel)?;
        let owned = self
            .ledger
            .owned_objects(&self.viewer, SUBSCRIPTION_TYPE)
            .await?;
        let records = owned
            .iter()
            .map(decode_subscription)
            .collect::<Result<Vec<_>, _>>()?;

        guard(cancel)?;
        let clock_ms = self.ledger.clock_ms().await?;

        let subscription = find_active(&records, &service_id, terms.ttl_ms, clock_ms).copied();

        Ok(Feed {
            terms,
            content_ids,
            clock_ms,
            subscription,
        })
    }

    /// List the viewer's capabilities of one kind. Capabilities are always
    /// fetched before the records they govern.
    async fn owned_caps(
        &self,
        kind: DomainKind,
        cancel: &CancelToken,
    ) -> Result<Vec<Capability>, LedgerError> {
        guard(cancel)?;
        let raws = self
            .ledger
            .owned_objects(&self.viewer, kind.cap_type())
            .await?;
        raws.iter().map(|raw| decode_capability(raw, kind)).collect()
    }

    async fn governed_object(
        &self,
        cap: &Capability,
        cancel: &CancelToken,
    ) -> Result<sealgate_ledger::RawObject, LedgerError> {
        guard(cancel)?;
        self.ledger
            .get_object(&cap.governs)
            .await?
            .ok_or(LedgerError::NotFound(cap.governs))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────────────

    /// Poll the viewer's allowlists on `interval`.
    pub fn spawn_owned_allowlists(
        self: &Arc<Self>,
        interval: Duration,
    ) -> CacheHandle<Vec<AllowlistEntry>> {
        let cache = Arc::clone(self);
        spawn_polling(interval, move |cancel| {
            let cache = Arc::clone(&cache);
            async move { cache.owned_allowlists_tick(&cancel).await }
        })
    }

    /// Poll the viewer's services on `interval`.
    pub fn spawn_owned_services(
        self: &Arc<Self>,
        interval: Duration,
    ) -> CacheHandle<Vec<ServiceEntry>> {
        let cache = Arc::clone(self);
        spawn_polling(interval, move |cancel| {
            let cache = Arc::clone(&cache);
            async move { cache.owned_services_tick(&cancel).await }
        })
    }

    /// Poll one service's feed on `interval`.
    pub fn spawn_feed(self: &Arc<Self>, service_id: ObjectId, interval: Duration) -> CacheHandle<Feed> {
        let cache = Arc::clone(self);
        spawn_polling(interval, move |cancel| {
            let cache = Arc::clone(&cache);
            async move { cache.feed_tick(service_id, &cancel).await }
        })
    }
}

fn guard(cancel: &CancelToken) -> Result<(), LedgerError> {
    if cancel.is_cancelled() {
        Err(LedgerError::ReadFailure("cache torn down".into()))
    } else {
        Ok(())
    }
}

/// Handle to a polling loop. Owns the loop's lifetime: dropping or
/// shutting down the handle stops all further reads and publishes.
pub struct CacheHandle<T> {
    canceller: Canceller,
    rx: watch::Receiver<Snapshot<T>>,
    task: JoinHandle<()>,
}

impl<T: Clone> CacheHandle<T> {
    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.rx.clone()
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// Stop the polling loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.canceller.cancel();
        let _ = self.task.await;
    }
}

fn spawn_polling<T, F, Fut>(interval: Duration, tick_fn: F) -> CacheHandle<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(CancelToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, LedgerError>> + Send + 'static,
{
    let canceller = Canceller::new();
    let token = canceller.token();
    let (tx, rx) = watch::channel(Snapshot::default());
    let tx = Arc::new(tx);
    // Start sequence of the last tick that published; later starts win.
    let last_published = Arc::new(Mutex::new(0u64));

    let loop_token = token.clone();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut seq = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = loop_token.cancelled() => break,
            }
            if loop_token.is_cancelled() {
                break;
            }

            seq += 1;
            let tick = tick_fn(loop_token.clone());
            let tx = Arc::clone(&tx);
            let last_published = Arc::clone(&last_published);
            let publish_token = loop_token.clone();

            // Ticks run detached so a slow read does not stall the timer;
            // the publish guard below keeps completion order honest.
            tokio::spawn(async move {
                let result = tick.await;
                publish(&tx, &last_published, &publish_token, seq, result);
            });
        }
        tracing::debug!("polling loop stopped");
    });

    CacheHandle {
        canceller,
        rx,
        task,
    }
}

fn publish<T: Clone>(
    tx: &watch::Sender<Snapshot<T>>,
    last_published: &Mutex<u64>,
    token: &CancelToken,
    seq: u64,
    result: Result<T, LedgerError>,
) {
    // Nothing is published after teardown.
    if token.is_cancelled() {
        return;
    }

    let mut last = last_published.lock().expect("publish lock poisoned");
    if seq < *last {
        tracing::debug!(seq, newest = *last, "discarding stale tick result");
        return;
    }
    *last = seq;

    let snapshot = match result {
        Ok(data) => Snapshot {
            version: seq,
            data: Some(data),
            error: None,
        },
        Err(e) => {
            tracing::warn!(seq, error = %e, "refresh failed; retaining last good snapshot");
            Snapshot {
                version: seq,
                data: tx.borrow().data.clone(),
                error: Some(e.to_string()),
            }
        }
    };
    let _ = tx.send(snapshot);
}
