//! Polling-cache tests: snapshot content, failure retention, teardown.

use std::sync::Arc;
use std::time::Duration;

use sealgate_client::AccessRecordCache;
use sealgate_testkit::{random_address, TestFixture};

const FEE: u64 = 5_000_000_000;
const TTL_MS: u64 = 600_000;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn feed_refresh_finds_valid_subscription() {
    let fx = TestFixture::new();
    let creator = random_address();
    let viewer = random_address();

    fx.ledger.set_clock(1000);
    let terms = fx.seed_service(creator, "premium", FEE, TTL_MS);
    fx.publish_content(terms.id, b"ep-1", b"one");
    let sub = fx.purchase(viewer, terms.id).await;

    let cache = AccessRecordCache::new(fx.ledger.clone(), viewer);

    let feed = cache.refresh_feed(terms.id).await.unwrap();
    assert_eq!(feed.terms, terms);
    assert_eq!(feed.content_ids, vec![b"ep-1".to_vec()]);
    assert_eq!(feed.subscription_id(), Some(sub.id));

    // Validity is evaluated at the fetched ledger clock, so the same
    // record disappears once the clock passes the window.
    fx.ledger.set_clock(sub.created_at + TTL_MS);
    let feed = cache.refresh_feed(terms.id).await.unwrap();
    assert_eq!(feed.subscription_id(), None);
}

#[tokio::test]
async fn owned_views_pair_capabilities_with_records() {
    let fx = TestFixture::new();
    let creator = random_address();
    let member = random_address();

    let allowlist_id = fx.seed_allowlist(creator, "friends", &[member]);
    let terms = fx.seed_service(creator, "premium", FEE, TTL_MS);

    let cache = AccessRecordCache::new(fx.ledger.clone(), creator);

    let allowlists = cache.refresh_owned_allowlists().await.unwrap();
    assert_eq!(allowlists.len(), 1);
    assert_eq!(allowlists[0].cap.governs, allowlist_id);
    assert_eq!(allowlists[0].record.name, "friends");
    assert_eq!(allowlists[0].record.members, vec![member]);

    let services = cache.refresh_owned_services().await.unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].cap.governs, terms.id);
    assert_eq!(services[0].terms, terms);

    // A viewer with no capabilities sees the distinct no-capability state:
    // an empty set, not an error.
    let outsider_cache = AccessRecordCache::new(fx.ledger.clone(), member);
    assert!(outsider_cache.refresh_owned_allowlists().await.unwrap().is_empty());
    assert!(outsider_cache.refresh_owned_services().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn polling_retains_last_good_snapshot_on_failure() {
    init_tracing();
    let fx = TestFixture::new();
    let creator = random_address();
    let viewer = random_address();

    fx.ledger.set_clock(1000);
    let terms = fx.seed_service(creator, "premium", FEE, TTL_MS);
    fx.publish_content(terms.id, b"ep-1", b"one");

    let cache = Arc::new(AccessRecordCache::new(fx.ledger.clone(), viewer));
    let handle = cache.spawn_feed(terms.id, Duration::from_secs(3));

    // Let the first tick publish.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let good = handle.latest();
    assert!(good.data.is_some());
    assert!(good.error.is_none());

    // Subsequent ticks fail; the good data is retained, the error shown.
    fx.ledger.set_fail_reads(true);
    tokio::time::sleep(Duration::from_secs(4)).await;
    let degraded = handle.latest();
    assert!(degraded.version > good.version);
    assert_eq!(
        degraded.data.as_ref().map(|f| f.content_ids.clone()),
        good.data.as_ref().map(|f| f.content_ids.clone())
    );
    assert!(degraded.error.is_some());

    // The next tick after recovery clears the error.
    fx.ledger.set_fail_reads(false);
    tokio::time::sleep(Duration::from_secs(4)).await;
    let recovered = handle.latest();
    assert!(recovered.error.is_none());
    assert!(recovered.data.is_some());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_reads_and_publishes() {
    init_tracing();
    let fx = TestFixture::new();
    let creator = random_address();
    let viewer = random_address();

    fx.ledger.set_clock(1000);
    let terms = fx.seed_service(creator, "premium", FEE, TTL_MS);

    let cache = Arc::new(AccessRecordCache::new(fx.ledger.clone(), viewer));
    let handle = cache.spawn_feed(terms.id, Duration::from_secs(3));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let before = handle.latest();
    assert!(before.data.is_some());

    let rx = handle.subscribe();
    handle.shutdown().await;

    // Give any straggling tick task a chance to run, then observe.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let reads_after_shutdown = fx.ledger.read_count();
    let version_after_shutdown = rx.borrow().version;

    // Many poll intervals later: no reads, no publishes.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fx.ledger.read_count(), reads_after_shutdown);
    assert_eq!(rx.borrow().version, version_after_shutdown);
}

#[tokio::test(start_paused = true)]
async fn polling_feed_drives_subscribe_required_after_expiry() {
    let fx = TestFixture::new();
    let creator = random_address();
    let viewer = random_address();

    fx.ledger.set_clock(1_000_000);
    let terms = fx.seed_service(creator, "premium", FEE, TTL_MS);
    fx.publish_content(terms.id, b"ep-1", b"one");
    let sub = fx.purchase(viewer, terms.id).await;

    let cache = Arc::new(AccessRecordCache::new(fx.ledger.clone(), viewer));
    let handle = cache.spawn_feed(terms.id, Duration::from_secs(3));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let feed = handle.latest().data.unwrap();
    assert_eq!(feed.subscription_id(), Some(sub.id));

    // Expire on-ledger; the next tick flips the snapshot, which is what
    // routes the next decrypt attempt to the purchase flow.
    fx.ledger.set_clock(sub.created_at + TTL_MS + 1);
    tokio::time::sleep(Duration::from_secs(4)).await;
    let feed = handle.latest().data.unwrap();
    assert_eq!(feed.subscription_id(), None);

    handle.shutdown().await;
}
