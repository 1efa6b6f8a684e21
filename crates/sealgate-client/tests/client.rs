//! End-to-end tests through the unified client facade.

use sealgate_client::{BatchResult, CancelToken, ClientConfig, SealgateClient};
use sealgate_testkit::{random_address, TestFixture};

const FEE: u64 = 5_000_000_000;
const TTL_MS: u64 = 600_000;

fn connect(
    fx: &TestFixture,
    viewer: Option<sealgate_core::Address>,
) -> anyhow::Result<
    SealgateClient<
        sealgate_ledger::MemoryLedger,
        sealgate_testkit::ScriptedSigner,
        sealgate_testkit::FakeKeyService,
        sealgate_testkit::MemoryBlobStore,
    >,
> {
    SealgateClient::connect(
        viewer,
        fx.package,
        fx.ledger.clone(),
        fx.signer.clone(),
        fx.key_service.clone(),
        fx.blobs.clone(),
        ClientConfig::default(),
    )
}

#[tokio::test]
async fn purchase_then_decrypt_then_expire() {
    let fx = TestFixture::new();
    let creator = random_address();
    let viewer = random_address();

    fx.ledger.set_clock(1_000_000);
    let terms = fx.seed_service(creator, "premium", FEE, TTL_MS);
    fx.publish_content(terms.id, b"ep-1", b"the plaintext");

    let client = connect(&fx, Some(viewer)).unwrap();

    // Before purchase: the feed has no subscription and decrypting routes
    // to the purchase flow, handing back the prepared transaction.
    let feed = client.cache().refresh_feed(terms.id).await.unwrap();
    assert_eq!(feed.subscription_id(), None);

    let result = client.decrypt_feed(&feed, &CancelToken::never()).await;
    let BatchResult::SubscribeRequired { purchase } = result else {
        panic!("expected SubscribeRequired, got {result:?}");
    };
    assert_eq!(purchase, client.purchase_tx(terms.id, FEE));

    // Purchase at T.
    let sub = fx.purchase(viewer, terms.id).await;

    // T + 599_999: inside the window; decrypt succeeds end to end.
    fx.ledger.set_clock(sub.created_at + TTL_MS - 1);
    let feed = client.cache().refresh_feed(terms.id).await.unwrap();
    assert_eq!(feed.subscription_id(), Some(sub.id));

    let result = client.decrypt_feed(&feed, &CancelToken::never()).await;
    let BatchResult::Done(outcomes) = result else {
        panic!("expected Done, got {result:?}");
    };
    assert_eq!(outcomes[0].result.as_ref().unwrap().as_ref(), b"the plaintext");
    let calls_after_decrypt = fx.key_service.call_count();

    // T + 600_001: past the window; short-circuits before the service.
    fx.ledger.set_clock(sub.created_at + TTL_MS + 1);
    let feed = client.cache().refresh_feed(terms.id).await.unwrap();
    assert_eq!(feed.subscription_id(), None);

    let result = client.decrypt_feed(&feed, &CancelToken::never()).await;
    assert!(matches!(result, BatchResult::SubscribeRequired { .. }));
    assert_eq!(fx.key_service.call_count(), calls_after_decrypt);
}

#[tokio::test]
async fn allowlisted_decrypt_through_facade() {
    let fx = TestFixture::new();
    let creator = random_address();
    let viewer = random_address();

    let allowlist = fx.seed_allowlist(creator, "friends", &[viewer]);
    fx.publish_content(allowlist, b"photo-1", b"cat picture");

    let client = connect(&fx, Some(viewer)).unwrap();
    let result = client
        .decrypt_allowlisted(allowlist, vec![b"photo-1".to_vec()], &CancelToken::never())
        .await;

    let BatchResult::Done(outcomes) = result else {
        panic!("expected Done, got {result:?}");
    };
    assert_eq!(outcomes[0].result.as_ref().unwrap().as_ref(), b"cat picture");
}

#[tokio::test]
async fn connecting_without_an_address_is_a_setup_error() {
    let fx = TestFixture::new();
    let err = connect(&fx, None).unwrap_err();
    assert!(err.to_string().contains("no connected address"));
}
