// tests/integration/transfer_test.rs

//! Integration tests for the atomic tail-to-head transfer between queues

use super::test_helpers::TestContext;
use std::time::Duration;

#[tokio::test]
async fn test_transfer_between_queues() {
    let ctx = TestContext::new().await;
    let source = ctx.queue("source");
    let target = ctx.queue("target");
    ctx.fill(&source, &["a", "b", "c"]).await;
    ctx.fill(&target, &["x"]).await;
    ctx.gateway.take_log();

    let moved = source.poll_last_and_offer_first_to_async("target").await.unwrap();
    assert_eq!(moved.as_deref(), Some("c"));
    assert_eq!(ctx.contents("source"), vec!["a", "b"]);
    assert_eq!(ctx.contents("target"), vec!["c", "x"]);
    assert_eq!(ctx.gateway.take_log(), vec!["LMOVE"]);
}

#[tokio::test]
async fn test_transfer_creates_the_target() {
    let ctx = TestContext::new().await;
    let source = ctx.queue("source");
    ctx.fill(&source, &["only"]).await;

    let moved = source.poll_last_and_offer_first_to_async("fresh").await.unwrap();
    assert_eq!(moved.as_deref(), Some("only"));
    assert!(ctx.contents("source").is_empty());
    assert_eq!(ctx.contents("fresh"), vec!["only"]);
}

#[tokio::test]
async fn test_transfer_to_self_rotates() {
    let ctx = TestContext::new().await;
    let ring = ctx.queue("ring");
    ctx.fill(&ring, &["a", "b", "c"]).await;

    let moved = ring.poll_last_and_offer_first_to_queue_async(&ring).await.unwrap();
    assert_eq!(moved.as_deref(), Some("c"));
    assert_eq!(ctx.contents("ring"), vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_transfer_from_empty_source() {
    let ctx = TestContext::new().await;
    let source = ctx.queue("empty");
    let target = ctx.queue("target");
    ctx.fill(&target, &["x"]).await;

    assert_eq!(
        source.poll_last_and_offer_first_to_queue_async(&target).await.unwrap(),
        None
    );
    assert_eq!(ctx.contents("target"), vec!["x"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_conserve_elements() {
    let ctx = TestContext::new().await;
    let left = ctx.queue("left");
    let right = ctx.queue("right");
    let values: Vec<String> = (0..50).map(|i| i.to_string()).collect();
    left.as_list().add_all_async(&values).await.unwrap();

    let mut pending = Vec::new();
    for i in 0..200 {
        if i % 2 == 0 {
            pending.push(left.poll_last_and_offer_first_to_async("right"));
        } else {
            pending.push(right.poll_last_and_offer_first_to_async("left"));
        }
    }
    for p in pending {
        p.await.unwrap();
    }

    let mut all = ctx.contents("left");
    all.extend(ctx.contents("right"));
    all.sort_by_key(|v| v.parse::<u32>().unwrap());
    assert_eq!(all, values);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_waiting_transfer_completes_when_source_fills() {
    let ctx = TestContext::new().await;
    let source = ctx.queue("source");
    let moving =
        source.poll_last_and_offer_first_to_timeout_async("target", Duration::from_secs(10));
    tokio::time::sleep(Duration::from_millis(50)).await;
    ctx.fill(&source, &["late"]).await;

    assert_eq!(moving.await.unwrap().as_deref(), Some("late"));
    assert_eq!(ctx.contents("target"), vec!["late"]);
}

#[tokio::test]
async fn test_waiting_transfer_times_out_with_none() {
    let ctx = TestContext::new().await;
    let source = ctx.queue("source");
    let moved = source
        .poll_last_and_offer_first_to_timeout_async("target", Duration::from_millis(1))
        .await
        .unwrap();
    assert_eq!(moved, None);
    assert!(ctx.gateway.is_empty());
}
