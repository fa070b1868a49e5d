// tests/integration/queue_test.rs

//! Integration tests for queue operations
//! Tests: offer, poll, peek, element, remove, poll with timeout, absence policies

use super::test_helpers::TestContext;
use spineldb_collections::config::ClientConfig;
use spineldb_collections::core::commands::AbsentReplyPolicy;
use spineldb_collections::{BytesCodec, CollectionError, JsonCodec};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ===== FIFO behaviour =====

#[tokio::test]
async fn test_offer_then_poll_is_fifo() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("jobs");
    ctx.fill(&queue, &["1", "2", "3"]).await;

    assert_eq!(queue.poll_async().await.unwrap().as_deref(), Some("1"));
    assert_eq!(queue.peek_async().await.unwrap().as_deref(), Some("2"));
    assert_eq!(queue.poll_async().await.unwrap().as_deref(), Some("2"));
    assert_eq!(queue.poll_async().await.unwrap().as_deref(), Some("3"));
    assert_eq!(queue.poll_async().await.unwrap(), None);
    assert_eq!(queue.peek_async().await.unwrap(), None);
}

#[tokio::test]
async fn test_offer_appends_at_tail() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("jobs");
    ctx.fill(&queue, &["a", "b"]).await;
    assert_eq!(ctx.contents("jobs"), vec!["a", "b"]);
}

#[tokio::test]
async fn test_each_operation_sends_one_command() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("jobs");
    queue.offer_async(&"a".to_string()).await.unwrap();
    queue.peek_async().await.unwrap();
    queue.element_async().await.unwrap();
    queue.poll_async().await.unwrap();
    queue.remove_async().await.unwrap_err();
    assert_eq!(
        ctx.gateway.take_log(),
        vec!["RPUSH", "LINDEX", "LINDEX", "LPOP", "LPOP"]
    );
}

// ===== Absence =====

#[tokio::test]
async fn test_empty_queue_faults_on_element_and_remove() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("empty");
    assert_eq!(queue.element_async().await, Err(CollectionError::NoSuchElement));
    assert_eq!(queue.get_first_async().await, Err(CollectionError::NoSuchElement));
    assert_eq!(queue.remove_async().await, Err(CollectionError::NoSuchElement));
    assert_eq!(queue.remove_first_async().await, Err(CollectionError::NoSuchElement));
    assert!(queue.is_empty_async().await.unwrap());
}

#[tokio::test]
async fn test_empty_payload_is_a_value_by_default() {
    let ctx = TestContext::new().await;
    let queue = ctx.client.get_queue::<Bytes, _>("raw", BytesCodec);
    queue.offer_async(&Bytes::new()).await.unwrap();
    assert_eq!(queue.peek_async().await.unwrap(), Some(Bytes::new()));
    assert_eq!(queue.poll_async().await.unwrap(), Some(Bytes::new()));
    assert_eq!(queue.poll_async().await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_payload_is_absent_under_null_or_empty_policy() {
    let config = ClientConfig {
        absent_reply: AbsentReplyPolicy::NullOrEmpty,
        ..ClientConfig::default()
    };
    let ctx = TestContext::with_config(config).await;
    let queue = ctx.client.get_queue::<Bytes, _>("raw", BytesCodec);
    queue.offer_async(&Bytes::new()).await.unwrap();
    assert_eq!(queue.peek_async().await.unwrap(), None);
    assert_eq!(queue.element_async().await, Err(CollectionError::NoSuchElement));
    // The element is still popped from the store.
    assert_eq!(queue.poll_async().await.unwrap(), None);
    assert!(queue.is_empty_async().await.unwrap());
}

#[tokio::test]
async fn test_encoded_null_is_a_present_element() {
    let ctx = TestContext::new().await;
    let queue = ctx.client.get_queue::<Option<u32>, _>("nullable", JsonCodec);
    queue.offer_async(&None).await.unwrap();
    assert_eq!(queue.poll_async().await.unwrap(), Some(None));
    assert_eq!(queue.poll_async().await.unwrap(), None);
}

// ===== Codecs =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Job {
    id: u64,
    name: String,
}

#[tokio::test]
async fn test_structured_values_round_trip_through_the_store() {
    let ctx = TestContext::new().await;
    let queue = ctx.client.get_queue("structured", JsonCodec);
    let job = Job {
        id: 7,
        name: "reindex".into(),
    };
    queue.offer_async(&job).await.unwrap();
    assert_eq!(ctx.contents("structured"), vec![r#"{"id":7,"name":"reindex"}"#]);
    assert_eq!(queue.poll_async().await.unwrap(), Some(job));
}

#[tokio::test]
async fn test_undecodable_payload_is_a_codec_fault() {
    let ctx = TestContext::new().await;
    ctx.queue("mixed").offer_async(&"not json".to_string()).await.unwrap();
    let typed = ctx.client.get_queue::<Job, _>("mixed", JsonCodec);
    assert!(matches!(typed.peek_async().await, Err(CollectionError::Codec(_))));
}

// ===== Faults =====

#[tokio::test]
async fn test_wrong_type_surfaces_as_fault() {
    let ctx = TestContext::new().await;
    ctx.gateway.inject_fault(CollectionError::WrongType);
    let queue = ctx.queue("jobs");
    assert_eq!(queue.poll_async().await, Err(CollectionError::WrongType));
}

#[tokio::test]
async fn test_transport_fault_is_distinct_from_absence() {
    let ctx = TestContext::new().await;
    ctx.gateway.inject_fault(CollectionError::ConnectionClosed);
    let queue = ctx.queue("jobs");
    let err = queue.peek_async().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(queue.peek_async().await.unwrap(), None);
}

// ===== Waiting poll =====

#[tokio::test]
async fn test_poll_timeout_returns_existing_element_immediately() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("jobs");
    ctx.fill(&queue, &["ready"]).await;
    let value = tokio::time::timeout(
        Duration::from_millis(500),
        queue.poll_timeout_async(Duration::from_secs(10)),
    )
    .await
    .expect("should not wait")
    .unwrap();
    assert_eq!(value.as_deref(), Some("ready"));
}

#[tokio::test]
async fn test_poll_timeout_expires_with_none() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("jobs");
    assert_eq!(
        queue.poll_timeout_async(Duration::from_secs(1)).await.unwrap(),
        None
    );
    assert_eq!(ctx.gateway.take_log(), vec!["BLPOP"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_poll_timeout_wakes_on_offer() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("jobs");
    let waiter = queue.poll_timeout_async(Duration::from_secs(10));
    tokio::time::sleep(Duration::from_millis(50)).await;
    ctx.fill(&queue, &["wake"]).await;
    assert_eq!(waiter.await.unwrap().as_deref(), Some("wake"));
}
