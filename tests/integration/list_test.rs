// tests/integration/list_test.rs

//! Integration tests for list operations
//! Tests: get, range, index_of, set, insert, remove, remove_at, trim, delete

use super::test_helpers::TestContext;
use spineldb_collections::CollectionError;

// ===== Reads =====

#[tokio::test]
async fn test_get_by_index() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_all_async(&["a".into(), "b".into(), "c".into()]).await.unwrap();

    assert_eq!(list.get_async(0).await.unwrap().as_deref(), Some("a"));
    assert_eq!(list.get_async(2).await.unwrap().as_deref(), Some("c"));
    assert_eq!(list.get_async(3).await.unwrap(), None);
    assert_eq!(list.size_async().await.unwrap(), 3);
}

#[tokio::test]
async fn test_range_is_inclusive() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_all_async(&["a".into(), "b".into(), "c".into(), "d".into()])
        .await
        .unwrap();
    assert_eq!(list.range_async(1, 2).await.unwrap(), vec!["b", "c"]);
    assert_eq!(list.range_async(2, 100).await.unwrap(), vec!["c", "d"]);
}

#[tokio::test]
async fn test_index_of_first_and_last() {
    let ctx = TestContext::new().await;
    let list = ctx.list("dups");
    list.add_all_async(&["x".into(), "y".into(), "x".into()]).await.unwrap();

    assert_eq!(list.index_of_async(&"x".into()).await.unwrap(), Some(0));
    assert_eq!(list.last_index_of_async(&"x".into()).await.unwrap(), Some(2));
    assert_eq!(list.index_of_async(&"z".into()).await.unwrap(), None);
    assert!(list.contains_async(&"y".into()).await.unwrap());
    assert!(!list.contains_async(&"z".into()).await.unwrap());
}

#[tokio::test]
async fn test_missing_list_reads_as_empty() {
    let ctx = TestContext::new().await;
    let list = ctx.list("nothing");
    assert!(list.is_empty_async().await.unwrap());
    assert!(list.read_all_async().await.unwrap().is_empty());
    assert_eq!(list.get_async(0).await.unwrap(), None);
}

// ===== Writes =====

#[tokio::test]
async fn test_add_first_prepends() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_async(&"b".into()).await.unwrap();
    list.add_first_async(&"a".into()).await.unwrap();
    assert_eq!(ctx.contents("letters"), vec!["a", "b"]);
}

#[tokio::test]
async fn test_add_all_with_nothing_is_rejected_locally() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    assert!(matches!(
        list.add_all_async(&[]).await,
        Err(CollectionError::InvalidRequest(_))
    ));
    assert!(ctx.gateway.take_log().is_empty());
}

#[tokio::test]
async fn test_set_replaces_and_faults_out_of_range() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_all_async(&["a".into(), "b".into()]).await.unwrap();
    list.set_async(1, &"B".into()).await.unwrap();
    assert_eq!(ctx.contents("letters"), vec!["a", "B"]);
    assert_eq!(
        list.set_async(5, &"z".into()).await,
        Err(CollectionError::IndexOutOfRange)
    );
}

#[tokio::test]
async fn test_insert_relative_to_pivot() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_all_async(&["a".into(), "c".into()]).await.unwrap();

    assert_eq!(
        list.insert_before_async(&"c".into(), &"b".into()).await.unwrap(),
        Some(3)
    );
    assert_eq!(
        list.insert_after_async(&"c".into(), &"d".into()).await.unwrap(),
        Some(4)
    );
    assert_eq!(
        list.insert_after_async(&"missing".into(), &"e".into()).await.unwrap(),
        None
    );
    assert_eq!(ctx.contents("letters"), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_remove_first_matching_value() {
    let ctx = TestContext::new().await;
    let list = ctx.list("dups");
    list.add_all_async(&["x".into(), "y".into(), "x".into()]).await.unwrap();
    assert!(list.remove_async(&"x".into()).await.unwrap());
    assert_eq!(ctx.contents("dups"), vec!["y", "x"]);
    assert!(!list.remove_async(&"z".into()).await.unwrap());
}

#[tokio::test]
async fn test_remove_at_keeps_equal_neighbours() {
    let ctx = TestContext::new().await;
    let list = ctx.list("dups");
    list.add_all_async(&["x".into(), "x".into(), "x".into()]).await.unwrap();
    ctx.gateway.take_log();

    list.remove_at_async(1).await.unwrap();
    assert_eq!(ctx.contents("dups"), vec!["x", "x"]);
    assert_eq!(ctx.gateway.take_log(), vec!["LSET", "LREM"]);
}

#[tokio::test]
async fn test_remove_at_out_of_range_sends_no_removal() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_async(&"a".into()).await.unwrap();
    ctx.gateway.take_log();

    assert_eq!(list.remove_at_async(4).await, Err(CollectionError::IndexOutOfRange));
    assert_eq!(ctx.gateway.take_log(), vec!["LSET"]);
    assert_eq!(ctx.contents("letters"), vec!["a"]);
}

#[tokio::test]
async fn test_indices_beyond_the_store_range_never_wrap() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_all_async(&["a".into(), "b".into(), "c".into()]).await.unwrap();
    ctx.gateway.take_log();

    assert_eq!(list.get_async(usize::MAX).await.unwrap(), None);
    assert_eq!(
        list.set_async(usize::MAX, &"z".into()).await,
        Err(CollectionError::IndexOutOfRange)
    );
    assert_eq!(
        list.remove_at_async(usize::MAX).await,
        Err(CollectionError::IndexOutOfRange)
    );
    assert!(ctx.gateway.take_log().is_empty());
    assert_eq!(ctx.contents("letters"), vec!["a", "b", "c"]);

    assert_eq!(list.range_async(1, usize::MAX).await.unwrap(), vec!["b", "c"]);
    list.trim_async(1, usize::MAX).await.unwrap();
    assert_eq!(ctx.contents("letters"), vec!["b", "c"]);
}

#[tokio::test]
async fn test_trim_and_delete() {
    let ctx = TestContext::new().await;
    let list = ctx.list("letters");
    list.add_all_async(&["a".into(), "b".into(), "c".into(), "d".into()])
        .await
        .unwrap();
    list.trim_async(1, 2).await.unwrap();
    assert_eq!(ctx.contents("letters"), vec!["b", "c"]);

    assert!(list.delete_async().await.unwrap());
    assert!(!list.delete_async().await.unwrap());
    assert!(ctx.gateway.is_empty());
}

#[tokio::test]
async fn test_queue_and_list_share_the_key() {
    let ctx = TestContext::new().await;
    let queue = ctx.queue("shared");
    ctx.fill(&queue, &["a", "b"]).await;
    let list = queue.as_list();
    assert_eq!(list.get_async(1).await.unwrap().as_deref(), Some("b"));
    list.add_first_async(&"front".into()).await.unwrap();
    assert_eq!(queue.poll_async().await.unwrap().as_deref(), Some("front"));
}
