// tests/integration/concurrency_test.rs

//! Concurrent producers and consumers on one queue, through both the async and
//! the blocking forms.

use super::test_helpers::init_tracing;
use spineldb_collections::{SpinelClient, StringCodec};
use std::collections::HashSet;
use std::thread;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_offers_and_polls_deliver_each_element_once() {
    init_tracing();
    let client = SpinelClient::with_gateway(
        std::sync::Arc::new(spineldb_collections::core::gateway::InMemoryGateway::new()),
        tokio::runtime::Handle::current(),
        Default::default(),
    );
    let queue = client.get_queue::<String, _>("work", StringCodec);

    let offers: Vec<_> = (0..100)
        .map(|i| queue.offer_async(&format!("job-{i}")))
        .collect();
    for offer in offers {
        assert!(offer.await.unwrap());
    }

    let polls: Vec<_> = (0..120).map(|_| queue.poll_async()).collect();
    let mut seen = HashSet::new();
    let mut empty = 0;
    for poll in polls {
        match poll.await.unwrap() {
            Some(v) => assert!(seen.insert(v), "element delivered twice"),
            None => empty += 1,
        }
    }
    assert_eq!(seen.len(), 100);
    assert_eq!(empty, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unawaited_offers_land_in_issue_order() {
    init_tracing();
    let client = SpinelClient::with_gateway(
        std::sync::Arc::new(spineldb_collections::core::gateway::InMemoryGateway::new()),
        tokio::runtime::Handle::current(),
        Default::default(),
    );
    for round in 0..10 {
        let queue = client.get_queue::<String, _>(format!("ordered-{round}"), StringCodec);
        let expected: Vec<String> = (0..8).map(|i| format!("item-{i}")).collect();
        let offers: Vec<_> = expected.iter().map(|v| queue.offer_async(v)).collect();
        for offer in offers {
            assert!(offer.await.unwrap());
        }
        assert_eq!(queue.read_all_async().await.unwrap(), expected);
    }
}

#[test]
fn test_queue_keeps_working_after_the_client_is_dropped() {
    init_tracing();
    let client = SpinelClient::in_memory().unwrap();
    let queue = client.get_queue::<String, _>("work", StringCodec);
    queue.offer(&"first".to_string()).unwrap();
    drop(client);

    queue.offer(&"second".to_string()).unwrap();
    assert_eq!(queue.poll().unwrap().as_deref(), Some("first"));
    assert_eq!(queue.size().unwrap(), 1);
}

#[test]
fn test_blocking_callers_from_many_threads() {
    init_tracing();
    let client = SpinelClient::in_memory().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|t| {
            let queue = client.get_queue::<String, _>("work", StringCodec);
            thread::spawn(move || {
                for i in 0..25 {
                    queue.offer(&format!("{t}-{i}")).unwrap();
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = client.get_queue::<String, _>("work", StringCodec);
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Some(v) = queue.poll().unwrap() {
                    taken.push(v);
                }
                taken
            })
        })
        .collect();

    let mut all = HashSet::new();
    for c in consumers {
        for v in c.join().unwrap() {
            assert!(all.insert(v));
        }
    }
    assert_eq!(all.len(), 100);
    assert_eq!(client.get_queue::<String, _>("work", StringCodec).size().unwrap(), 0);
}

#[test]
fn test_sync_poll_timeout_from_a_plain_thread() {
    let client = SpinelClient::in_memory().unwrap();
    let queue = client.get_queue::<String, _>("work", StringCodec);

    let consumer = {
        let queue = queue.clone();
        thread::spawn(move || queue.poll_timeout(std::time::Duration::from_secs(10)))
    };
    thread::sleep(std::time::Duration::from_millis(50));
    queue.offer(&"hello".to_string()).unwrap();
    assert_eq!(consumer.join().unwrap().unwrap().as_deref(), Some("hello"));
}
