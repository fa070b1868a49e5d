// tests/property/queue_properties.rs

//! Ordering and conservation properties of queues

use crate::test_helpers::TestContext;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 40,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_polls_return_offers_in_order(values in prop::collection::vec(".{0,40}", 0..=30)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let queue = ctx.queue("fifo");
            for v in &values {
                queue.offer_async(v).await.unwrap();
            }

            let mut polled = Vec::new();
            while let Some(v) = queue.poll_async().await.unwrap() {
                polled.push(v);
            }
            assert_eq!(polled, values);
        });
    }

    #[test]
    fn test_transfers_conserve_elements(
        left in prop::collection::vec("[a-z]{1,8}", 0..=20),
        right in prop::collection::vec("[a-z]{1,8}", 0..=20),
        moves in prop::collection::vec(any::<bool>(), 0..=40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let l = ctx.queue("l");
            let r = ctx.queue("r");
            for v in &left {
                l.offer_async(v).await.unwrap();
            }
            for v in &right {
                r.offer_async(v).await.unwrap();
            }

            for to_right in &moves {
                let (from, to) = if *to_right { (&l, "r") } else { (&r, "l") };
                let before_from = from.size_async().await.unwrap();
                let moved = from.poll_last_and_offer_first_to_async(to).await.unwrap();
                assert_eq!(moved.is_some(), before_from > 0);
            }

            let mut expected: Vec<String> = left.iter().chain(right.iter()).cloned().collect();
            let mut actual = ctx.contents("l");
            actual.extend(ctx.contents("r"));
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected);
        });
    }

    #[test]
    fn test_self_transfer_is_a_rotation(values in prop::collection::vec("[a-z]{1,4}", 1..=15), turns in 0usize..30) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ctx = TestContext::new().await;
            let ring = ctx.queue("ring");
            for v in &values {
                ring.offer_async(v).await.unwrap();
            }
            for _ in 0..turns {
                ring.poll_last_and_offer_first_to_async("ring").await.unwrap();
            }
            let mut expected = values.clone();
            expected.rotate_right(turns % values.len());
            assert_eq!(ctx.contents("ring"), expected);
        });
    }
}
