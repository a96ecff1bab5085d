//! Concurrency properties of the pending-request table.

use std::time::Duration;

use pebblelink::{PendingRequests, ReplyError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_waiters_receive_only_their_value() {
    const WAITERS: u32 = 64;
    let table: PendingRequests<u32, u32> = PendingRequests::default();

    let mut tasks = Vec::new();
    for key in 0..WAITERS {
        let reply = table.register(key).expect("register");
        tasks.push(tokio::spawn(async move {
            (key, reply.await_result(Duration::from_secs(10)).await)
        }));
    }

    // Complete from several tasks at once, in an interleaved order.
    let mut completers = Vec::new();
    for lane in 0..4 {
        let table = table.clone();
        completers.push(tokio::spawn(async move {
            for key in (lane..WAITERS).step_by(4).rev() {
                assert!(table.complete(&key, key * 10));
                tokio::task::yield_now().await;
            }
        }));
    }
    for completer in completers {
        completer.await.expect("completer");
    }

    for task in tasks {
        let (key, result) = task.await.expect("waiter");
        assert_eq!(result, Ok(key * 10));
    }
    assert!(table.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_are_independent_per_key() {
    let table: PendingRequests<u16, &'static str> = PendingRequests::default();
    let short = table.register(1).expect("register");
    let long = table.register(2).expect("register");

    let short = tokio::spawn(short.await_result(Duration::from_millis(100)));
    let long = tokio::spawn(long.await_result(Duration::from_secs(10)));

    assert_eq!(short.await.expect("join"), Err(ReplyError::Timeout));
    assert!(!table.contains(&1));
    assert!(table.contains(&2));

    assert!(table.complete(&2, "late but in time"));
    assert_eq!(long.await.expect("join"), Ok("late but in time"));
}

#[tokio::test(start_paused = true)]
async fn test_key_reusable_after_terminal_state() {
    let table: PendingRequests<u16, u8> = PendingRequests::default();

    let reply = table.register(5).expect("register");
    assert_eq!(
        reply.await_result(Duration::from_millis(10)).await,
        Err(ReplyError::Timeout)
    );

    let reply = table.register(5).expect("key released after timeout");
    assert!(table.complete(&5, 1));
    assert_eq!(reply.await_result(Duration::from_millis(10)).await, Ok(1));
}

#[tokio::test(start_paused = true)]
async fn test_reused_key_isolated_from_earlier_waiter() {
    let table: PendingRequests<u32, &'static str> = PendingRequests::default();

    let earlier = table.register(1337).expect("register");
    assert!(table.complete(&1337, "first pong"));
    let later = table.register(1337).expect("key free after completion");

    // The earlier waiter still gets its own value and leaves the later entry.
    assert_eq!(
        earlier.await_result(Duration::from_millis(10)).await,
        Ok("first pong")
    );
    assert!(table.contains(&1337));

    let waiter = tokio::spawn(later.await_result(Duration::from_secs(1)));
    assert!(table.complete(&1337, "second pong"));
    assert_eq!(waiter.await.expect("join"), Ok("second pong"));
}
