use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pinmap::resolver::{MemoizedResolver, UNKNOWN_LOCATION};
use tokio::sync::oneshot;

#[derive(Debug)]
struct LookupError;

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("geocoder unreachable")
    }
}

#[tokio::test]
async fn second_resolve_does_not_fetch_again() {
    let resolver = MemoizedResolver::new();
    let calls = AtomicUsize::new(0);
    let fetch = |_key: String| async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Infallible>(Some("3570 S Las Vegas Blvd".to_string()))
    };

    let first = resolver.resolve("A", fetch).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = resolver.resolve("A", fetch).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(first.as_deref(), Some("3570 S Las Vegas Blvd"));
}

#[tokio::test]
async fn failed_fetch_returns_sentinel_and_is_not_retried() {
    let resolver = MemoizedResolver::new();
    let calls = AtomicUsize::new(0);
    let failing = |_key: String| async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<Option<String>, _>(LookupError)
    };

    assert_eq!(resolver.resolve_or_unknown("B", failing).await, UNKNOWN_LOCATION);
    assert_eq!(resolver.resolve_or_unknown("B", failing).await, UNKNOWN_LOCATION);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cached_failure_survives_a_working_fetch() {
    let resolver = MemoizedResolver::new();
    resolver
        .resolve("B", |_| async { Err::<Option<String>, _>(LookupError) })
        .await;

    let succeeded = AtomicUsize::new(0);
    let value = resolver
        .resolve_or_unknown("B", |_| async {
            succeeded.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(Some("1 Real Address".to_string()))
        })
        .await;

    assert_eq!(value, UNKNOWN_LOCATION);
    assert_eq!(succeeded.load(Ordering::SeqCst), 0);
    assert_eq!(resolver.cached("B"), Some(None));
}

#[tokio::test]
async fn concurrent_callers_share_one_fetch() {
    let resolver = Arc::new(MemoizedResolver::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                resolver
                    .resolve("C", |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, Infallible>(Some("Fremont St".to_string()))
                    })
                    .await
            })
        })
        .collect();

    for task in tasks {
        let value = task.await.expect("task completes");
        assert_eq!(value.as_deref(), Some("Fremont St"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn slow_key_does_not_block_other_keys() {
    let resolver = MemoizedResolver::new();
    let (release, released) = oneshot::channel::<()>();

    let slow = resolver.resolve("slow", |_| async move {
        released.await.ok();
        Ok::<_, Infallible>(Some("slow".to_string()))
    });
    let fast = async {
        let value = resolver
            .resolve("fast", |_| async { Ok::<_, Infallible>(Some("fast".to_string())) })
            .await;
        release.send(()).expect("slow fetch still waiting");
        value
    };

    let (slow, fast) = tokio::join!(slow, fast);
    assert_eq!(slow.as_deref(), Some("slow"));
    assert_eq!(fast.as_deref(), Some("fast"));
    assert_eq!(resolver.len(), 2);
}

#[tokio::test]
async fn cancelled_fetch_leaves_no_entry() {
    let resolver = MemoizedResolver::<String>::new();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        resolver.resolve("D", |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, Infallible>(Some("never".to_string()))
        }),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(resolver.cached("D"), None);

    let value = resolver
        .resolve("D", |_| async { Ok::<_, Infallible>(Some("Henderson".to_string())) })
        .await;
    assert_eq!(value.as_deref(), Some("Henderson"));
}
