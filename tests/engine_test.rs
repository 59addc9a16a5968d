//! Request execution engine tests
//!
//! Exercises live request state transitions, retry, cancellation and
//! supersession against in-process request functions.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use showdeck::net::{
    NetResult, NetworkHandler, Registry, RequestCtx, RequestKey, RequestOptions, TransportError,
};
use tokio_util::sync::CancellationToken;

const ECHO: RequestKey<u32, u32> = RequestKey::new("echo");
const LIST: RequestKey<u32, Vec<u32>> = RequestKey::new("list");

fn status_error(status: u16) -> anyhow::Error {
    anyhow::Error::new(TransportError::Status {
        status,
        message: "Service Unavailable".into(),
    })
}

/// Echoes the param after `param * 10` ms of simulated latency
fn echo_registry(calls: Arc<Mutex<Vec<Option<u32>>>>) -> Registry {
    Registry::new().set_request(ECHO, move |params: Option<u32>, _ctx| {
        calls.lock().push(params);
        async move {
            let value = params.unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(u64::from(value) * 10)).await;
            Ok(NetResult::new(value, 200))
        }
    })
}

/// Fails with `status` every time, counting calls
fn failing_registry(status: u16, calls: Arc<AtomicUsize>) -> Registry {
    Registry::new().set_request(ECHO, move |_params: Option<u32>, _ctx| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Err(status_error(status)) }
    })
}

// =============================================================================
// State transitions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_success_sets_data_and_status() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handler = NetworkHandler::new(echo_registry(Arc::clone(&calls)));
    let live = handler.use_request(ECHO, None, RequestOptions::new());

    assert!(!live.loading().get());
    assert_eq!(live.status().get(), None);

    let run = live.run(Some(3), None);
    // Raised before the future is polled
    assert!(live.loading().get());
    run.await;

    assert!(!live.loading().get());
    assert_eq!(live.data().get(), Some(3));
    assert_eq!(live.status().get(), Some(200));
    assert!(live.error().get().is_none());
    assert_eq!(*calls.lock(), vec![Some(3)]);
}

#[tokio::test]
async fn test_missing_status_defaults_to_200() {
    let registry = Registry::new().set_request(ECHO, |_params: Option<u32>, _ctx| async {
        Ok(NetResult::from_data(1))
    });
    let live = NetworkHandler::new(registry).use_request(ECHO, None, RequestOptions::new());
    live.run(None, None).await;
    assert_eq!(live.status().get(), Some(200));
}

#[tokio::test]
async fn test_failure_keeps_previous_data() {
    let toggle = Arc::new(AtomicUsize::new(0));
    let registry = {
        let toggle = Arc::clone(&toggle);
        Registry::new().set_request(ECHO, move |params: Option<u32>, _ctx| {
            let fail = toggle.fetch_add(1, Ordering::SeqCst) > 0;
            async move {
                if fail {
                    Err(status_error(502))
                } else {
                    Ok(NetResult::new(params.unwrap_or_default(), 200))
                }
            }
        })
    };
    let live = NetworkHandler::new(registry).use_request(ECHO, Some(9), RequestOptions::new());

    live.run(None, None).await;
    assert_eq!(live.data().get(), Some(9));

    live.refresh().await;
    let err = live.error().get().expect("error after failure");
    assert_eq!(err.status, Some(502));
    assert_eq!(err.code.as_deref(), Some("ERR_BAD_RESPONSE"));
    assert_eq!(live.status().get(), Some(502));
    assert_eq!(live.data().get(), Some(9));
    assert!(!live.loading().get());
}

#[tokio::test]
async fn test_error_cleared_on_next_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let live = NetworkHandler::new(failing_registry(500, Arc::clone(&calls)))
        .use_request(ECHO, None, RequestOptions::new());

    live.run(None, None).await;
    assert!(live.error().get().is_some());

    let run = live.run(None, None);
    assert!(live.error().get().is_none());
    run.await;
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_budget() {
    for (retry, expected_calls) in [(0, 1), (1, 2), (2, 3)] {
        let calls = Arc::new(AtomicUsize::new(0));
        let live = NetworkHandler::new(failing_registry(503, Arc::clone(&calls)))
            .use_request(ECHO, None, RequestOptions::new().retry(retry));

        live.run(None, None).await;
        assert_eq!(calls.load(Ordering::SeqCst), expected_calls, "retry = {}", retry);
        assert_eq!(live.status().get(), Some(503));
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_between_attempts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let live = NetworkHandler::new(failing_registry(503, Arc::clone(&calls))).use_request(
        ECHO,
        None,
        RequestOptions::new()
            .retry(2)
            .retry_delay(Duration::from_secs(1)),
    );

    let started = tokio::time::Instant::now();
    live.run(None, None).await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let live = NetworkHandler::new(failing_registry(404, Arc::clone(&calls)))
        .use_request(ECHO, None, RequestOptions::new().retry(3));

    live.run(None, None).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(live.error().get().and_then(|e| e.status), Some(404));
}

#[tokio::test(start_paused = true)]
async fn test_custom_retry_policy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let live = NetworkHandler::new(failing_registry(404, Arc::clone(&calls))).use_request(
        ECHO,
        None,
        RequestOptions::new()
            .retry(1)
            .retryable_status(|status| status == Some(404)),
    );

    live.run(None, None).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Fails with 504 on the first two calls, then echoes the param
fn flaky_registry(calls: Arc<AtomicUsize>) -> Registry {
    Registry::new().set_request(ECHO, move |params: Option<u32>, _ctx| {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call < 2 {
                Err(status_error(504))
            } else {
                Ok(NetResult::new(params.unwrap_or_default(), 200))
            }
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_retry_until_success() {
    for retry in [1, 2] {
        let calls = Arc::new(AtomicUsize::new(0));
        let mapped = Arc::new(AtomicUsize::new(0));
        let options = {
            let mapped = Arc::clone(&mapped);
            RequestOptions::new().retry(retry).map_response(move |v: u32| {
                mapped.fetch_add(1, Ordering::SeqCst);
                v * 2
            })
        };
        let live = NetworkHandler::new(flaky_registry(Arc::clone(&calls)))
            .use_request(ECHO, Some(7), options);

        live.run(None, None).await;

        if retry == 2 {
            assert_eq!(calls.load(Ordering::SeqCst), 3);
            assert_eq!(live.data().get(), Some(14));
            assert!(live.error().get().is_none());
            assert_eq!(live.status().get(), Some(200));
            assert_eq!(mapped.load(Ordering::SeqCst), 1);
        } else {
            assert_eq!(calls.load(Ordering::SeqCst), 2);
            assert_eq!(live.data().get(), None);
            assert_eq!(live.error().get().and_then(|e| e.status), Some(504));
            assert_eq!(live.status().get(), Some(504));
            assert_eq!(mapped.load(Ordering::SeqCst), 0);
        }
        assert!(!live.loading().get());
    }
}

// =============================================================================
// Cancellation & supersession
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_during_run() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let live = NetworkHandler::new(echo_registry(calls)).use_request(ECHO, None, RequestOptions::new());

    let handle = tokio::spawn(live.run(Some(50), None));
    tokio::time::sleep(Duration::from_millis(10)).await;
    live.cancel();
    handle.await.unwrap();

    assert!(!live.loading().get());
    assert_eq!(live.status().get(), Some(0));
    assert!(live.error().get().is_none());
    assert_eq!(live.data().get(), None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = {
        let calls = Arc::clone(&calls);
        Registry::new().set_request(ECHO, move |_params: Option<u32>, ctx: RequestCtx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if let Some(token) = ctx.cancel {
                    token.cancelled().await;
                }
                Err(anyhow::Error::new(TransportError::Aborted))
            }
        })
    };
    let live = NetworkHandler::new(registry).use_request(ECHO, None, RequestOptions::new().retry(3));

    let handle = tokio::spawn(live.run(None, None));
    tokio::task::yield_now().await;
    live.cancel();
    handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(live.status().get(), Some(0));
    assert!(live.error().get().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_while_committing_aborts() {
    let registry = Registry::new().set_request(ECHO, |params: Option<u32>, _ctx| async move {
        Ok(NetResult::new(params.unwrap_or_default(), 200))
    });
    let entered = Arc::new(tokio::sync::Notify::new());
    let options = {
        let entered = Arc::clone(&entered);
        RequestOptions::new().map_response(move |v: u32| {
            entered.notify_one();
            // Holds the worker inside the commit while the test cancels
            std::thread::sleep(Duration::from_millis(200));
            v
        })
    };
    let live = NetworkHandler::new(registry).use_request(ECHO, None, options);

    let handle = tokio::spawn(live.run(Some(7), None));
    entered.notified().await;
    assert!(live.loading().get());
    live.cancel();
    handle.await.unwrap();

    assert_eq!(live.data().get(), None);
    assert_eq!(live.status().get(), Some(0));
    assert!(live.error().get().is_none());
    assert!(!live.loading().get());
}

#[tokio::test(start_paused = true)]
async fn test_later_run_supersedes_earlier() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let live = NetworkHandler::new(echo_registry(Arc::clone(&calls)))
        .use_request(ECHO, None, RequestOptions::new());

    // First run is slow, second is fast
    let slow = tokio::spawn(live.run(Some(20), None));
    let fast = tokio::spawn(live.run(Some(1), None));
    fast.await.unwrap();
    slow.await.unwrap();

    assert_eq!(live.data().get(), Some(1));
    assert_eq!(live.status().get(), Some(200));
    assert!(!live.loading().get());
    assert_eq!(calls.lock().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_result_ignored_even_if_transport_ignores_cancel() {
    // Transport never looks at the token
    let registry = Registry::new().set_request(ECHO, |params: Option<u32>, _ctx| async move {
        let value = params.unwrap_or_default();
        tokio::time::sleep(Duration::from_millis(u64::from(value))).await;
        Ok(NetResult::new(value, 200))
    });
    let live = NetworkHandler::new(registry).use_request(ECHO, None, RequestOptions::new());

    let first = live.run(Some(100), None);
    let second = live.run(Some(5), None);
    futures::join!(first, second);

    assert_eq!(live.data().get(), Some(5));
    assert_eq!(live.status().get(), Some(200));
}

#[tokio::test(start_paused = true)]
async fn test_parent_token_cancels_run() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let live = NetworkHandler::new(echo_registry(calls)).use_request(ECHO, None, RequestOptions::new());

    let parent = CancellationToken::new();
    let handle = tokio::spawn(live.run(Some(30), Some(RequestCtx::new().with_cancel(parent.clone()))));
    tokio::time::sleep(Duration::from_millis(5)).await;
    parent.cancel();
    handle.await.unwrap();

    assert_eq!(live.status().get(), Some(0));
    assert!(!live.loading().get());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_run_clears_loading() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let live = NetworkHandler::new(echo_registry(Arc::clone(&calls)))
        .use_request(ECHO, None, RequestOptions::new());

    let run = live.run(Some(10), None);
    assert!(live.loading().get());
    drop(run);

    assert!(!live.loading().get());
    assert_eq!(live.status().get(), Some(0));
    assert!(calls.lock().is_empty());
}

// =============================================================================
// Params, mapping, registry
// =============================================================================

#[tokio::test]
async fn test_refresh_reuses_last_params() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let live = NetworkHandler::new(echo_registry(Arc::clone(&calls)))
        .use_request(ECHO, Some(0), RequestOptions::new());

    live.run(None, None).await;
    live.run(Some(2), None).await;
    live.refresh().await;

    assert_eq!(*calls.lock(), vec![Some(0), Some(2), Some(2)]);
    assert_eq!(live.last_params(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_on_success_gets_params_of_committed_run() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let live = NetworkHandler::new(echo_registry(Arc::clone(&calls)))
        .use_request(ECHO, None, RequestOptions::new());

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        let data = live.data().clone();
        live.on_success(move |params: Option<&u32>, value: &u32| {
            // Data is already published when the hook runs
            assert_eq!(data.get(), Some(*value));
            seen.lock().push((params.copied(), *value));
        });
    }

    let slow = live.run(Some(20), None);
    let fast = live.run(Some(3), None);
    futures::join!(slow, fast);
    live.refresh().await;

    assert_eq!(*seen.lock(), vec![(Some(3), 3), (Some(3), 3)]);
}

#[tokio::test]
async fn test_map_response_only_on_success() {
    let mapped = Arc::new(AtomicUsize::new(0));
    let fail = Arc::new(AtomicUsize::new(0));
    let registry = {
        let fail = Arc::clone(&fail);
        Registry::new().set_request(LIST, move |params: Option<u32>, _ctx| {
            let failing = fail.load(Ordering::SeqCst) > 0;
            async move {
                if failing {
                    return Err(status_error(500));
                }
                let n = params.unwrap_or_default();
                Ok(NetResult::new((1..=n).collect(), 200))
            }
        })
    };
    let options = {
        let mapped = Arc::clone(&mapped);
        RequestOptions::new().map_response(move |mut items: Vec<u32>| {
            mapped.fetch_add(1, Ordering::SeqCst);
            items.reverse();
            items
        })
    };
    let live = NetworkHandler::new(registry).use_request(LIST, Some(3), options);

    live.run(None, None).await;
    assert_eq!(live.data().get(), Some(vec![3, 2, 1]));
    live.run(Some(2), None).await;
    assert_eq!(live.data().get(), Some(vec![2, 1]));
    assert_eq!(mapped.load(Ordering::SeqCst), 2);

    fail.store(1, Ordering::SeqCst);
    live.refresh().await;
    assert_eq!(mapped.load(Ordering::SeqCst), 2);
    assert_eq!(live.data().get(), Some(vec![2, 1]));
}

#[tokio::test]
async fn test_unregistered_request_surfaces_error() {
    let live = NetworkHandler::new(Registry::new()).use_request(ECHO, None, RequestOptions::new().retry(2));

    live.run(None, None).await;
    let err = live.error().get().expect("not-found error");
    assert_eq!(err.message, "Request 'echo' not found.");
    assert_eq!(err.code.as_deref(), Some("ERR_NOT_FOUND"));
    assert_eq!(live.status().get(), Some(0));
    assert!(!live.loading().get());
}

#[test]
fn test_registry_is_immutable() {
    let base = Registry::new();
    let extended = base.set_request(ECHO, |_params: Option<u32>, _ctx| async {
        Ok(NetResult::new(1, 200))
    });
    assert!(base.is_empty());
    assert_eq!(extended.list(), vec!["echo"]);
    assert!(base.execute(ECHO, None, RequestCtx::new()).is_err());
}
