//! Integration tests for restart supervision

use basedbot_supervisor::{
    BackoffConfig, ChildExit, ChildSpec, ChildState, CircuitBreaker, RestartPolicy, Supervisor,
    SupervisorConfig, SupervisorError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A child that fails `failures` times, then cancels the whole supervisor.
fn flaky_child(
    name: &str,
    failures: usize,
    calls: Arc<AtomicUsize>,
    stop: CancellationToken,
) -> ChildSpec {
    ChildSpec::new(name, move |_cancel| {
        let calls = calls.clone();
        let stop = stop.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                anyhow::bail!("failure {n}");
            }
            stop.cancel();
            Ok(())
        }
    })
}

#[tokio::test]
async fn test_n_failures_mean_n_plus_one_starts() {
    init_tracing();
    const FAILURES: usize = 7;

    let cancel = CancellationToken::new();
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), cancel.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    supervisor
        .spawn(flaky_child("flaky", FAILURES, calls.clone(), cancel.clone()))
        .unwrap();

    let exits = supervisor.join().await;
    assert_eq!(exits, vec![("flaky".to_string(), ChildExit::Cancelled)]);
    assert_eq!(calls.load(Ordering::SeqCst), FAILURES + 1);

    let stats = supervisor.stats("flaky").unwrap();
    assert_eq!(stats.starts, FAILURES as u64 + 1);
    assert_eq!(stats.failures, FAILURES as u64);
    assert_eq!(stats.last_error.as_deref(), Some("failure 7"));
    assert_eq!(stats.state, ChildState::Stopped);
}

#[tokio::test]
async fn test_clean_return_is_restarted() {
    let cancel = CancellationToken::new();
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), cancel.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let spec = {
        let calls = calls.clone();
        let cancel = cancel.clone();
        ChildSpec::new("returns", move |_| {
            let calls = calls.clone();
            let cancel = cancel.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    cancel.cancel();
                }
                Ok(())
            }
        })
    };
    supervisor.spawn(spec).unwrap();
    supervisor.join().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(supervisor.stats("returns").unwrap().failures, 0);
}

#[tokio::test]
async fn test_failing_child_does_not_disturb_sibling() {
    let cancel = CancellationToken::new();
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), cancel.clone());
    let broken_calls = Arc::new(AtomicUsize::new(0));
    let steady_calls = Arc::new(AtomicUsize::new(0));

    let broken = {
        let calls = broken_calls.clone();
        ChildSpec::new("broken", move |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("always broken")
            }
        })
    };
    let steady = {
        let calls = steady_calls.clone();
        ChildSpec::new("steady", move |cancel: CancellationToken| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                cancel.cancelled().await;
                Ok(())
            }
        })
    };
    supervisor.spawn(broken).unwrap();
    supervisor.spawn(steady).unwrap();

    while broken_calls.load(Ordering::SeqCst) < 50 {
        tokio::task::yield_now().await;
    }
    let exits = supervisor.shutdown().await;

    assert_eq!(exits.len(), 2);
    assert!(exits.iter().all(|(_, exit)| *exit == ChildExit::Cancelled));
    assert_eq!(steady_calls.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.stats("steady").unwrap().failures, 0);
    assert!(supervisor.stats("broken").unwrap().failures >= 49);
    assert_eq!(supervisor.children(), vec!["broken".to_string(), "steady".to_string()]);
}

#[tokio::test]
async fn test_panic_is_restarted() {
    let cancel = CancellationToken::new();
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), cancel.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let spec = {
        let calls = calls.clone();
        let cancel = cancel.clone();
        ChildSpec::new("panicky", move |_| {
            let calls = calls.clone();
            let cancel = cancel.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("boom");
                }
                cancel.cancel();
                Ok(())
            }
        })
    };
    supervisor.spawn(spec).unwrap();
    supervisor.join().await;

    let stats = supervisor.stats("panicky").unwrap();
    assert_eq!(stats.starts, 2);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.last_error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_circuit_breaker_gives_up() {
    let config = SupervisorConfig {
        circuit_breaker: Some(CircuitBreaker {
            max_restarts: 3,
            window: Duration::from_secs(60),
        }),
        ..SupervisorConfig::default()
    };
    let mut supervisor = Supervisor::new(config, CancellationToken::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let spec = {
        let calls = calls.clone();
        ChildSpec::new("doomed", move |_| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("credentials revoked")
            }
        })
    };
    supervisor.spawn(spec).unwrap();

    let exits = supervisor.join().await;
    assert_eq!(exits, vec![("doomed".to_string(), ChildExit::GaveUp)]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(supervisor.stats("doomed").unwrap().state, ChildState::GaveUp);
}

#[tokio::test]
async fn test_backoff_delays_restart() {
    let cancel = CancellationToken::new();
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), cancel.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let policy = RestartPolicy::Backoff(BackoffConfig {
        initial_interval: Duration::from_millis(40),
        max_interval: Duration::from_millis(40),
        randomization_factor: 0.0,
        ..BackoffConfig::default()
    });
    let spec = flaky_child("slow", 2, calls.clone(), cancel.clone()).with_restart_policy(policy);

    let started = std::time::Instant::now();
    supervisor.spawn(spec).unwrap();
    supervisor.join().await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn test_duplicate_child_rejected() {
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), CancellationToken::new());
    let spec = ChildSpec::new("worker", |cancel: CancellationToken| async move {
        cancel.cancelled().await;
        Ok(())
    });

    supervisor.spawn(spec.clone()).unwrap();
    assert_eq!(
        supervisor.spawn(spec),
        Err(SupervisorError::DuplicateChild("worker".to_string()))
    );
    supervisor.shutdown().await;
}
