//! One-for-one supervisor
//!
//! Children are independent: a failing child is restarted on its own and its
//! siblings never notice.

use crate::child_spec::ChildSpec;
use crate::restart::{CircuitBreaker, RestartPolicy, RestartTracker};
use dashmap::DashMap;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Configuration for the supervisor
#[derive(Debug, Clone, Default)]
pub struct SupervisorConfig {
    /// Restart policy for children that do not set their own
    pub restart_policy: RestartPolicy,

    /// Stop restarting a child that fails too often. `None` restarts forever.
    pub circuit_breaker: Option<CircuitBreaker>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("a child named '{0}' is already supervised")]
    DuplicateChild(String),
}

/// Lifecycle state of a child
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildState {
    #[default]
    Starting,
    Running,
    Restarting,
    Stopped,
    GaveUp,
}

/// Restart bookkeeping for one child
#[derive(Debug, Clone, Default)]
pub struct ChildStats {
    pub state: ChildState,
    pub starts: u64,
    pub failures: u64,
    pub clean_exits: u64,
    pub last_error: Option<String>,
}

/// Why a child stopped being supervised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Cancelled,
    GaveUp,
}

/// Runs children and restarts them when they stop
pub struct Supervisor {
    config: SupervisorConfig,
    cancel: CancellationToken,
    children: Arc<DashMap<String, ChildStats>>,
    handles: Vec<(String, JoinHandle<ChildExit>)>,
}

impl Supervisor {
    /// Create a supervisor; cancelling `cancel` stops every child
    pub fn new(config: SupervisorConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            cancel,
            children: Arc::new(DashMap::new()),
            handles: Vec::new(),
        }
    }

    /// Start supervising a child in its own task
    pub fn spawn(&mut self, spec: ChildSpec) -> Result<(), SupervisorError> {
        let name = spec.name().to_string();
        if self.children.contains_key(&name) {
            return Err(SupervisorError::DuplicateChild(name));
        }
        self.children.insert(name.clone(), ChildStats::default());

        let policy = spec
            .restart_policy()
            .cloned()
            .unwrap_or_else(|| self.config.restart_policy.clone());
        let tracker = RestartTracker::new(policy, self.config.circuit_breaker);

        let handle = tokio::spawn(supervise(
            spec,
            tracker,
            self.cancel.clone(),
            self.children.clone(),
        ));
        self.handles.push((name, handle));
        Ok(())
    }

    /// Snapshot of a child's restart statistics
    pub fn stats(&self, name: &str) -> Option<ChildStats> {
        self.children.get(name).map(|s| s.clone())
    }

    /// Names of all children ever spawned
    pub fn children(&self) -> Vec<String> {
        let mut names: Vec<String> = self.children.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Wait until every child has stopped
    pub async fn join(&mut self) -> Vec<(String, ChildExit)> {
        let handles = std::mem::take(&mut self.handles);
        let mut exits = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let exit = match handle.await {
                Ok(exit) => exit,
                Err(e) => {
                    error!(child = %name, error = %e, "supervision task aborted");
                    ChildExit::GaveUp
                }
            };
            exits.push((name, exit));
        }
        info!("supervisor stopped");
        exits
    }

    /// Cancel every child and wait for them to stop
    pub async fn shutdown(&mut self) -> Vec<(String, ChildExit)> {
        self.cancel.cancel();
        self.join().await
    }
}

fn update(children: &DashMap<String, ChildStats>, name: &str, f: impl FnOnce(&mut ChildStats)) {
    if let Some(mut stats) = children.get_mut(name) {
        f(&mut *stats);
    }
}

async fn supervise(
    spec: ChildSpec,
    mut tracker: RestartTracker,
    cancel: CancellationToken,
    children: Arc<DashMap<String, ChildStats>>,
) -> ChildExit {
    let name = spec.name().to_string();
    info!(child = %name, "starting child");

    loop {
        if cancel.is_cancelled() {
            update(&children, &name, |s| s.state = ChildState::Stopped);
            return ChildExit::Cancelled;
        }

        update(&children, &name, |s| {
            s.state = ChildState::Running;
            s.starts += 1;
        });

        let started = Instant::now();
        let run = AssertUnwindSafe(spec.start(cancel.child_token())).catch_unwind();
        let result = tokio::select! {
            () = cancel.cancelled() => {
                update(&children, &name, |s| s.state = ChildState::Stopped);
                return ChildExit::Cancelled;
            }
            result = run => result,
        };

        match result {
            Ok(Ok(())) => {
                update(&children, &name, |s| s.clean_exits += 1);
                if cancel.is_cancelled() {
                    continue;
                }
                info!(child = %name, "child returned");
            }
            Ok(Err(e)) => {
                let message = format!("{e:#}");
                error!(child = %name, error = %message, "child failed");
                update(&children, &name, |s| {
                    s.failures += 1;
                    s.last_error = Some(message);
                });
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panic".to_string());
                error!(child = %name, error = %message, "child panicked");
                update(&children, &name, |s| {
                    s.failures += 1;
                    s.last_error = Some(message);
                });
            }
        }

        let Some(delay) = tracker.next_delay(started.elapsed()) else {
            error!(child = %name, "restarting too often, giving up");
            update(&children, &name, |s| s.state = ChildState::GaveUp);
            return ChildExit::GaveUp;
        };

        update(&children, &name, |s| s.state = ChildState::Restarting);
        if delay.is_zero() {
            warn!(child = %name, "restarting");
            // Yield so a tight restart loop cannot starve sibling tasks
            tokio::task::yield_now().await;
        } else {
            warn!(child = %name, delay = ?delay, "restarting after delay");
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
