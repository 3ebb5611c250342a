//! basedbot Supervisor
//!
//! Crash-only supervision for long-running workers:
//! - Every child runs in its own task, independent of its siblings
//! - A child that fails (or returns) is logged and started again from scratch
//! - Restart delay is immediate by default, exponential backoff on request
//! - An optional circuit breaker gives up on a child that restarts too often
//! - A shared cancellation token stops every child

pub mod child_spec;
pub mod restart;
pub mod supervisor;

pub use child_spec::{ChildFuture, ChildSpec};
pub use restart::{BackoffConfig, CircuitBreaker, RestartPolicy};
pub use supervisor::{ChildExit, ChildState, ChildStats, Supervisor, SupervisorConfig, SupervisorError};
