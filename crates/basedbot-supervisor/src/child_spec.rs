//! Description of a supervised child

use crate::restart::RestartPolicy;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One run of a child, from start to failure or return
pub type ChildFuture = BoxFuture<'static, anyhow::Result<()>>;

type StartFn = dyn Fn(CancellationToken) -> ChildFuture + Send + Sync;

/// How to start a child, and optionally how to restart it
///
/// The start function is called once per run; each call must begin from
/// scratch (e.g. open a new stream subscription).
#[derive(Clone)]
pub struct ChildSpec {
    name: String,
    start: Arc<StartFn>,
    restart_policy: Option<RestartPolicy>,
}

impl ChildSpec {
    /// Create a child spec from a start function
    pub fn new<F, Fut>(name: impl Into<String>, start: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            start: Arc::new(move |cancel| start(cancel).boxed()),
            restart_policy: None,
        }
    }

    /// Use `policy` for this child instead of the supervisor default
    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn restart_policy(&self) -> Option<&RestartPolicy> {
        self.restart_policy.as_ref()
    }

    pub(crate) fn start(&self, cancel: CancellationToken) -> ChildFuture {
        (self.start)(cancel)
    }
}

impl fmt::Debug for ChildSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSpec")
            .field("name", &self.name)
            .field("restart_policy", &self.restart_policy)
            .finish_non_exhaustive()
    }
}
