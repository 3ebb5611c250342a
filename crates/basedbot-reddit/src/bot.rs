//! Wiring stream workers into a supervisor

use basedbot_core::{Forum, StreamKind, StreamWorker, WorkerConfig, WorkerIdentity};
use basedbot_supervisor::{ChildSpec, Supervisor, SupervisorError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Start a posts worker and a comments worker for `forum_name`, each
/// supervised on its own. Both share `forum`.
pub fn spawn_workers<F>(
    supervisor: &mut Supervisor,
    forum: Arc<F>,
    forum_name: &str,
    config: &WorkerConfig,
) -> Result<Vec<Arc<StreamWorker<F>>>, SupervisorError>
where
    F: Forum + ?Sized + 'static,
{
    let mut workers = Vec::with_capacity(2);

    for kind in [StreamKind::Submissions, StreamKind::Comments] {
        let identity = WorkerIdentity::new(kind, forum_name);
        let worker = Arc::new(StreamWorker::with_config(
            identity,
            forum.clone(),
            config.clone(),
        ));

        let spec = {
            let worker = worker.clone();
            ChildSpec::new(worker.identity().name().to_string(), move |cancel: CancellationToken| {
                let worker = worker.clone();
                async move { worker.run(&cancel).await.map_err(anyhow::Error::from) }
            })
        };
        supervisor.spawn(spec)?;
        workers.push(worker);
    }

    Ok(workers)
}
