use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` sets the filter (default `info`), `BASEDBOT_LOG_JSON=1`
/// switches to JSON lines and `BASEDBOT_LOG_FILE` appends to a file instead
/// of writing to stderr.
pub fn init_logging() -> std::io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("BASEDBOT_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);
    let file = match std::env::var_os("BASEDBOT_LOG_FILE") {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_names(true);

    match (use_json, file) {
        (true, Some(file)) => {
            let _ = builder.json().with_writer(Mutex::new(file)).try_init();
        }
        (true, None) => {
            let _ = builder.json().with_writer(std::io::stderr).try_init();
        }
        (false, Some(file)) => {
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        (false, None) => {
            let _ = builder.pretty().with_writer(std::io::stderr).try_init();
        }
    }

    Ok(())
}
