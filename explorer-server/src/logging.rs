//! Structured logging setup: an env-filtered stdout layer plus a rotating
//! file sink, mirroring the original's split `python_exec`/`script_exec`
//! rotating log files — here, the `event::user`/`event::script` targets
//! written by `/log_event` (see `crate::http`) land in the same file
//! hierarchy as everything else instead of two bespoke handlers.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. The returned guard must be
/// held for the process lifetime; dropping it stops the file appender from
/// flushing.
pub fn init(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "explorer-server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
