//! Logging Initialization
//!
//! Configures tracing for the controller. The host embeds the controller in
//! a larger application, so initialization is best-effort and idempotent.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initializes tracing with an env-filter and a stdout layer.
///
/// When `log_dir` is given, a daily-rolling `clipbin.log` file layer is added
/// (best effort; the directory is created if missing). Calling this more than
/// once is harmless: subsequent calls are no-ops.
pub fn init_logging(log_dir: Option<&Path>) {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.map(|dir| {
        let _ = std::fs::create_dir_all(dir);
        let file_appender = tracing_appender::rolling::daily(dir, "clipbin.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, host re-entry).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
