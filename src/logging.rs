//! Tracing setup: journald when available, rolling file otherwise.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Verbosity comes from the `SCREENSHELF_LOG` environment variable
/// (trace, debug, info, warn, error); the default is `info`. On Linux
/// log records go to systemd-journald when a connection can be made,
/// everywhere else (or when journald is unreachable) they go to a daily
/// rolling file under `log_dir`.
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_env("SCREENSHELF_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(target_os = "linux")]
    if let Ok(journald_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(journald_layer)
            .init();
        tracing::info!("Logging initialized with journald backend");
        return Ok(());
    }

    let log_dir = log_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("screenshelf")
            .join("logs")
    });
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "screenshelf.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The worker guard must outlive main or buffered records are lost;
    // init() runs once, so parking it in a static is enough.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Logging initialized with file backend at {:?}", log_dir);
    Ok(())
}
