//! Tracing configuration and log routing.
//!
//! Logs go to stdout through a compact formatter and to a file. `AROGYAM_LOG_FILE` selects the
//! file path; otherwise each binary appends to `logs/<component>.log` (`arogyam.log` for the chat
//! server, `ingest.log` for ingestion runs). The file layer writes through a non-blocking worker so
//! request handling never waits on disk.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_DIR: &str = "logs";

/// Configure tracing subscribers for stdout and file logging.
///
/// Respects `RUST_LOG` for filtering and defaults to `info`. `component` names the default log
/// file.
pub fn init_tracing(component: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    if let Some(writer) = configure_file_writer(component) {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

/// Returns `None` when the log directory cannot be created or the target file cannot be opened.
fn configure_file_writer(component: &str) -> Option<NonBlocking> {
    if let Ok(path) = std::env::var("AROGYAM_LOG_FILE") {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = LOG_GUARD.set(guard);
                Some(non_blocking)
            }
            Err(err) => {
                eprintln!("Failed to open log file {path}: {err}");
                None
            }
        }
    } else {
        if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
            eprintln!("Failed to create logs directory: {err}");
            return None;
        }
        let file_appender =
            tracing_appender::rolling::never(DEFAULT_LOG_DIR, default_log_file(component));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        Some(non_blocking)
    }
}

fn default_log_file(component: &str) -> String {
    let stem = component.trim();
    if stem.is_empty() {
        "arogyam.log".to_string()
    } else {
        format!("{stem}.log")
    }
}
