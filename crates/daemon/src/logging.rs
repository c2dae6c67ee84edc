// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log file rotation and `tracing` subscriber setup.

use std::io::Write;
use std::path::Path;

use crate::startup::StartupError;

/// Rotate the daemon log file once it exceeds this size.
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures never block startup.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Prefix of the marker line written at the start of every startup attempt;
/// greppable by operators tailing the log across restarts.
const STARTUP_MARKER_PREFIX: &str = "--- devswarmd: starting (pid: ";

pub fn write_startup_marker(log_path: &Path) -> Result<(), StartupError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(StartupError::Io)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(StartupError::Io)?;
    writeln!(file, "{STARTUP_MARKER_PREFIX}{}) ---\n", std::process::id()).map_err(StartupError::Io)?;
    Ok(())
}

/// Written synchronously (bypassing the async tracing writer) so the error
/// is on disk even if the process exits before the non-blocking queue flushes.
pub fn write_startup_error(log_path: &Path, error: &StartupError) {
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

pub fn setup(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, StartupError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).map_err(StartupError::Io)?;
    }

    let dir = log_path.parent().ok_or(StartupError::NoDataDir)?;
    let file_name = log_path.file_name().ok_or(StartupError::NoDataDir)?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
