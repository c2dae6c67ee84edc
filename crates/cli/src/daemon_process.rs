// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management: starting, stopping, and locating the
//! `devswarmd` binary and its log/lock files on disk.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use crate::client::ClientError;

/// Start the daemon in the background, returning the child process handle.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let binary = find_daemon_binary();
    Command::new(&binary)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon with SIGTERM, escalating to SIGKILL after the wait budget.
pub async fn stop_daemon(wait: Duration) -> bool {
    let Ok(Some(pid)) = read_daemon_pid() else {
        return false;
    };
    kill_signal("-15", pid);

    let start = Instant::now();
    while start.elapsed() < wait {
        if !process_exists(pid) {
            cleanup_stale_pid();
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    kill_signal("-9", pid);
    cleanup_stale_pid();
    true
}

fn find_daemon_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();
    let is_debug_build = current_exe.as_ref().and_then(|p| p.to_str()).is_some_and(|s| s.contains("target/debug"));

    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir).parent().and_then(|p| p.parent()).map(|p| p.join("target/debug/devswarmd"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return path;
                }
            }
        }
    }

    if let Some(ref exe) = current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("devswarmd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("devswarmd")
}

fn lock_path() -> Option<PathBuf> {
    crate::env::data_dir().map(|dir| dir.join("devswarmd.lock"))
}

pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let Some(path) = lock_path() else { return Err(ClientError::NoDataDir) };
    if !path.exists() {
        return Ok(None);
    }
    Ok(std::fs::read_to_string(&path).ok().and_then(|s| s.trim().parse().ok()))
}

fn cleanup_stale_pid() {
    if let Some(path) = lock_path() {
        let _ = std::fs::remove_file(path);
    }
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Greppable prefix devswarmd writes to its log at the start of each
/// startup attempt, used to scope startup-error detection to this run.
const STARTUP_MARKER_PREFIX: &str = "--- devswarmd: starting (pid: ";

pub fn log_path() -> Option<PathBuf> {
    crate::env::data_dir().map(|dir| dir.join("state").join("devswarm.log"))
}

pub fn read_startup_error() -> Option<String> {
    let content = std::fs::read_to_string(log_path()?).ok()?;
    parse_startup_error(&content)
}

fn parse_startup_error(content: &str) -> Option<String> {
    let start = content.rfind(STARTUP_MARKER_PREFIX)?;
    let errors: Vec<&str> = content[start..].lines().filter(|line| line.contains("ERROR")).collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_startup_error_finds_latest_run_only() {
        let content = format!(
            "{}1) ---\nERROR old failure\n\n{}2) ---\nINFO starting devswarmd\n",
            STARTUP_MARKER_PREFIX, STARTUP_MARKER_PREFIX
        );
        assert_eq!(parse_startup_error(&content), None);
    }

    #[test]
    fn parse_startup_error_surfaces_error_lines() {
        let content = format!("{}1) ---\nERROR failed to start daemon: port in use\n", STARTUP_MARKER_PREFIX);
        assert_eq!(parse_startup_error(&content), Some("ERROR failed to start daemon: port in use".to_string()));
    }
}
