// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers, used by the git worktree manager and the
//! code-host client for anything `git2` doesn't expose directly.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for worktree add/remove/merge/push operations.
pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for a single validation command (lint, build).
pub const VALIDATION_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{description} failed: {io_err}")),
        Err(_elapsed) => Err(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        )),
    }
}

/// Truncate combined stdout/stderr to the last `max_bytes`, at a char boundary,
/// for embedding in a Spec's error message (§4.5: "truncated (≤2KB) tail").
pub fn truncate_tail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let start = text.len() - max_bytes;
    let mut start = start;
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_with_timeout_runs_fast_command() {
        let mut cmd = Command::new("true");
        cmd.kill_on_drop(true);
        let output = run_with_timeout(cmd, Duration::from_secs(5), "true").await.unwrap();
        assert!(output.status.success());
    }

    #[tokio::test]
    async fn run_with_timeout_reports_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5").kill_on_drop(true);
        let result = run_with_timeout(cmd, Duration::from_millis(50), "sleep").await;
        assert!(result.unwrap_err().contains("timed out"));
    }

    #[test]
    fn truncate_tail_keeps_text_under_limit_unchanged() {
        assert_eq!(truncate_tail("short", 2048), "short");
    }

    #[test]
    fn truncate_tail_cuts_to_last_n_bytes() {
        let text = "a".repeat(3000);
        let tail = truncate_tail(&text, 2048);
        assert_eq!(tail.len(), 2048);
    }
}
