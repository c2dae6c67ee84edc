// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs the configured lint/build commands inside a spec's worktree before
//! it is merged (§4.5). Each command gets its own timeout; a non-zero exit
//! fails validation with a truncated tail of its combined output.

use std::path::Path;

use devswarm_adapters::subprocess::{run_with_timeout, truncate_tail, VALIDATION_COMMAND_TIMEOUT};
use tokio::process::Command;

const MAX_TAIL_BYTES: usize = 2048;

#[derive(Debug, Clone)]
pub struct ValidationCommand {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub commands: Vec<ValidationCommand>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            commands: vec![
                ValidationCommand {
                    name: "lint".to_string(),
                    program: "cargo".to_string(),
                    args: vec!["clippy".to_string(), "--all-targets".to_string()],
                },
                ValidationCommand {
                    name: "build".to_string(),
                    program: "cargo".to_string(),
                    args: vec!["build".to_string()],
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub command: String,
    pub tail: String,
}

/// Runs every configured command in order inside `worktree_path`, stopping
/// at the first failure.
pub async fn run_validation(worktree_path: &Path, config: &ValidationConfig) -> Result<(), ValidationFailure> {
    for command in &config.commands {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).current_dir(worktree_path);
        let output = run_with_timeout(cmd, VALIDATION_COMMAND_TIMEOUT, &command.name)
            .await
            .map_err(|error| ValidationFailure {
                command: command.name.clone(),
                tail: truncate_tail(&error, MAX_TAIL_BYTES),
            })?;
        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ValidationFailure {
                command: command.name.clone(),
                tail: truncate_tail(&combined, MAX_TAIL_BYTES),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_for(program: &str, args: &[&str]) -> ValidationConfig {
        ValidationConfig {
            commands: vec![ValidationCommand {
                name: "check".to_string(),
                program: program.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
            }],
        }
    }

    #[tokio::test]
    async fn successful_command_passes_validation() {
        let config = config_for("true", &[]);
        let result = run_validation(&PathBuf::from("."), &config).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn failing_command_reports_truncated_tail() {
        let config = config_for("sh", &["-c", "echo boom 1>&2; exit 1"]);
        let result = run_validation(&PathBuf::from("."), &config).await;
        let failure = result.unwrap_err();
        assert_eq!(failure.command, "check");
        assert!(failure.tail.contains("boom"));
    }
}
