// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (§2.1 "Ambient stack"): environment-derived at
//! startup, with `.devswarm/config.toml` overrides for anything that isn't
//! security-sensitive, following the teacher's `.oj/config.toml` pattern.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Project-local overrides read from `.devswarm/config.toml`. Every field is
/// optional: a missing file, or a missing key within it, falls back to the
/// environment-derived default.
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    sync_interval_secs: Option<u64>,
    tick_interval_secs: Option<u64>,
    agent_idle_threshold_ms: Option<u64>,
    agent_runtime_bound_ms: Option<u64>,
    agent_command: Option<String>,
    validation_commands: Option<Vec<ValidationCommandOverride>>,
}

#[derive(Debug, Deserialize)]
struct ValidationCommandOverride {
    name: String,
    program: String,
    args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Root data directory (`db/`, `bare.git/`, `worktrees/`, `state/`, `config/`).
    pub data_dir: PathBuf,
    /// Upstream repository clone URL.
    pub repo_url: String,
    pub repo_owner: String,
    pub repo_name: String,
    /// TCP port the HTTP surface binds to.
    pub port: u16,
    /// Code-host (GitHub) API token.
    pub github_token: String,
    /// Agent runtime executable, e.g. the `claude` CLI.
    pub agent_command: String,
    pub sync_interval: Duration,
    pub tick_interval: Duration,
    pub agent_idle_threshold_ms: u64,
    pub agent_runtime_bound_ms: u64,
    pub validation: devswarm_engine::ValidationConfig,
    pub log_path: PathBuf,
}

impl Config {
    /// Load from environment, then apply `<data_dir>/config/config.toml`
    /// overrides for the non-security-sensitive fields.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("DEVSWARM_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/var/lib/devswarm"));
        let repo_url = require_env("DEVSWARM_REPO_URL")?;
        let repo_owner = require_env("DEVSWARM_REPO_OWNER")?;
        let repo_name = require_env("DEVSWARM_REPO_NAME")?;
        let github_token = require_env("DEVSWARM_GITHUB_TOKEN")?;
        let port = std::env::var("DEVSWARM_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4190);

        let mut config = Self {
            log_path: data_dir.join("state").join("devswarm.log"),
            data_dir,
            repo_url,
            repo_owner,
            repo_name,
            port,
            github_token,
            agent_command: "claude".to_string(),
            sync_interval: Duration::from_secs(60),
            tick_interval: Duration::from_secs(5),
            agent_idle_threshold_ms: 60_000,
            agent_runtime_bound_ms: 3_600_000,
            validation: devswarm_engine::ValidationConfig::default(),
        };

        config.apply_file_overrides()?;
        Ok(config)
    }

    fn config_toml_path(&self) -> PathBuf {
        self.data_dir.join("config").join("config.toml")
    }

    fn apply_file_overrides(&mut self) -> Result<(), ConfigError> {
        let path = self.config_toml_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => return Err(ConfigError::ReadFile { path, source }),
        };
        let overrides: FileOverrides =
            toml::from_str(&contents).map_err(|source| ConfigError::ParseToml { path, source })?;

        if let Some(secs) = overrides.sync_interval_secs {
            self.sync_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.tick_interval_secs {
            self.tick_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = overrides.agent_idle_threshold_ms {
            self.agent_idle_threshold_ms = ms;
        }
        if let Some(ms) = overrides.agent_runtime_bound_ms {
            self.agent_runtime_bound_ms = ms;
        }
        if let Some(command) = overrides.agent_command {
            self.agent_command = command;
        }
        if let Some(commands) = overrides.validation_commands {
            self.validation = devswarm_engine::ValidationConfig {
                commands: commands
                    .into_iter()
                    .map(|c| devswarm_engine::ValidationCommand {
                        name: c.name,
                        program: c.program,
                        args: c.args,
                    })
                    .collect(),
            };
        }
        Ok(())
    }

    pub fn db_wal_path(&self) -> PathBuf {
        self.data_dir.join("db").join("wal.jsonl")
    }

    pub fn db_snapshot_path(&self) -> PathBuf {
        self.data_dir.join("db").join("snapshot.json")
    }

    pub fn bare_repo_path(&self) -> PathBuf {
        self.data_dir.join("bare.git")
    }

    pub fn worktrees_path(&self) -> PathBuf {
        self.data_dir.join("worktrees")
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}
