// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory layout, lock acquisition, and store bootstrap ahead of serving
//! traffic. Mirrors the sequencing a prior generation of this daemon used
//! for its Unix-socket IPC server: lock first (so a second instance fails
//! fast), then directories, then replay, then bind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use devswarm_adapters::{ChildProcessAgentAdapter, Git2WorktreeManager, GitHubCodeHostAdapter};
use devswarm_core::SequentialIdGen;
use devswarm_engine::{EngineError, Orchestrator, OrchestratorConfig, Store, SharedStore};
use fs2::FileExt;

use crate::config::Config;
use crate::state::ConcreteOrchestrator;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("could not determine data directory")]
    NoDataDir,

    #[error("failed to acquire lock: daemon already running against this data directory?")]
    LockFailed(#[source] std::io::Error),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("io error: {0}")]
    Io(std::io::Error),
}

/// A held exclusive lock on `<data_dir>/devswarmd.lock`; releasing it (by
/// dropping) is what lets a subsequent `bootstrap` succeed against the same
/// data directory.
pub struct DataDirLock {
    file: std::fs::File,
    path: PathBuf,
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn acquire_lock(data_dir: &Path) -> Result<DataDirLock, StartupError> {
    let path = data_dir.join("devswarmd.lock");
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(StartupError::Io)?;
    file.try_lock_exclusive().map_err(StartupError::LockFailed)?;
    file.set_len(0).map_err(StartupError::Io)?;
    let mut handle = &file;
    writeln!(handle, "{}", std::process::id()).map_err(StartupError::Io)?;
    Ok(DataDirLock { file, path })
}

pub struct Bootstrap {
    pub lock: DataDirLock,
    pub store: SharedStore,
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub ids: SequentialIdGen,
}

/// Creates the on-disk layout (`db/`, `bare.git/`, `worktrees/`, `state/`,
/// `config/`), opens the event store (replaying the WAL on top of the most
/// recent snapshot), initializes the bare mirror if it doesn't exist yet,
/// and wires the three concrete adapters into an [`Orchestrator`].
pub async fn bootstrap(config: &Config) -> Result<Bootstrap, StartupError> {
    std::fs::create_dir_all(&config.data_dir).map_err(StartupError::Io)?;
    let lock = acquire_lock(&config.data_dir)?;

    for dir in [config.data_dir.join("db"), config.worktrees_path(), config.data_dir.join("state"), config.data_dir.join("config")] {
        std::fs::create_dir_all(&dir).map_err(StartupError::Io)?;
    }

    let store = Arc::new(Store::open(&config.db_wal_path(), &config.db_snapshot_path())?);

    let worktree = Git2WorktreeManager::new(config.bare_repo_path(), config.worktrees_path(), "gh".to_string());
    worktree
        .init(&config.repo_url)
        .await
        .map_err(|error| StartupError::Io(std::io::Error::new(std::io::ErrorKind::Other, error.to_string())))?;

    let agent = ChildProcessAgentAdapter::new();
    let codehost = GitHubCodeHostAdapter::new(config.repo_owner.clone(), config.repo_name.clone(), config.github_token.clone());
    let ids = SequentialIdGen::default();

    let orchestrator_config = OrchestratorConfig {
        tick_interval: config.tick_interval,
        github_sync_interval: config.sync_interval,
        agent_idle_threshold_ms: config.agent_idle_threshold_ms,
        agent_runtime_bound_ms: config.agent_runtime_bound_ms,
        agent_command: config.agent_command.clone(),
        validation: config.validation.clone(),
        ..OrchestratorConfig::default()
    };

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        agent,
        worktree,
        codehost,
        ids.clone(),
        devswarm_core::SystemClock,
        orchestrator_config,
    ));

    Ok(Bootstrap { lock, store, orchestrator, ids })
}
