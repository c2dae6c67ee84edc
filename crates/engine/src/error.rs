// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use devswarm_adapters::{AgentAdapterError, CodeHostError, WorktreeError};
use devswarm_storage::{SnapshotError, WalError};
use thiserror::Error;

use crate::commands::CommandError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("agent adapter error: {0}")]
    Agent(#[from] AgentAdapterError),
    #[error("worktree error: {0}")]
    Worktree(#[from] WorktreeError),
    #[error("code host error: {0}")]
    CodeHost(#[from] CodeHostError),
    #[error("command rejected: {0}")]
    Command(Box<CommandError>),
    #[error("validation command failed: {0}")]
    Validation(String),
    #[error("unknown entity: {0}")]
    NotFound(String),
}

impl From<CommandError> for EngineError {
    fn from(error: CommandError) -> Self {
        EngineError::Command(Box::new(error))
    }
}
