// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Agent Supervisor adapter surface (§4.3): owns each agent's child
//! process directly (no terminal multiplexer, no on-disk session log — the
//! child's own stdout is the event source) and turns its framed JSON output
//! into domain [`Event`](devswarm_core::Event)s.

mod classify;
#[cfg(any(test, feature = "test-support"))]
mod fake;
mod parser;
mod process;

pub use classify::classify_agent_error;
pub use parser::{scan_markers, DetectedMarkers, JsonFrameExtractor};
pub use process::ChildProcessAgentAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAgentAdapter;

use std::path::PathBuf;

use async_trait::async_trait;
use devswarm_core::{AgentInstanceId, AgentRole, Event};
use tokio::sync::mpsc;

/// Everything needed to bind a freshly-created `AgentInstance` to a working
/// directory and an invocation command, without spawning anything yet.
#[derive(Debug, Clone)]
pub struct AgentSpawnConfig {
    pub id: AgentInstanceId,
    pub role: AgentRole,
    /// The agent runtime's executable, e.g. the configured CLI binary.
    pub command: String,
    /// Flags applied to every invocation of this instance (print mode,
    /// output format, permission mode, etc.), before any resume flag.
    pub base_args: Vec<String>,
    /// Flag name used to resume a prior conversation, e.g. `"--resume"`.
    pub resume_flag: String,
    /// Carried across a daemon restart so the next invocation picks the
    /// conversation back up instead of starting cold.
    pub resume_handle: Option<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentAdapterError {
    #[error("agent instance {0} is not known to this adapter")]
    NotFound(AgentInstanceId),
    #[error("agent instance {0} already has an invocation in flight")]
    Busy(AgentInstanceId),
    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),
    #[error("failed to write to agent stdin: {0}")]
    SendFailed(String),
}

/// Supervises the lifecycle of one agent instance's child process
/// invocations. A single adapter instance manages every `AgentInstance` in
/// the system, keyed by [`AgentInstanceId`].
#[async_trait]
pub trait AgentAdapter: Clone + Send + Sync + 'static {
    /// Register the instance and bind its working directory. Does not spawn
    /// a process — each turn is a fresh invocation started by
    /// [`send_message`](Self::send_message).
    async fn start(&self, config: AgentSpawnConfig) -> Result<(), AgentAdapterError>;

    /// Spawn one invocation of the agent runtime, write `text` to its stdin
    /// and close it, then stream parsed domain events to `events` as the
    /// child's stdout is consumed. Resolves once the child has exited.
    /// Refuses to start a second invocation while one is already running.
    async fn send_message(
        &self,
        id: &AgentInstanceId,
        text: &str,
        events: mpsc::Sender<Event>,
    ) -> Result<(), AgentAdapterError>;

    /// Kill the invocation currently in flight, if any, returning the last
    /// known resume handle so the turn can be continued later.
    async fn interrupt(&self, id: &AgentInstanceId) -> Result<Option<String>, AgentAdapterError>;

    /// Hard-terminate any invocation in flight and drop the instance's
    /// bookkeeping entirely.
    async fn stop(&self, id: &AgentInstanceId) -> Result<(), AgentAdapterError>;
}
