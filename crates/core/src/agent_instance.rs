// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentInstance — a supervised child process running the agent runtime.

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::entity::EntityRef;

define_id! {
    pub struct AgentInstanceId;
}

/// The id reserved for the singleton orchestrating agent (invariant #5).
pub const MAIN_AGENT_ID: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Main,
    SpecCreator,
    Coordinator,
    Worker,
}

impl AgentRole {
    /// `coordinator`/`worker` are bound by the 1-hour wall-clock cap (§4.3);
    /// `main`/`spec_creator` are not.
    pub fn has_runtime_bound(&self) -> bool {
        matches!(self, AgentRole::Coordinator | AgentRole::Worker)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentRole::Main => "main",
            AgentRole::SpecCreator => "spec_creator",
            AgentRole::Coordinator => "coordinator",
            AgentRole::Worker => "worker",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentInstanceStatus {
    Created,
    Running,
    Paused,
    Stopped,
}

impl AgentInstanceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentInstanceStatus::Stopped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub id: AgentInstanceId,
    pub role: AgentRole,
    pub status: AgentInstanceStatus,
    pub resume_handle: Option<String>,
    pub worktree_name: Option<String>,
    pub context: Option<EntityRef>,
    /// Monotonic-clock epoch millis of the last emitted `output` event; used
    /// by the implicit-completion idle check (§4.4 step 4).
    pub last_output_at_ms: Option<u64>,
    /// Wall-clock epoch millis the child process was started, for the
    /// 1-hour runtime bound on `coordinator`/`worker` roles.
    pub started_at_ms: Option<u64>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl AgentInstance {
    pub fn new(
        id: AgentInstanceId,
        role: AgentRole,
        context: Option<EntityRef>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            role,
            status: AgentInstanceStatus::Created,
            resume_handle: None,
            worktree_name: None,
            context,
            last_output_at_ms: None,
            started_at_ms: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Whether this instance has been idle (no output) for at least
    /// `idle_ms` as of `now_ms`. Used by the implicit-completion check.
    pub fn idle_for_at_least(&self, now_ms: u64, idle_ms: u64) -> bool {
        match self.last_output_at_ms {
            Some(last) => now_ms.saturating_sub(last) >= idle_ms,
            None => false,
        }
    }

    /// Whether a `coordinator`/`worker` instance has exceeded its 1-hour cap.
    pub fn exceeded_runtime_bound(&self, now_ms: u64, bound_ms: u64) -> bool {
        if !self.role.has_runtime_bound() {
            return false;
        }
        match self.started_at_ms {
            Some(start) => now_ms.saturating_sub(start) >= bound_ms,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_coordinator_and_worker_have_runtime_bounds() {
        assert!(AgentRole::Coordinator.has_runtime_bound());
        assert!(AgentRole::Worker.has_runtime_bound());
        assert!(!AgentRole::Main.has_runtime_bound());
        assert!(!AgentRole::SpecCreator.has_runtime_bound());
    }

    #[test]
    fn idle_check_is_false_before_any_output() {
        let agent = AgentInstance::new(AgentInstanceId::new("a1"), AgentRole::Coordinator, None, 0);
        assert!(!agent.idle_for_at_least(100_000, 60_000));
    }

    #[test]
    fn idle_check_respects_threshold() {
        let mut agent =
            AgentInstance::new(AgentInstanceId::new("a1"), AgentRole::Coordinator, None, 0);
        agent.last_output_at_ms = Some(1_000);
        assert!(!agent.idle_for_at_least(1_500, 1_000));
        assert!(agent.idle_for_at_least(61_000, 60_000));
    }
}
