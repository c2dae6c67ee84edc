// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects — side actions as serializable data, decoupling the control
//! loop's decisions from the adapters that actually execute them. Each
//! variant logs its own structured fields before execution (design note:
//! "every Effect-like side-action ... logged at info! with its structured
//! fields before execution").

use serde::{Deserialize, Serialize};

use crate::agent_instance::{AgentInstanceId, AgentRole};
use crate::entity::EntityRef;
use crate::roadmap_item::RoadmapItemId;
use crate::spec::SpecId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    SpawnAgent {
        id: AgentInstanceId,
        role: AgentRole,
        worktree_name: String,
        context: Option<EntityRef>,
        initial_message: String,
    },
    SendToAgent {
        id: AgentInstanceId,
        message: String,
    },
    InterruptAgent {
        id: AgentInstanceId,
    },
    StopAgent {
        id: AgentInstanceId,
    },
    CreateWorktree {
        name: String,
        base_branch: String,
    },
    RemoveWorktree {
        name: String,
    },
    MergeBranch {
        spec_id: SpecId,
        source_branch: String,
        target_branch: String,
    },
    PushBranch {
        branch: String,
    },
    CreatePullRequest {
        spec_id: SpecId,
        branch: String,
        title: String,
        body: String,
    },
    RunValidationCommand {
        spec_id: SpecId,
        worktree_name: String,
        command: String,
    },
    CloseIssue {
        roadmap_item_id: RoadmapItemId,
        issue_id: u64,
    },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::SpawnAgent { .. } => "spawn_agent",
            Effect::SendToAgent { .. } => "send_to_agent",
            Effect::InterruptAgent { .. } => "interrupt_agent",
            Effect::StopAgent { .. } => "stop_agent",
            Effect::CreateWorktree { .. } => "create_worktree",
            Effect::RemoveWorktree { .. } => "remove_worktree",
            Effect::MergeBranch { .. } => "merge_branch",
            Effect::PushBranch { .. } => "push_branch",
            Effect::CreatePullRequest { .. } => "create_pull_request",
            Effect::RunValidationCommand { .. } => "run_validation_command",
            Effect::CloseIssue { .. } => "close_issue",
        }
    }

    /// Structured key/value pairs for a `tracing` span, without re-deriving
    /// a `Debug` dump of the whole effect (keeps logs grep-able).
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::SpawnAgent {
                id,
                role,
                worktree_name,
                ..
            } => vec![
                ("agent_id", id.to_string()),
                ("role", role.to_string()),
                ("worktree", worktree_name.clone()),
            ],
            Effect::SendToAgent { id, .. } => vec![("agent_id", id.to_string())],
            Effect::InterruptAgent { id } | Effect::StopAgent { id } => {
                vec![("agent_id", id.to_string())]
            }
            Effect::CreateWorktree { name, base_branch } => vec![
                ("worktree", name.clone()),
                ("base_branch", base_branch.clone()),
            ],
            Effect::RemoveWorktree { name } => vec![("worktree", name.clone())],
            Effect::MergeBranch {
                spec_id,
                source_branch,
                target_branch,
            } => vec![
                ("spec_id", spec_id.to_string()),
                ("source", source_branch.clone()),
                ("target", target_branch.clone()),
            ],
            Effect::PushBranch { branch } => vec![("branch", branch.clone())],
            Effect::CreatePullRequest {
                spec_id, branch, ..
            } => vec![("spec_id", spec_id.to_string()), ("branch", branch.clone())],
            Effect::RunValidationCommand {
                spec_id, command, ..
            } => vec![("spec_id", spec_id.to_string()), ("command", command.clone())],
            Effect::CloseIssue {
                roadmap_item_id,
                issue_id,
            } => vec![
                ("roadmap_item_id", roadmap_item_id.to_string()),
                ("issue_id", issue_id.to_string()),
            ],
        }
    }
}
