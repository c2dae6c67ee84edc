// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain events — the single source of truth appended to the write-ahead
//! log and folded into the materialized projection (§3: "every entity is
//! additionally modeled as a closed, tagged Event enum variant set").
//!
//! Every state mutation in this system is first expressed as one of these
//! variants. `#[serde(tag = "type")]` keeps the wire/WAL representation
//! self-describing; unknown future variants fall into `Custom` so that a
//! WAL written by a newer build can still be opened (best-effort) by an
//! older one.

use serde::{Deserialize, Serialize};

use crate::agent_instance::{AgentInstanceId, AgentRole};
use crate::dependency::DependencyId;
use crate::entity::EntityRef;
use crate::roadmap_item::{ResolutionMethod, RoadmapItemId, RoadmapItemStatus};
use crate::spec::{SpecId, SpecStatus};
use crate::task::{TaskId, TaskStatus};
use crate::task_group::{TaskGroupId, TaskGroupStatus};
use crate::user_question::UserQuestionId;

/// Classification of an agent-reported failure (§4.3 "Agent-error
/// classification").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentError {
    Unauthorized,
    OutOfCredits,
    NoInternet,
    RateLimited,
    Other { message: String },
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::Unauthorized => write!(f, "unauthorized"),
            AgentError::OutOfCredits => write!(f, "out of credits"),
            AgentError::NoInternet => write!(f, "no internet connection"),
            AgentError::RateLimited => write!(f, "rate limited"),
            AgentError::Other { message } => write!(f, "{message}"),
        }
    }
}

/// Whether a freshly-parsed chunk of assistant output starts a new logical
/// message or continues the previous one (§4.3 streaming parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    New,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // --- RoadmapItem ---
    RoadmapItemCreated {
        id: RoadmapItemId,
        title: String,
        description: String,
        issue_id: Option<u64>,
        issue_url: Option<String>,
        resolution_method: ResolutionMethod,
    },
    RoadmapItemUpdated {
        id: RoadmapItemId,
        title: Option<String>,
        description: Option<String>,
        status: Option<RoadmapItemStatus>,
        resolution_method: Option<ResolutionMethod>,
    },
    RoadmapItemSpecLinked {
        id: RoadmapItemId,
        spec_id: SpecId,
    },
    RoadmapItemIssueClosed {
        id: RoadmapItemId,
    },

    // --- Spec ---
    SpecCreated {
        id: SpecId,
        roadmap_item_id: RoadmapItemId,
        content: String,
    },
    SpecStatusChanged {
        id: SpecId,
        status: SpecStatus,
        error_message: Option<String>,
    },
    SpecWorkspaceAssigned {
        id: SpecId,
        worktree_name: String,
        branch_name: String,
    },
    SpecDeleted {
        id: SpecId,
    },

    // --- TaskGroup / Task ---
    TaskGroupCreated {
        id: TaskGroupId,
        spec_id: SpecId,
        name: String,
        description: String,
        sequence: u32,
    },
    TaskGroupStatusChanged {
        id: TaskGroupId,
        status: TaskGroupStatus,
    },
    TaskCreated {
        id: TaskId,
        group_id: TaskGroupId,
        description: String,
        sequence: u32,
    },
    TaskStatusChanged {
        id: TaskId,
        status: TaskStatus,
        commit_hash: Option<String>,
    },

    // --- AgentInstance lifecycle ---
    AgentInstanceCreated {
        id: AgentInstanceId,
        role: AgentRole,
        context: Option<EntityRef>,
        worktree_name: Option<String>,
        started_at_ms: u64,
    },
    AgentInstanceStatusChanged {
        id: AgentInstanceId,
        status: crate::agent_instance::AgentInstanceStatus,
        resume_handle: Option<String>,
    },

    // --- Agent Supervisor output events (§4.3 "Events emitted") ---
    AgentOutput {
        id: AgentInstanceId,
        text: String,
        message_id: String,
        kind: OutputKind,
        at_ms: u64,
    },
    AgentQuestion {
        question_id: UserQuestionId,
        agent_id: AgentInstanceId,
        text: String,
    },
    AgentTaskComplete {
        id: AgentInstanceId,
    },
    AgentMessageComplete {
        id: AgentInstanceId,
    },
    AgentIdle {
        id: AgentInstanceId,
    },
    AgentError {
        id: AgentInstanceId,
        error: AgentError,
    },

    // --- UserQuestion ---
    UserQuestionAnswered {
        id: UserQuestionId,
        response: String,
    },

    // --- Dependency ---
    DependencyCreated {
        id: DependencyId,
        blocker: EntityRef,
        blocked: EntityRef,
    },
    DependencyResolved {
        id: DependencyId,
    },
    DependencyDeleted {
        id: DependencyId,
    },

    // --- AuthState ---
    AuthStateSet {
        key: String,
        value: String,
    },

    // --- Daemon lifecycle ---
    ShutdownProgress {
        stage: String,
    },

    /// Forward-compatibility catch-all for variants a newer build wrote that
    /// this build does not know about. Never produced by this build itself.
    #[serde(other)]
    Custom,
}

impl Event {
    /// Short machine-stable name, used for log fields (mirrors the teacher's
    /// `Event::name()`).
    pub fn name(&self) -> &'static str {
        match self {
            Event::RoadmapItemCreated { .. } => "roadmap_item_created",
            Event::RoadmapItemUpdated { .. } => "roadmap_item_updated",
            Event::RoadmapItemSpecLinked { .. } => "roadmap_item_spec_linked",
            Event::RoadmapItemIssueClosed { .. } => "roadmap_item_issue_closed",
            Event::SpecCreated { .. } => "spec_created",
            Event::SpecStatusChanged { .. } => "spec_status_changed",
            Event::SpecWorkspaceAssigned { .. } => "spec_workspace_assigned",
            Event::SpecDeleted { .. } => "spec_deleted",
            Event::TaskGroupCreated { .. } => "task_group_created",
            Event::TaskGroupStatusChanged { .. } => "task_group_status_changed",
            Event::TaskCreated { .. } => "task_created",
            Event::TaskStatusChanged { .. } => "task_status_changed",
            Event::AgentInstanceCreated { .. } => "agent_instance_created",
            Event::AgentInstanceStatusChanged { .. } => "agent_instance_status_changed",
            Event::AgentOutput { .. } => "agent_output",
            Event::AgentQuestion { .. } => "agent_question",
            Event::AgentTaskComplete { .. } => "agent_task_complete",
            Event::AgentMessageComplete { .. } => "agent_message_complete",
            Event::AgentIdle { .. } => "agent_idle",
            Event::AgentError { .. } => "agent_error",
            Event::UserQuestionAnswered { .. } => "user_question_answered",
            Event::DependencyCreated { .. } => "dependency_created",
            Event::DependencyResolved { .. } => "dependency_resolved",
            Event::DependencyDeleted { .. } => "dependency_deleted",
            Event::AuthStateSet { .. } => "auth_state_set",
            Event::ShutdownProgress { .. } => "shutdown_progress",
            Event::Custom => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let event = Event::SpecStatusChanged {
            id: SpecId::new("iss-1-fix"),
            status: SpecStatus::Validating,
            error_message: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn unknown_variant_deserializes_to_custom() {
        let json = r#"{"type":"something_from_the_future","foo":1}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event, Event::Custom);
    }
}
