// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state — the in-memory projection rebuilt by folding the WAL's
//! `Event` stream. This is a pure fold: `apply` never fails and never does
//! I/O; it is the single place that turns an `Event` into the entity maps
//! queried by the rest of the system.

use std::collections::HashMap;

use devswarm_core::{
    AgentError as AgentErrorKind, AgentInstance, AgentInstanceStatus, Dependency, Event,
    OutputKind, RoadmapItem, RoadmapItemId, RoadmapItemStatus, Spec, Task, TaskGroup,
    UserQuestion, UserQuestionStatus,
};
use serde::{Deserialize, Serialize};

/// A transcript entry of the most recent output chunk for an agent, used by
/// the HTTP `claude_output` stream and for debugging; not authoritative state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutputRecord {
    pub text: String,
    pub message_id: String,
    pub kind_is_new: bool,
    pub at_ms: u64,
}

/// The full in-process projection of every domain entity (§3, §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    pub roadmap_items: HashMap<String, RoadmapItem>,
    pub specs: HashMap<String, Spec>,
    pub task_groups: HashMap<String, TaskGroup>,
    pub tasks: HashMap<String, Task>,
    pub agent_instances: HashMap<String, AgentInstance>,
    pub user_questions: HashMap<String, UserQuestion>,
    pub dependencies: HashMap<String, Dependency>,
    pub auth_state: HashMap<String, String>,
    /// Maps an issue id to the roadmap item that was created for it, so sync
    /// can detect "already mapped" issues (§4.4 step 1).
    pub roadmap_item_by_issue: HashMap<u64, String>,
    /// Most recent output chunk per agent, for display/debugging.
    pub last_output: HashMap<String, AgentOutputRecord>,
}

impl MaterializedState {
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::RoadmapItemCreated {
                id,
                title,
                description,
                issue_id,
                issue_url,
                resolution_method,
            } => {
                let item = RoadmapItem::new(
                    id.clone(),
                    title.clone(),
                    description.clone(),
                    devswarm_core::IssueRef {
                        issue_id: *issue_id,
                        issue_url: issue_url.clone(),
                    },
                    *resolution_method,
                    0,
                );
                if let Some(issue_id) = issue_id {
                    self.roadmap_item_by_issue
                        .insert(*issue_id, id.as_str().to_string());
                }
                self.roadmap_items.insert(id.as_str().to_string(), item);
            }
            Event::RoadmapItemUpdated {
                id,
                title,
                description,
                status,
                resolution_method,
            } => {
                if let Some(item) = self.roadmap_items.get_mut(id.as_str()) {
                    if let Some(title) = title {
                        item.title = title.clone();
                    }
                    if let Some(description) = description {
                        item.description = description.clone();
                    }
                    if let Some(status) = status {
                        item.status = *status;
                        if *status == RoadmapItemStatus::Done {
                            item.closed = true;
                        }
                    }
                    if let Some(method) = resolution_method {
                        item.resolution_method = *method;
                    }
                }
                if matches!(status, Some(RoadmapItemStatus::Done)) {
                    self.resolve_dependencies_blocked_by_roadmap_item(id);
                }
            }
            Event::RoadmapItemSpecLinked { id, spec_id } => {
                if let Some(item) = self.roadmap_items.get_mut(id.as_str()) {
                    item.spec_id = Some(spec_id.as_str().to_string());
                }
            }
            Event::RoadmapItemIssueClosed { id } => {
                if let Some(item) = self.roadmap_items.get_mut(id.as_str()) {
                    item.github_issue_closed = true;
                }
            }

            Event::SpecCreated {
                id,
                roadmap_item_id,
                content,
            } => {
                let spec = Spec::new(id.clone(), roadmap_item_id.clone(), content.clone(), 0);
                self.specs.insert(id.as_str().to_string(), spec);
            }
            Event::SpecStatusChanged {
                id,
                status,
                error_message,
            } => {
                if let Some(spec) = self.specs.get_mut(id.as_str()) {
                    spec.status = *status;
                    spec.error_message = error_message.clone();
                }
            }
            Event::SpecWorkspaceAssigned {
                id,
                worktree_name,
                branch_name,
            } => {
                if let Some(spec) = self.specs.get_mut(id.as_str()) {
                    spec.worktree_name = Some(worktree_name.clone());
                    spec.branch_name = Some(branch_name.clone());
                }
            }
            Event::SpecDeleted { id } => {
                self.specs.remove(id.as_str());
            }

            Event::TaskGroupCreated {
                id,
                spec_id,
                name,
                description,
                sequence,
            } => {
                let group = TaskGroup::new(
                    id.clone(),
                    spec_id.clone(),
                    name.clone(),
                    description.clone(),
                    *sequence,
                    0,
                );
                self.task_groups.insert(id.as_str().to_string(), group);
            }
            Event::TaskGroupStatusChanged { id, status } => {
                if let Some(group) = self.task_groups.get_mut(id.as_str()) {
                    group.status = *status;
                }
            }
            Event::TaskCreated {
                id,
                group_id,
                description,
                sequence,
            } => {
                let task = Task::new(id.clone(), group_id.clone(), description.clone(), *sequence, 0);
                self.tasks.insert(id.as_str().to_string(), task);
            }
            Event::TaskStatusChanged {
                id,
                status,
                commit_hash,
            } => {
                if let Some(task) = self.tasks.get_mut(id.as_str()) {
                    task.status = *status;
                    if commit_hash.is_some() {
                        task.commit_hash = commit_hash.clone();
                    }
                }
            }

            Event::AgentInstanceCreated {
                id,
                role,
                context,
                worktree_name,
                started_at_ms,
            } => {
                let mut agent = AgentInstance::new(id.clone(), *role, context.clone(), 0);
                agent.worktree_name = worktree_name.clone();
                agent.started_at_ms = Some(*started_at_ms);
                agent.status = AgentInstanceStatus::Running;
                self.agent_instances.insert(id.as_str().to_string(), agent);
            }
            Event::AgentInstanceStatusChanged {
                id,
                status,
                resume_handle,
            } => {
                if let Some(agent) = self.agent_instances.get_mut(id.as_str()) {
                    agent.status = *status;
                    if resume_handle.is_some() {
                        agent.resume_handle = resume_handle.clone();
                    }
                }
            }

            Event::AgentOutput {
                id,
                text,
                message_id,
                kind,
                at_ms,
            } => {
                if let Some(agent) = self.agent_instances.get_mut(id.as_str()) {
                    agent.last_output_at_ms = Some(*at_ms);
                }
                self.last_output.insert(
                    id.as_str().to_string(),
                    AgentOutputRecord {
                        text: text.clone(),
                        message_id: message_id.clone(),
                        kind_is_new: matches!(kind, OutputKind::New),
                        at_ms: *at_ms,
                    },
                );
            }
            Event::AgentQuestion {
                question_id,
                agent_id,
                text,
            } => {
                let question =
                    UserQuestion::new(question_id.clone(), agent_id.clone(), text.clone(), 0);
                self.user_questions
                    .insert(question_id.as_str().to_string(), question);
            }
            Event::AgentTaskComplete { .. } | Event::AgentMessageComplete { .. } => {}
            Event::AgentIdle { id } => {
                if let Some(agent) = self.agent_instances.get_mut(id.as_str()) {
                    agent.status = AgentInstanceStatus::Stopped;
                }
            }
            Event::AgentError { .. } => {}

            Event::UserQuestionAnswered { id, response } => {
                if let Some(question) = self.user_questions.get_mut(id.as_str()) {
                    question.response = Some(response.clone());
                    question.status = UserQuestionStatus::Answered;
                }
            }

            Event::DependencyCreated {
                id,
                blocker,
                blocked,
            } => {
                let dep = Dependency::new(id.clone(), blocker.clone(), blocked.clone(), 0);
                self.dependencies.insert(id.as_str().to_string(), dep);
            }
            Event::DependencyResolved { id } => {
                if let Some(dep) = self.dependencies.get_mut(id.as_str()) {
                    dep.resolved = true;
                }
            }
            Event::DependencyDeleted { id } => {
                self.dependencies.remove(id.as_str());
            }

            Event::AuthStateSet { key, value } => {
                self.auth_state.insert(key.clone(), value.clone());
            }

            Event::ShutdownProgress { .. } => {}
            Event::Custom => {}
        }
    }

    fn resolve_dependencies_blocked_by_roadmap_item(&mut self, roadmap_item_id: &RoadmapItemId) {
        for dep in self.dependencies.values_mut() {
            if dep.blocker.kind == devswarm_core::EntityKind::RoadmapItem
                && dep.blocker.id == roadmap_item_id.as_str()
            {
                dep.resolved = true;
            }
        }
    }

    pub fn get_roadmap_item(&self, id: &str) -> Option<&RoadmapItem> {
        self.roadmap_items.get(id)
    }

    pub fn get_spec(&self, id: &str) -> Option<&Spec> {
        self.specs.get(id)
    }

    pub fn get_agent_instance(&self, id: &str) -> Option<&AgentInstance> {
        self.agent_instances.get(id)
    }

    pub fn task_groups_for_spec(&self, spec_id: &str) -> Vec<&TaskGroup> {
        let mut groups: Vec<&TaskGroup> = self
            .task_groups
            .values()
            .filter(|g| g.spec_id.as_str() == spec_id)
            .collect();
        groups.sort_by_key(|g| g.sequence);
        groups
    }

    pub fn tasks_for_group(&self, group_id: &str) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.group_id.as_str() == group_id)
            .collect();
        tasks.sort_by_key(|t| t.sequence);
        tasks
    }

    /// Whether `(kind, id)` has any unresolved dependency where it is the
    /// *blocked* side.
    pub fn has_unresolved_dependencies(&self, kind: devswarm_core::EntityKind, id: &str) -> bool {
        self.dependencies
            .values()
            .any(|d| d.blocked.kind == kind && d.blocked.id == id && !d.resolved)
    }

    /// Dependencies blocking `(kind, id)`, joined with the blocker's current
    /// title/status for display (§4.1 "getDependenciesWithDetails").
    pub fn dependencies_blocking(
        &self,
        kind: devswarm_core::EntityKind,
        id: &str,
    ) -> Vec<DependencyDetail> {
        self.dependencies
            .values()
            .filter(|d| d.blocked.kind == kind && d.blocked.id == id)
            .map(|d| {
                let (title, status) = match d.blocker.kind {
                    devswarm_core::EntityKind::RoadmapItem => self
                        .roadmap_items
                        .get(d.blocker.id.as_str())
                        .map(|item| (item.title.clone(), item.status.to_string()))
                        .unwrap_or_else(|| ("<unknown>".to_string(), "unknown".to_string())),
                    devswarm_core::EntityKind::Spec => self
                        .specs
                        .get(d.blocker.id.as_str())
                        .map(|s| (s.id.to_string(), s.status.to_string()))
                        .unwrap_or_else(|| ("<unknown>".to_string(), "unknown".to_string())),
                };
                DependencyDetail {
                    dependency_id: d.id.as_str().to_string(),
                    blocker_id: d.blocker.id.clone(),
                    blocker_title: title,
                    blocker_status: status,
                    resolved: d.resolved,
                }
            })
            .collect()
    }

    pub fn all_edges(&self) -> Vec<(devswarm_core::EntityRef, devswarm_core::EntityRef)> {
        self.dependencies
            .values()
            .map(|d| (d.blocker.clone(), d.blocked.clone()))
            .collect()
    }

    pub fn agent_error_kind_name(kind: &AgentErrorKind) -> &'static str {
        match kind {
            AgentErrorKind::Unauthorized => "unauthorized",
            AgentErrorKind::OutOfCredits => "out_of_credits",
            AgentErrorKind::NoInternet => "no_internet",
            AgentErrorKind::RateLimited => "rate_limited",
            AgentErrorKind::Other { .. } => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyDetail {
    pub dependency_id: String,
    pub blocker_id: String,
    pub blocker_title: String,
    pub blocker_status: String,
    pub resolved: bool,
}

#[cfg(test)]
#[path = "state_tests_new.rs"]
mod tests;
