// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use devswarm_core::{
    AgentInstanceId, AgentRole, DependencyId, EntityRef, ResolutionMethod, RoadmapItemId, SpecId,
    TaskGroupId, TaskId, UserQuestionId,
};

fn roadmap_item_created(id: &str, issue_id: Option<u64>) -> Event {
    Event::RoadmapItemCreated {
        id: RoadmapItemId::new(id),
        title: format!("Item {id}"),
        description: "desc".to_string(),
        issue_id,
        issue_url: None,
        resolution_method: ResolutionMethod::MergeAndPush,
    }
}

#[test]
fn roadmap_item_created_is_indexed_by_issue() {
    let mut state = MaterializedState::default();
    state.apply(&roadmap_item_created("r1", Some(42)));
    assert!(state.get_roadmap_item("r1").is_some());
    assert_eq!(state.roadmap_item_by_issue.get(&42), Some(&"r1".to_string()));
}

#[test]
fn roadmap_item_done_resolves_dependencies_it_blocks() {
    let mut state = MaterializedState::default();
    state.apply(&roadmap_item_created("r1", None));
    state.apply(&roadmap_item_created("r2", None));
    state.apply(&Event::DependencyCreated {
        id: DependencyId::new("d1"),
        blocker: EntityRef::roadmap_item("r1"),
        blocked: EntityRef::roadmap_item("r2"),
    });
    assert!(state.has_unresolved_dependencies(devswarm_core::EntityKind::RoadmapItem, "r2"));

    state.apply(&Event::RoadmapItemUpdated {
        id: RoadmapItemId::new("r1"),
        title: None,
        description: None,
        status: Some(devswarm_core::RoadmapItemStatus::Done),
        resolution_method: None,
    });

    assert!(!state.has_unresolved_dependencies(devswarm_core::EntityKind::RoadmapItem, "r2"));
    let details = state.dependencies_blocking(devswarm_core::EntityKind::RoadmapItem, "r2");
    assert_eq!(details.len(), 1);
    assert!(details[0].resolved);
}

#[test]
fn spec_and_task_hierarchy_folds_in_sequence_order() {
    let mut state = MaterializedState::default();
    state.apply(&roadmap_item_created("r1", None));
    state.apply(&Event::SpecCreated {
        id: SpecId::new("iss-1-foo"),
        roadmap_item_id: RoadmapItemId::new("r1"),
        content: "plan".to_string(),
    });
    state.apply(&Event::TaskGroupCreated {
        id: TaskGroupId::new("g2"),
        spec_id: SpecId::new("iss-1-foo"),
        name: "second".to_string(),
        description: "".to_string(),
        sequence: 1,
    });
    state.apply(&Event::TaskGroupCreated {
        id: TaskGroupId::new("g1"),
        spec_id: SpecId::new("iss-1-foo"),
        name: "first".to_string(),
        description: "".to_string(),
        sequence: 0,
    });
    state.apply(&Event::TaskCreated {
        id: TaskId::new("t1"),
        group_id: TaskGroupId::new("g1"),
        description: "step".to_string(),
        sequence: 0,
    });

    let groups = state.task_groups_for_spec("iss-1-foo");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id.as_str(), "g1");
    assert_eq!(groups[1].id.as_str(), "g2");

    let tasks = state.tasks_for_group("g1");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id.as_str(), "t1");
}

#[test]
fn spec_workspace_assignment_and_status_changes_apply() {
    let mut state = MaterializedState::default();
    state.apply(&roadmap_item_created("r1", None));
    state.apply(&Event::SpecCreated {
        id: SpecId::new("iss-1-foo"),
        roadmap_item_id: RoadmapItemId::new("r1"),
        content: "plan".to_string(),
    });
    state.apply(&Event::SpecWorkspaceAssigned {
        id: SpecId::new("iss-1-foo"),
        worktree_name: "wt-iss-1-foo".to_string(),
        branch_name: "devswarm/iss-1-foo".to_string(),
    });
    let spec = state.get_spec("iss-1-foo").unwrap();
    assert!(spec.has_workspace());

    state.apply(&Event::SpecStatusChanged {
        id: SpecId::new("iss-1-foo"),
        status: devswarm_core::SpecStatus::Error,
        error_message: Some("boom".to_string()),
    });
    let spec = state.get_spec("iss-1-foo").unwrap();
    assert_eq!(spec.status, devswarm_core::SpecStatus::Error);
    assert_eq!(spec.error_message.as_deref(), Some("boom"));
}

#[test]
fn agent_lifecycle_and_output_tracking() {
    let mut state = MaterializedState::default();
    state.apply(&Event::AgentInstanceCreated {
        id: AgentInstanceId::new("a1"),
        role: AgentRole::Worker,
        context: Some(EntityRef::roadmap_item("r1")),
        worktree_name: Some("wt-1".to_string()),
        started_at_ms: 1_000,
    });
    let agent = state.get_agent_instance("a1").unwrap();
    assert_eq!(agent.status, devswarm_core::AgentInstanceStatus::Running);
    assert_eq!(agent.started_at_ms, Some(1_000));

    state.apply(&Event::AgentOutput {
        id: AgentInstanceId::new("a1"),
        text: "hello".to_string(),
        message_id: "m1".to_string(),
        kind: devswarm_core::OutputKind::New,
        at_ms: 5_000,
    });
    let agent = state.get_agent_instance("a1").unwrap();
    assert_eq!(agent.last_output_at_ms, Some(5_000));
    assert!(agent.idle_for_at_least(65_000, 60_000));

    state.apply(&Event::AgentIdle {
        id: AgentInstanceId::new("a1"),
    });
    assert_eq!(
        state.get_agent_instance("a1").unwrap().status,
        devswarm_core::AgentInstanceStatus::Stopped
    );
}

#[test]
fn agent_question_is_recorded_and_answerable() {
    let mut state = MaterializedState::default();
    state.apply(&Event::AgentQuestion {
        question_id: UserQuestionId::new("q1"),
        agent_id: AgentInstanceId::new("a1"),
        text: "which db?".to_string(),
    });
    assert_eq!(
        state.user_questions.get("q1").unwrap().status,
        devswarm_core::UserQuestionStatus::Pending
    );
    state.apply(&Event::UserQuestionAnswered {
        id: UserQuestionId::new("q1"),
        response: "postgres".to_string(),
    });
    let question = state.user_questions.get("q1").unwrap();
    assert_eq!(question.status, devswarm_core::UserQuestionStatus::Answered);
    assert_eq!(question.response.as_deref(), Some("postgres"));
}

#[test]
fn dependency_deleted_is_removed_from_state() {
    let mut state = MaterializedState::default();
    state.apply(&Event::DependencyCreated {
        id: DependencyId::new("d1"),
        blocker: EntityRef::roadmap_item("r1"),
        blocked: EntityRef::roadmap_item("r2"),
    });
    assert!(state.dependencies.contains_key("d1"));
    state.apply(&Event::DependencyDeleted {
        id: DependencyId::new("d1"),
    });
    assert!(!state.dependencies.contains_key("d1"));
}

#[test]
fn unknown_custom_event_is_a_no_op() {
    let mut state = MaterializedState::default();
    state.apply(&Event::Custom);
    assert!(state.roadmap_items.is_empty());
}
