// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/specs`, `/api/task-groups`, `/api/tasks`, the running-agent
//! surface, and the question/answer surface (§6).

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use devswarm_core::{
    AgentInstanceId, EntityKind, Event, RoadmapItemId, SpecId, SpecStatus, TaskGroupId,
    TaskGroupStatus, TaskId, TaskStatus, UserQuestionId, MAIN_AGENT_ID,
};
use serde::{Deserialize, Serialize};

use super::{roadmap::blockers, ApiError};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/specs", get(list).post(create))
        .route("/api/specs/{id}", get(get_one).patch(update))
        .route("/api/task-groups", post(create_task_group))
        .route("/api/task-groups/{id}", patch(update_task_group))
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/{id}", patch(update_task))
        .route("/api/claudes", get(list_claudes))
        .route("/api/main/message", post(message_main))
        .route("/api/questions/pending", get(pending_questions))
        .route("/api/questions/{id}/answer", post(answer_question))
}

#[derive(Debug, Serialize)]
struct SpecView {
    #[serde(flatten)]
    spec: devswarm_core::Spec,
    task_groups: Vec<TaskGroupView>,
}

#[derive(Debug, Serialize)]
struct TaskGroupView {
    #[serde(flatten)]
    group: devswarm_core::TaskGroup,
    tasks: Vec<devswarm_core::Task>,
}

fn spec_view(spec: devswarm_core::Spec, state: &devswarm_storage::MaterializedState) -> SpecView {
    let task_groups = state
        .task_groups_for_spec(spec.id.as_str())
        .into_iter()
        .map(|group| TaskGroupView {
            group: group.clone(),
            tasks: state.tasks_for_group(group.id.as_str()).into_iter().cloned().collect(),
        })
        .collect();
    SpecView { spec, task_groups }
}

async fn list(State(state): State<SharedState>) -> Json<Vec<devswarm_core::Spec>> {
    Json(state.store.read().specs.values().cloned().collect())
}

async fn get_one(State(state): State<SharedState>, Path(id): Path<String>) -> Result<Json<SpecView>, ApiError> {
    let projection = state.store.read();
    let spec = projection.get_spec(&id).cloned().ok_or(ApiError::NotFound)?;
    Ok(Json(spec_view(spec, &projection)))
}

#[derive(Debug, Deserialize)]
struct CreateSpecRequest {
    roadmap_item_id: String,
    content: String,
}

async fn create(
    State(state): State<SharedState>,
    Json(request): Json<CreateSpecRequest>,
) -> Result<Json<devswarm_core::Spec>, ApiError> {
    let id = state
        .commands
        .create_spec(&RoadmapItemId::new(request.roadmap_item_id), request.content)
        .map_err(ApiError::from)?;
    let spec = state.store.read().get_spec(id.as_str()).cloned().ok_or(ApiError::Internal)?;
    Ok(Json(spec))
}

#[derive(Debug, Deserialize)]
struct UpdateSpecRequest {
    status: Option<SpecStatus>,
    error_message: Option<String>,
}

/// Setting `status=approved` requires the roadmap item to have no unresolved
/// dependencies (§6); setting `status=done` triggers the control loop's
/// next-tick push of `main` rather than doing it synchronously here.
async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSpecRequest>,
) -> Result<Json<devswarm_core::Spec>, ApiError> {
    let spec_id = SpecId::new(id);
    if let Some(SpecStatus::Approved) = request.status {
        let roadmap_item_id = state
            .store
            .read()
            .get_spec(spec_id.as_str())
            .map(|s| s.roadmap_item_id.clone())
            .ok_or(ApiError::NotFound)?;
        let blockers = blockers(&state.store.read(), EntityKind::RoadmapItem, roadmap_item_id.as_str());
        if !blockers.is_empty() {
            return Err(ApiError::DependencyViolation(blockers));
        }
    }

    if let Some(status) = request.status {
        state
            .commands
            .update_spec_status(&spec_id, status, request.error_message)
            .map_err(ApiError::from)?;
    }
    let spec = state.store.read().get_spec(spec_id.as_str()).cloned().ok_or(ApiError::NotFound)?;
    Ok(Json(spec))
}

#[derive(Debug, Deserialize)]
struct CreateTaskGroupRequest {
    spec_id: String,
    name: String,
    description: String,
    sequence: u32,
}

async fn create_task_group(
    State(state): State<SharedState>,
    Json(request): Json<CreateTaskGroupRequest>,
) -> Result<Json<devswarm_core::TaskGroup>, ApiError> {
    let id = state
        .commands
        .create_task_group(&SpecId::new(request.spec_id), request.name, request.description, request.sequence)
        .map_err(ApiError::from)?;
    let group = state.store.read().task_groups.get(id.as_str()).cloned().ok_or(ApiError::Internal)?;
    Ok(Json(group))
}

#[derive(Debug, Deserialize)]
struct UpdateTaskGroupRequest {
    status: TaskGroupStatus,
}

async fn update_task_group(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTaskGroupRequest>,
) -> Result<Json<devswarm_core::TaskGroup>, ApiError> {
    let id = TaskGroupId::new(id);
    state.commands.update_task_group_status(&id, request.status).map_err(ApiError::from)?;
    let group = state.store.read().task_groups.get(id.as_str()).cloned().ok_or(ApiError::NotFound)?;
    Ok(Json(group))
}

#[derive(Debug, Deserialize)]
struct CreateTaskRequest {
    group_id: String,
    description: String,
    sequence: u32,
}

async fn create_task(
    State(state): State<SharedState>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<devswarm_core::Task>, ApiError> {
    let id = state
        .commands
        .create_task(&TaskGroupId::new(request.group_id), request.description, request.sequence)
        .map_err(ApiError::from)?;
    let task = state.store.read().tasks.get(id.as_str()).cloned().ok_or(ApiError::Internal)?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
struct UpdateTaskRequest {
    status: TaskStatus,
    commit_hash: Option<String>,
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<devswarm_core::Task>, ApiError> {
    let id = TaskId::new(id);
    state
        .commands
        .update_task_status(&id, request.status, request.commit_hash)
        .map_err(ApiError::from)?;
    let task = state.store.read().tasks.get(id.as_str()).cloned().ok_or(ApiError::NotFound)?;
    Ok(Json(task))
}

async fn list_claudes(State(state): State<SharedState>) -> Json<Vec<devswarm_core::AgentInstance>> {
    Json(state.store.read().agent_instances.values().cloned().collect())
}

#[derive(Debug, Deserialize)]
struct MessageMainRequest {
    text: String,
}

async fn message_main(State(state): State<SharedState>, Json(request): Json<MessageMainRequest>) -> Result<(), ApiError> {
    if state.store.read().get_agent_instance(MAIN_AGENT_ID).is_none() {
        return Err(ApiError::NotFound);
    }
    state.orchestrator.dispatch_agent_message(AgentInstanceId::new(MAIN_AGENT_ID), request.text);
    Ok(())
}

async fn pending_questions(State(state): State<SharedState>) -> Json<Vec<devswarm_core::UserQuestion>> {
    Json(
        state
            .store
            .read()
            .user_questions
            .values()
            .filter(|q| q.status == devswarm_core::UserQuestionStatus::Pending)
            .cloned()
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct AnswerQuestionRequest {
    response: String,
}

/// Routes the answer back to the agent that asked (§6), appending it as a
/// fresh turn rather than a raw event so the agent sees it as input.
async fn answer_question(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<AnswerQuestionRequest>,
) -> Result<(), ApiError> {
    let projection = state.store.read();
    let question = projection.user_questions.get(&id).cloned().ok_or(ApiError::NotFound)?;
    drop(projection);

    state
        .store
        .append(Event::UserQuestionAnswered {
            id: UserQuestionId::new(id),
            response: request.response.clone(),
        })
        .map_err(|_| ApiError::Internal)?;
    state.orchestrator.dispatch_agent_message(question.agent_id, request.response);
    Ok(())
}
