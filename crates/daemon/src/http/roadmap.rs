// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `/api/roadmap` and its nested `/dependencies` surface (§6).

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use devswarm_core::{EntityKind, EntityRef, ResolutionMethod, RoadmapItemId, RoadmapItemStatus};
use serde::{Deserialize, Serialize};

use super::{ApiError, BlockerView};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/roadmap", get(list).post(create))
        .route("/api/roadmap/{id}", patch(update))
        .route(
            "/api/roadmap/{id}/dependencies",
            get(list_dependencies).post(add_dependency),
        )
        .route("/api/roadmap/{id}/dependencies/{dep_id}", delete(remove_dependency))
}

#[derive(Debug, Serialize)]
struct RoadmapItemView {
    #[serde(flatten)]
    item: devswarm_core::RoadmapItem,
    dependency_count: usize,
    has_unresolved: bool,
}

fn view(item: devswarm_core::RoadmapItem, state: &devswarm_storage::MaterializedState) -> RoadmapItemView {
    let deps = state.dependencies_blocking(EntityKind::RoadmapItem, item.id.as_str());
    RoadmapItemView {
        has_unresolved: deps.iter().any(|d| !d.resolved),
        dependency_count: deps.len(),
        item,
    }
}

async fn list(State(state): State<SharedState>) -> Json<Vec<RoadmapItemView>> {
    let projection = state.store.read();
    let items = projection.roadmap_items.values().cloned().map(|item| view(item, &projection)).collect();
    Json(items)
}

#[derive(Debug, Deserialize)]
struct CreateRoadmapItemRequest {
    title: String,
    description: String,
    #[serde(default)]
    resolution_method: Option<ResolutionMethod>,
}

async fn create(
    State(state): State<SharedState>,
    Json(request): Json<CreateRoadmapItemRequest>,
) -> Result<Json<RoadmapItemView>, ApiError> {
    let id = state
        .commands
        .create_roadmap_item(
            request.title,
            request.description,
            None,
            request.resolution_method.unwrap_or(ResolutionMethod::MergeAndPush),
        )
        .map_err(ApiError::from)?;
    let projection = state.store.read();
    let item = projection.get_roadmap_item(id.as_str()).cloned().ok_or(ApiError::Internal)?;
    Ok(Json(view(item, &projection)))
}

#[derive(Debug, Deserialize)]
struct UpdateRoadmapItemRequest {
    title: Option<String>,
    description: Option<String>,
    status: Option<RoadmapItemStatus>,
    resolution_method: Option<ResolutionMethod>,
}

async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoadmapItemRequest>,
) -> Result<Json<RoadmapItemView>, ApiError> {
    let id = RoadmapItemId::new(id);
    state
        .commands
        .update_roadmap_item(&id, request.title, request.description, request.status, request.resolution_method)
        .map_err(ApiError::from)?;
    let projection = state.store.read();
    let item = projection.get_roadmap_item(id.as_str()).cloned().ok_or(ApiError::NotFound)?;
    Ok(Json(view(item, &projection)))
}

async fn list_dependencies(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<Vec<devswarm_storage::DependencyDetail>> {
    Json(state.store.read().dependencies_blocking(EntityKind::RoadmapItem, &id))
}

#[derive(Debug, Deserialize)]
struct AddDependencyRequest {
    blocker_id: String,
}

#[derive(Debug, Serialize)]
struct AddDependencyResponse {
    id: String,
}

async fn add_dependency(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<AddDependencyRequest>,
) -> Result<Json<AddDependencyResponse>, ApiError> {
    let blocked = EntityRef::roadmap_item(id);
    let blocker = EntityRef::roadmap_item(request.blocker_id);
    let id = state.commands.add_dependency(blocker, blocked).map_err(ApiError::from)?;
    Ok(Json(AddDependencyResponse { id: id.as_str().to_string() }))
}

async fn remove_dependency(
    State(state): State<SharedState>,
    Path((_id, dep_id)): Path<(String, String)>,
) -> Result<(), ApiError> {
    state
        .commands
        .remove_dependency(&devswarm_core::DependencyId::new(dep_id))
        .map_err(ApiError::from)?;
    Ok(())
}

/// Shared with the specs handler: a blocker summary for 400 responses that
/// reject an approval while dependencies are unresolved (§7 "Dependency
/// violation").
pub(super) fn blockers(state: &devswarm_storage::MaterializedState, kind: EntityKind, id: &str) -> Vec<BlockerView> {
    state
        .dependencies_blocking(kind, id)
        .into_iter()
        .filter(|d| !d.resolved)
        .map(|d| BlockerView { id: d.blocker_id, title: d.blocker_title, status: d.blocker_status })
        .collect()
}
