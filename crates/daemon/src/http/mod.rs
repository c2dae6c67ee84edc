// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The semantic HTTP surface (§6): plumbing (routing, CORS, tracing layer)
//! is deliberately thin — each submodule owns one resource family.

pub mod events;
mod roadmap;
mod shutdown;
mod specs;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use devswarm_engine::CommandError;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(roadmap::router())
        .merge(specs::router())
        .merge(shutdown::router())
        .route("/events", get(events::handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
pub(crate) struct BlockerView {
    pub id: String,
    pub title: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct DependencyErrorBody {
    error: String,
    blockers: Vec<BlockerView>,
}

/// The four behavioral categories HTTP handlers translate store/command
/// errors into (§7: "Local precondition", "Dependency violation").
pub(crate) enum ApiError {
    NotFound,
    Conflict(String),
    DependencyViolation(Vec<BlockerView>),
    BadRequest(String),
    Internal,
}

impl From<CommandError> for ApiError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::NotFound(_) => ApiError::NotFound,
            CommandError::Conflict(message) => ApiError::Conflict(message),
            CommandError::DependencyCycle => ApiError::BadRequest("dependency would create a cycle or is self-referential".to_string()),
            CommandError::Engine(error) => {
                tracing::error!(%error, "command rejected by engine");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, Json(ErrorBody { error: "not found".to_string() })).into_response(),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, Json(ErrorBody { error: message })).into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response(),
            ApiError::DependencyViolation(blockers) => (
                StatusCode::BAD_REQUEST,
                Json(DependencyErrorBody {
                    error: "unresolved dependencies block this transition".to_string(),
                    blockers,
                }),
            )
                .into_response(),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: "internal error".to_string() })).into_response(),
        }
    }
}
