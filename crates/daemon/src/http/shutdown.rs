// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /shutdown` (§6): requests a graceful stop of the control loop.
//! The full `shutdown_progress` sequence (`stopping_orchestrator`,
//! `closing_database`, `complete`) is driven by `main`'s `drain`, which runs
//! regardless of whether shutdown was triggered from here or from a unix
//! signal — this handler only wakes the loop's `Notify`.

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new().route("/shutdown", post(shutdown))
}

async fn shutdown(State(state): State<SharedState>) {
    state.shutdown.notify_waiters();
}
