// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state handed to every HTTP handler: the store, the
//! typed command façade, the control loop, and the dashboard fan-out
//! (§6 "Event stream").

use std::sync::Arc;

use devswarm_adapters::{ChildProcessAgentAdapter, Git2WorktreeManager, GitHubCodeHostAdapter};
use devswarm_core::{SequentialIdGen, SystemClock};
use devswarm_engine::{Orchestrator, SharedStore, StateStore};
use tokio::sync::{broadcast, Notify};

use crate::http::events::DashboardEvent;

/// The concrete adapter stack this binary drives the engine with. Tests
/// exercise `Orchestrator` directly against the fake adapters instead.
pub type ConcreteOrchestrator =
    Orchestrator<ChildProcessAgentAdapter, Git2WorktreeManager, GitHubCodeHostAdapter, SequentialIdGen, SystemClock>;

const DASHBOARD_CHANNEL_CAPACITY: usize = 256;

pub struct AppState {
    pub store: SharedStore,
    pub commands: StateStore<SequentialIdGen, SystemClock>,
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub dashboard_tx: broadcast::Sender<DashboardEvent>,
    pub shutdown: Arc<Notify>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: SharedStore, orchestrator: Arc<ConcreteOrchestrator>, ids: SequentialIdGen) -> Self {
        let commands = StateStore::new(store.clone(), ids, SystemClock);
        let (dashboard_tx, _rx) = broadcast::channel(DASHBOARD_CHANNEL_CAPACITY);
        let shutdown = orchestrator.shutdown_handle();
        Self {
            store,
            commands,
            orchestrator,
            dashboard_tx,
            shutdown,
        }
    }

    /// Spawns the background task that subscribes to the store's raw domain
    /// events and republishes them as the semantic dashboard event catalog
    /// (§6), feeding every connected websocket observer.
    pub fn spawn_dashboard_fanout(self: &Arc<Self>) {
        let state = Arc::clone(self);
        let mut events = state.store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Some(dashboard_event) = crate::http::events::translate(&event, &state.store.read()) {
                            let _ = state.dashboard_tx.send(dashboard_event);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "dashboard fan-out lagged, resending full state");
                        let snapshot = DashboardEvent::state_snapshot(&state.store.read());
                        let _ = state.dashboard_tx.send(snapshot);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
