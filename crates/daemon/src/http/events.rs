// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event-stream websocket (§6): a long-lived subscription delivering
//! the semantic dashboard event catalog, fed by [`crate::state::AppState::spawn_dashboard_fanout`].

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use devswarm_core::{AgentInstance, Event, RoadmapItem, Spec, Task, TaskGroup};
use devswarm_storage::MaterializedState;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DashboardEvent {
    State {
        roadmap: Vec<RoadmapItem>,
        specs: Vec<Spec>,
        agents: Vec<AgentInstance>,
    },
    RoadmapUpdate {
        item: RoadmapItem,
    },
    SpecUpdate {
        spec: Spec,
    },
    ClaudeUpdate {
        agent: AgentInstance,
    },
    TaskGroupUpdate {
        task_group: TaskGroup,
    },
    TaskUpdate {
        task: Task,
    },
    ClaudeOutput {
        instance_id: String,
        role: String,
        worktree: Option<String>,
        text: String,
        message_type: String,
        message_id: String,
        ts: u64,
    },
    Question {
        id: String,
        agent_id: String,
        text: String,
    },
    ShutdownProgress {
        stage: String,
    },
}

impl DashboardEvent {
    pub fn state_snapshot(state: &MaterializedState) -> Self {
        DashboardEvent::State {
            roadmap: state.roadmap_items.values().cloned().collect(),
            specs: state.specs.values().cloned().collect(),
            agents: state.agent_instances.values().cloned().collect(),
        }
    }
}

/// Translates one durable domain [`Event`] into the semantic event a
/// dashboard observer understands, looking up the rest of the entity from
/// `state` (already folded with this event by the time this runs).
pub fn translate(event: &Event, state: &MaterializedState) -> Option<DashboardEvent> {
    match event {
        Event::RoadmapItemCreated { id, .. }
        | Event::RoadmapItemUpdated { id, .. }
        | Event::RoadmapItemSpecLinked { id, .. }
        | Event::RoadmapItemIssueClosed { id } => {
            state.get_roadmap_item(id.as_str()).cloned().map(|item| DashboardEvent::RoadmapUpdate { item })
        }
        Event::SpecCreated { id, .. } | Event::SpecStatusChanged { id, .. } | Event::SpecWorkspaceAssigned { id, .. } => {
            state.get_spec(id.as_str()).cloned().map(|spec| DashboardEvent::SpecUpdate { spec })
        }
        Event::TaskGroupCreated { id, .. } | Event::TaskGroupStatusChanged { id, .. } => state
            .task_groups
            .get(id.as_str())
            .cloned()
            .map(|task_group| DashboardEvent::TaskGroupUpdate { task_group }),
        Event::TaskCreated { id, .. } | Event::TaskStatusChanged { id, .. } => {
            state.tasks.get(id.as_str()).cloned().map(|task| DashboardEvent::TaskUpdate { task })
        }
        Event::AgentInstanceCreated { id, .. } | Event::AgentInstanceStatusChanged { id, .. } => {
            state.get_agent_instance(id.as_str()).cloned().map(|agent| DashboardEvent::ClaudeUpdate { agent })
        }
        Event::AgentOutput { id, text, message_id, kind, at_ms } => Some(DashboardEvent::ClaudeOutput {
            instance_id: id.as_str().to_string(),
            role: state
                .get_agent_instance(id.as_str())
                .map(|a| a.role.to_string())
                .unwrap_or_default(),
            worktree: state.get_agent_instance(id.as_str()).and_then(|a| a.worktree_name.clone()),
            text: text.clone(),
            message_type: match kind {
                devswarm_core::OutputKind::New => "new".to_string(),
                devswarm_core::OutputKind::Continue => "continue".to_string(),
            },
            message_id: message_id.clone(),
            ts: *at_ms,
        }),
        Event::AgentQuestion { question_id, agent_id, text } => Some(DashboardEvent::Question {
            id: question_id.as_str().to_string(),
            agent_id: agent_id.as_str().to_string(),
            text: text.clone(),
        }),
        Event::ShutdownProgress { stage } => Some(DashboardEvent::ShutdownProgress { stage: stage.clone() }),
        // Task-completion/idle/error and dependency/auth events have no direct
        // dashboard counterpart of their own; the entity they touch (a Spec or
        // AgentInstance) is already covered by its own status-changed event.
        _ => None,
    }
}

pub async fn handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(socket, state))
}

async fn run(mut socket: WebSocket, state: SharedState) {
    let snapshot = DashboardEvent::state_snapshot(&state.store.read());
    if send(&mut socket, &snapshot).await.is_err() {
        return;
    }

    let mut rx = state.dashboard_tx.subscribe();
    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if send(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn send(socket: &mut WebSocket, event: &DashboardEvent) -> Result<(), axum::Error> {
    let Ok(text) = serde_json::to_string(event) else {
        return Ok(());
    };
    socket.send(Message::Text(text.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_core::{ResolutionMethod, RoadmapItemId};

    #[test]
    fn roadmap_created_translates_once_state_has_folded_it() {
        let mut state = MaterializedState::default();
        let event = Event::RoadmapItemCreated {
            id: RoadmapItemId::new("ri-1"),
            title: "t".to_string(),
            description: "d".to_string(),
            issue_id: None,
            issue_url: None,
            resolution_method: ResolutionMethod::MergeAndPush,
        };
        state.apply(&event);
        let translated = translate(&event, &state);
        assert!(matches!(translated, Some(DashboardEvent::RoadmapUpdate { .. })));
    }

    #[test]
    fn custom_event_has_no_dashboard_counterpart() {
        let state = MaterializedState::default();
        assert!(translate(&Event::Custom, &state).is_none());
    }
}
