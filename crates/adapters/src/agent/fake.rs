// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`AgentAdapter`] double for engine/daemon tests, gated behind
//! the `test-support` feature.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use devswarm_core::{AgentInstanceId, Event};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{AgentAdapter, AgentAdapterError, AgentSpawnConfig};

#[derive(Debug, Clone, Default)]
struct FakeEntry {
    resume_handle: Option<String>,
    busy: bool,
    sent: Vec<String>,
}

/// Records every invocation instead of spawning a process. Tests drive the
/// resulting event stream by calling [`FakeAgentAdapter::queue_reply`]
/// before invoking [`AgentAdapter::send_message`].
#[derive(Clone, Default)]
pub struct FakeAgentAdapter {
    entries: Arc<Mutex<HashMap<AgentInstanceId, FakeEntry>>>,
    replies: Arc<Mutex<HashMap<AgentInstanceId, Vec<Event>>>>,
}

impl FakeAgentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the events `send_message` should emit the next time it is
    /// called for `id`, in order.
    pub fn queue_reply(&self, id: &AgentInstanceId, events: Vec<Event>) {
        self.replies.lock().entry(id.clone()).or_default().extend(events);
    }

    pub fn sent_messages(&self, id: &AgentInstanceId) -> Vec<String> {
        self.entries
            .lock()
            .get(id)
            .map(|e| e.sent.clone())
            .unwrap_or_default()
    }

    pub fn is_busy(&self, id: &AgentInstanceId) -> bool {
        self.entries.lock().get(id).map(|e| e.busy).unwrap_or(false)
    }
}

#[async_trait]
impl AgentAdapter for FakeAgentAdapter {
    async fn start(&self, config: AgentSpawnConfig) -> Result<(), AgentAdapterError> {
        self.entries.lock().insert(
            config.id.clone(),
            FakeEntry {
                resume_handle: config.resume_handle,
                busy: false,
                sent: Vec::new(),
            },
        );
        Ok(())
    }

    async fn send_message(
        &self,
        id: &AgentInstanceId,
        text: &str,
        events: mpsc::Sender<Event>,
    ) -> Result<(), AgentAdapterError> {
        {
            let mut entries = self.entries.lock();
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| AgentAdapterError::NotFound(id.clone()))?;
            if entry.busy {
                return Err(AgentAdapterError::Busy(id.clone()));
            }
            entry.busy = true;
            entry.sent.push(text.to_string());
        }

        let queued = self.replies.lock().remove(id).unwrap_or_default();
        for event in queued {
            if let Event::AgentInstanceStatusChanged {
                resume_handle: Some(handle),
                ..
            } = &event
            {
                if let Some(entry) = self.entries.lock().get_mut(id) {
                    entry.resume_handle = Some(handle.clone());
                }
            }
            let _ = events.send(event).await;
        }

        if let Some(entry) = self.entries.lock().get_mut(id) {
            entry.busy = false;
        }
        Ok(())
    }

    async fn interrupt(&self, id: &AgentInstanceId) -> Result<Option<String>, AgentAdapterError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| AgentAdapterError::NotFound(id.clone()))?;
        entry.busy = false;
        Ok(entry.resume_handle.clone())
    }

    async fn stop(&self, id: &AgentInstanceId) -> Result<(), AgentAdapterError> {
        self.entries.lock().remove(id);
        self.replies.lock().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_core::AgentRole;
    use std::path::PathBuf;

    fn config(id: &str) -> AgentSpawnConfig {
        AgentSpawnConfig {
            id: AgentInstanceId::new(id),
            role: AgentRole::Worker,
            command: "unused".to_string(),
            base_args: Vec::new(),
            resume_flag: "--resume".to_string(),
            resume_handle: None,
            cwd: PathBuf::from("."),
            env: Vec::new(),
        }
    }

    #[tokio::test]
    async fn queued_events_are_emitted_in_order() {
        let adapter = FakeAgentAdapter::new();
        let id = AgentInstanceId::new("a1");
        adapter.start(config("a1")).await.unwrap();
        adapter.queue_reply(
            &id,
            vec![Event::AgentIdle { id: id.clone() }],
        );

        let (tx, mut rx) = mpsc::channel(8);
        adapter.send_message(&id, "hello", tx).await.unwrap();
        assert!(matches!(rx.try_recv().unwrap(), Event::AgentIdle { .. }));
        assert_eq!(adapter.sent_messages(&id), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn unknown_id_errors() {
        let adapter = FakeAgentAdapter::new();
        let (tx, _rx) = mpsc::channel(8);
        let result = adapter
            .send_message(&AgentInstanceId::new("ghost"), "hi", tx)
            .await;
        assert!(matches!(result, Err(AgentAdapterError::NotFound(_))));
    }
}
