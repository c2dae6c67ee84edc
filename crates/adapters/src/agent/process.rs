// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct child-process implementation of [`AgentAdapter`] (§4.3): each
//! turn spawns a fresh invocation of the configured agent command with
//! piped stdio, owned by `tokio::process::Command` — no terminal
//! multiplexer and no on-disk session log sit between us and the agent.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use devswarm_core::{AgentInstanceId, Clock, Event, IdGen, OutputKind, SystemClock, UserQuestionId, UuidIdGen};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

use super::classify::classify_agent_error;
use super::parser::{scan_markers, JsonFrameExtractor};
use super::{AgentAdapter, AgentAdapterError, AgentSpawnConfig};

struct AgentEntry {
    config: AgentSpawnConfig,
    resume_handle: Option<String>,
    interrupt_tx: Option<oneshot::Sender<()>>,
}

/// Supervises every agent instance's child-process invocations, keyed by
/// [`AgentInstanceId`]. Cloning shares the underlying registry (`Arc`), the
/// same pattern the teacher's session-backed adapter used for its agent map.
#[derive(Clone)]
pub struct ChildProcessAgentAdapter<C: Clock = SystemClock> {
    agents: Arc<Mutex<HashMap<AgentInstanceId, AgentEntry>>>,
    clock: C,
}

impl ChildProcessAgentAdapter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ChildProcessAgentAdapter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ChildProcessAgentAdapter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            agents: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

#[async_trait]
impl<C: Clock> AgentAdapter for ChildProcessAgentAdapter<C> {
    async fn start(&self, config: AgentSpawnConfig) -> Result<(), AgentAdapterError> {
        let mut agents = self.agents.lock();
        let resume_handle = config.resume_handle.clone();
        agents.insert(
            config.id.clone(),
            AgentEntry {
                config,
                resume_handle,
                interrupt_tx: None,
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
        let (config, resume_handle, irx) = {
            let mut agents = self.agents.lock();
            let entry = agents
                .get_mut(id)
                .ok_or_else(|| AgentAdapterError::NotFound(id.clone()))?;
            if entry.interrupt_tx.is_some() {
                return Err(AgentAdapterError::Busy(id.clone()));
            }
            let (tx, rx) = oneshot::channel();
            entry.interrupt_tx = Some(tx);
            (entry.config.clone(), entry.resume_handle.clone(), rx)
        };

        let outcome = run_one_invocation(&config, resume_handle.as_deref(), text, id, &events, &self.clock, irx)
            .await
            .map_err(AgentAdapterError::SpawnFailed)?;

        let mut agents = self.agents.lock();
        if let Some(entry) = agents.get_mut(id) {
            entry.interrupt_tx = None;
            if outcome.resume_handle.is_some() {
                entry.resume_handle = outcome.resume_handle;
            }
        }
        Ok(())
    }

    async fn interrupt(&self, id: &AgentInstanceId) -> Result<Option<String>, AgentAdapterError> {
        let mut agents = self.agents.lock();
        let entry = agents
            .get_mut(id)
            .ok_or_else(|| AgentAdapterError::NotFound(id.clone()))?;
        if let Some(tx) = entry.interrupt_tx.take() {
            let _ = tx.send(());
        }
        Ok(entry.resume_handle.clone())
    }

    async fn stop(&self, id: &AgentInstanceId) -> Result<(), AgentAdapterError> {
        let mut agents = self.agents.lock();
        if let Some(mut entry) = agents.remove(id) {
            if let Some(tx) = entry.interrupt_tx.take() {
                let _ = tx.send(());
            }
        }
        Ok(())
    }
}

struct InvocationOutcome {
    resume_handle: Option<String>,
}

/// Spawn one invocation, write `text` to stdin, stream parsed events out,
/// and wait for the child to exit (or be interrupted via `irx`).
async fn run_one_invocation<C: Clock>(
    config: &AgentSpawnConfig,
    resume_handle: Option<&str>,
    text: &str,
    id: &AgentInstanceId,
    events: &mpsc::Sender<Event>,
    clock: &C,
    irx: oneshot::Receiver<()>,
) -> Result<InvocationOutcome, String> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.base_args);
    if let Some(handle) = resume_handle {
        cmd.arg(&config.resume_flag).arg(handle);
    }
    cmd.current_dir(&config.cwd);
    for (key, value) in &config.env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {e}", config.command))?;

    let mut stdin = child.stdin.take().ok_or("child has no stdin")?;
    stdin
        .write_all(text.as_bytes())
        .await
        .map_err(|e| format!("failed to write prompt to agent stdin: {e}"))?;
    stdin
        .shutdown()
        .await
        .map_err(|e| format!("failed to close agent stdin: {e}"))?;
    drop(stdin);

    let stdout = child.stdout.take().ok_or("child has no stdout")?;
    let stderr = child.stderr.take().ok_or("child has no stderr")?;

    let agent_id = id.clone();
    let events_tx = events.clone();
    let clock_epoch = clock.epoch_ms();
    let stdout_task = tokio::spawn(async move { pump_stdout(stdout, agent_id, events_tx, clock_epoch).await });
    let stderr_task = tokio::spawn(async move { drain_stderr(stderr).await });

    let mut irx = irx;
    let exit = tokio::select! {
        status = child.wait() => Interruption::Exited(status.map_err(|e| format!("waiting on agent process: {e}"))?),
        _ = &mut irx => {
            let _ = child.start_kill();
            let status = child.wait().await;
            Interruption::Killed(status.ok())
        }
    };

    let stdout_outcome = stdout_task
        .await
        .map_err(|e| format!("stdout reader task panicked: {e}"))?;
    let stderr_tail = stderr_task
        .await
        .map_err(|e| format!("stderr reader task panicked: {e}"))?;

    match exit {
        Interruption::Killed(_) => {
            // Caller requested the interrupt; it owns the resume-handle bookkeeping.
        }
        Interruption::Exited(status) => {
            if status.success() {
                let _ = events.send(Event::AgentIdle { id: id.clone() }).await;
            } else {
                let error = classify_agent_error(&stderr_tail);
                let _ = events
                    .send(Event::AgentError {
                        id: id.clone(),
                        error,
                    })
                    .await;
            }
        }
    }

    Ok(InvocationOutcome {
        resume_handle: stdout_outcome.resume_handle,
    })
}

enum Interruption {
    Exited(std::process::ExitStatus),
    Killed(Option<std::process::ExitStatus>),
}

struct StdoutOutcome {
    resume_handle: Option<String>,
}

/// Read the child's stdout to completion, extracting framed JSON messages
/// and turning them into domain events as they arrive (§4.3 streaming
/// parser; Testable Property #5).
async fn pump_stdout(
    mut stdout: ChildStdout,
    id: AgentInstanceId,
    events: mpsc::Sender<Event>,
    at_ms: u64,
) -> StdoutOutcome {
    let mut extractor = JsonFrameExtractor::new();
    let mut resume_handle = None;
    let mut last_message_id: Option<String> = None;
    let mut message_counter: u64 = 0;
    let mut buf = [0u8; 8192];

    loop {
        let n = match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(error) => {
                tracing::warn!(%error, "error reading agent stdout");
                break;
            }
        };
        extractor.push(&buf[..n]);
        for value in extractor.extract() {
            dispatch_message(
                &value,
                &id,
                &events,
                at_ms,
                &mut resume_handle,
                &mut last_message_id,
                &mut message_counter,
            )
            .await;
        }
    }

    StdoutOutcome { resume_handle }
}

async fn dispatch_message(
    value: &serde_json::Value,
    id: &AgentInstanceId,
    events: &mpsc::Sender<Event>,
    at_ms: u64,
    resume_handle: &mut Option<String>,
    last_message_id: &mut Option<String>,
    message_counter: &mut u64,
) {
    if let Some(session_id) = value.get("session_id").and_then(|v| v.as_str()) {
        *resume_handle = Some(session_id.to_string());
    }

    let message_type = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
    match message_type {
        "assistant" | "user" => {
            let text = extract_text(value);
            if text.is_empty() {
                return;
            }
            let message_id = value
                .get("message")
                .and_then(|m| m.get("id"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    *message_counter += 1;
                    format!("msg-{message_counter}")
                });
            let kind = if last_message_id.as_deref() == Some(message_id.as_str()) {
                OutputKind::Continue
            } else {
                OutputKind::New
            };
            *last_message_id = Some(message_id.clone());

            let markers = scan_markers(&text);
            if let Some(resume_id) = markers.resume_id.clone() {
                if resume_handle.is_none() {
                    *resume_handle = Some(resume_id);
                }
            }

            let _ = events
                .send(Event::AgentOutput {
                    id: id.clone(),
                    text: text.clone(),
                    message_id,
                    kind,
                    at_ms,
                })
                .await;

            if let Some(question) = markers.question {
                let _ = events
                    .send(Event::AgentQuestion {
                        question_id: UserQuestionId::new(UuidIdGen.next()),
                        agent_id: id.clone(),
                        text: question,
                    })
                    .await;
            }
            if markers.task_complete {
                let _ = events
                    .send(Event::AgentTaskComplete { id: id.clone() })
                    .await;
            }
        }
        "result" => {
            let _ = events
                .send(Event::AgentMessageComplete { id: id.clone() })
                .await;
        }
        _ => {}
    }
}

/// Best-effort extraction of concatenated text blocks from a stream-json
/// `assistant`/`user` message, tolerant of shape drift in other runtimes.
fn extract_text(value: &serde_json::Value) -> String {
    let Some(content) = value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_array())
    else {
        return String::new();
    };
    content
        .iter()
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("")
}

async fn drain_stderr(mut stderr: ChildStderr) -> String {
    let mut buf = Vec::new();
    let _ = stderr.read_to_end(&mut buf).await;
    let text = String::from_utf8_lossy(&buf).into_owned();
    crate::subprocess::truncate_tail(&text, 2048)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_core::{AgentRole, FakeClock};
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    fn config(id: &str, command: &str, args: &[&str]) -> AgentSpawnConfig {
        AgentSpawnConfig {
            id: AgentInstanceId::new(id),
            role: AgentRole::Worker,
            command: command.to_string(),
            base_args: args.iter().map(|s| s.to_string()).collect(),
            resume_flag: "--resume".to_string(),
            resume_handle: None,
            cwd: PathBuf::from("."),
            env: Vec::new(),
        }
    }

    #[tokio::test]
    async fn start_then_send_message_runs_child_and_emits_idle_on_success() {
        let adapter = ChildProcessAgentAdapter::with_clock(FakeClock::new());
        let id = AgentInstanceId::new("a1");
        adapter
            .start(config("a1", "cat", &[]))
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::channel(32);
        adapter
            .send_message(&id, r#"{"type":"result","session_id":"sess-1"}"#, tx)
            .await
            .unwrap();

        let mut saw_idle = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, Event::AgentIdle { .. }) {
                saw_idle = true;
            }
        }
        assert!(saw_idle);
    }

    #[tokio::test]
    async fn send_message_while_busy_is_rejected() {
        let adapter = ChildProcessAgentAdapter::with_clock(FakeClock::new());
        let id = AgentInstanceId::new("a1");
        adapter.start(config("a1", "sleep", &["1"])).await.unwrap();

        let (tx, _rx) = mpsc::channel(32);
        let adapter2 = adapter.clone();
        let id2 = id.clone();
        let first = tokio::spawn(async move { adapter2.send_message(&id2, "", tx).await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let (tx2, _rx2) = mpsc::channel(32);
        let result = adapter.send_message(&id, "", tx2).await;
        assert!(matches!(result, Err(AgentAdapterError::Busy(_))));

        let _ = first.await;
    }

    #[tokio::test]
    async fn unknown_instance_is_not_found() {
        let adapter = ChildProcessAgentAdapter::with_clock(FakeClock::new());
        let (tx, _rx) = mpsc::channel(8);
        let result = adapter
            .send_message(&AgentInstanceId::new("ghost"), "hi", tx)
            .await;
        assert!(matches!(result, Err(AgentAdapterError::NotFound(_))));
    }

    #[test]
    fn extract_text_joins_content_blocks() {
        let value: serde_json::Value = serde_json::json!({
            "message": {"content": [{"type": "text", "text": "hello "}, {"type": "text", "text": "world"}]}
        });
        assert_eq!(extract_text(&value), "hello world");
    }
}
