// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Orchestrator: a cooperative, fixed-period tick (§4.4) that drives
//! roadmap items and specs through their lifecycle. Each tick runs its seven
//! steps in order and never holds a blocking call; any failure inside a step
//! is logged and the loop continues at the next tick (§4.4 failure policy).

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use devswarm_adapters::{branch_name_for, AgentAdapter, AgentSpawnConfig, CodeHostAdapter, WorktreeManager};
use devswarm_core::{
    AgentInstance, AgentInstanceId, AgentInstanceStatus, AgentRole, Clock, EntityKind, EntityRef,
    Event, IdGen, ResolutionMethod, RoadmapItemStatus, Spec, SpecStatus, MAIN_AGENT_ID,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Notify};

use crate::commands::StateStore;
use crate::dependency_sync::parse_references;
use crate::store::SharedStore;
use crate::{resolution, validation, EngineError};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub tick_interval: Duration,
    pub github_sync_interval: Duration,
    pub agent_idle_threshold_ms: u64,
    pub agent_runtime_bound_ms: u64,
    pub max_spec_start_failures: u8,
    pub agent_command: String,
    pub agent_base_args: Vec<String>,
    pub agent_resume_flag: String,
    pub validation: validation::ValidationConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            github_sync_interval: Duration::from_secs(60),
            agent_idle_threshold_ms: 60_000,
            agent_runtime_bound_ms: 3_600_000,
            max_spec_start_failures: 3,
            agent_command: "claude".to_string(),
            agent_base_args: vec!["--print".to_string(), "--output-format".to_string(), "stream-json".to_string()],
            agent_resume_flag: "--resume".to_string(),
            validation: validation::ValidationConfig::default(),
        }
    }
}

pub struct Orchestrator<A, W, H, I, C>
where
    A: AgentAdapter,
    W: WorktreeManager,
    H: CodeHostAdapter,
    I: IdGen,
    C: Clock,
{
    store: SharedStore,
    commands: StateStore<I, C>,
    agent: A,
    worktree: W,
    codehost: H,
    clock: C,
    config: OrchestratorConfig,
    shutdown: Arc<Notify>,
    tick_pulse: watch::Sender<u64>,
    last_sync_at_ms: Mutex<u64>,
    notified_pending: Mutex<HashSet<String>>,
    spec_start_failures: Mutex<HashMap<String, u8>>,
    already_pushed: Mutex<HashSet<String>>,
}

impl<A, W, H, I, C> Orchestrator<A, W, H, I, C>
where
    A: AgentAdapter,
    W: WorktreeManager,
    H: CodeHostAdapter,
    I: IdGen,
    C: Clock,
{
    pub fn new(
        store: SharedStore,
        agent: A,
        worktree: W,
        codehost: H,
        ids: I,
        clock: C,
        config: OrchestratorConfig,
    ) -> Self {
        let (tick_pulse, _rx) = watch::channel(0);
        Self {
            commands: StateStore::new(store.clone(), ids, clock.clone()),
            store,
            agent,
            worktree,
            codehost,
            clock,
            config,
            shutdown: Arc::new(Notify::new()),
            tick_pulse,
            last_sync_at_ms: Mutex::new(0),
            notified_pending: Mutex::new(HashSet::new()),
            spec_start_failures: Mutex::new(HashMap::new()),
            already_pushed: Mutex::new(HashSet::new()),
        }
    }

    /// Signal for an external caller (the daemon's shutdown handler) to
    /// stop the loop and begin graceful agent shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn subscribe_ticks(&self) -> watch::Receiver<u64> {
        self.tick_pulse.subscribe()
    }

    /// Drives the tick loop until cancelled. Intended to be spawned as the
    /// daemon's long-lived control task.
    pub async fn run(self: Arc<Self>) {
        self.resume_on_start().await;
        let mut interval = tokio::time::interval(self.config.tick_interval);
        let mut tick_count = 0u64;
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                _ = interval.tick() => {
                    tick_count += 1;
                    if let Err(error) = self.tick().await {
                        tracing::warn!(%error, "control loop tick failed");
                    }
                    let _ = self.tick_pulse.send(tick_count);
                }
            }
        }
        self.graceful_shutdown().await;
    }

    async fn tick(&self) -> Result<(), EngineError> {
        self.sync_issues().await;
        self.notify_pending_specs();
        self.start_approved_specs().await;
        self.check_completions().await;
        self.progress_roadmap().await;
        self.close_resolved_issues().await;
        Ok(())
    }

    // --- Step 1: periodic external sync ---
    async fn sync_issues(&self) {
        let now = self.clock.epoch_ms();
        {
            let mut last = self.last_sync_at_ms.lock();
            if now.saturating_sub(*last) < self.config.github_sync_interval.as_millis() as u64 {
                return;
            }
            *last = now;
        }

        let issues = match self.codehost.list_open_issues().await {
            Ok(issues) => issues,
            Err(error) => {
                tracing::warn!(%error, "issue sync failed");
                return;
            }
        };

        for issue in &issues {
            let already_mapped = self
                .store
                .read()
                .roadmap_item_by_issue
                .contains_key(&issue.number);
            if !already_mapped {
                if let Err(error) = self.commands.create_roadmap_item(
                    issue.title.clone(),
                    issue.body.clone(),
                    Some((issue.number, issue.html_url.clone())),
                    ResolutionMethod::MergeAndPush,
                ) {
                    tracing::warn!(%error, issue = issue.number, "failed to create roadmap item from issue");
                    continue;
                }
            }
        }

        for issue in &issues {
            let Some(this_id) = self.store.read().roadmap_item_by_issue.get(&issue.number).cloned() else {
                continue;
            };
            let blocked = EntityRef::roadmap_item(this_id);
            for reference in parse_references(&issue.body) {
                let Some(target_id) = self
                    .store
                    .read()
                    .roadmap_item_by_issue
                    .get(&reference.issue_number)
                    .cloned()
                else {
                    continue;
                };
                let blocker = EntityRef::roadmap_item(target_id);
                let result = if reference.resolved {
                    self.commands.resolve_dependencies_matching(&blocker, &blocked)
                } else if !self.commands.dependency_exists(&blocker, &blocked) {
                    self.commands.add_dependency(blocker, blocked.clone()).map(|_| ())
                } else {
                    Ok(())
                };
                if let Err(error) = result {
                    tracing::warn!(%error, issue = issue.number, "dependency sync failed for one reference");
                }
            }
        }
    }

    // --- Step 2: pending spec notification ---
    fn notify_pending_specs(&self) {
        let pending: Vec<(String, String, String)> = self
            .store
            .read()
            .roadmap_items
            .values()
            .filter(|item| {
                item.status == RoadmapItemStatus::Pending
                    && item.spec_id.is_none()
                    && !self.commands.has_unresolved_dependencies(EntityKind::RoadmapItem, item.id.as_str())
            })
            .map(|item| (item.id.as_str().to_string(), item.title.clone(), item.description.clone()))
            .collect();

        let mut notified = self.notified_pending.lock();
        notified.retain(|id| {
            self.store
                .read()
                .get_roadmap_item(id)
                .map(|item| item.status != RoadmapItemStatus::Done)
                .unwrap_or(false)
        });

        for (id, title, description) in pending {
            if notified.insert(id.clone()) {
                self.dispatch_agent_message(
                    AgentInstanceId::new(MAIN_AGENT_ID),
                    format!("New roadmap item {id} needs a spec: {title}\n\n{description}"),
                );
            }
        }
    }

    // --- Step 3: start approved specs ---
    async fn start_approved_specs(&self) {
        let specs: Vec<Spec> = self
            .store
            .read()
            .specs
            .values()
            .filter(|s| s.status == SpecStatus::Approved)
            .cloned()
            .collect();

        for spec in specs {
            if self
                .commands
                .has_unresolved_dependencies(EntityKind::RoadmapItem, spec.roadmap_item_id.as_str())
            {
                continue;
            }
            match self.try_start_spec(&spec).await {
                Ok(()) => {
                    self.spec_start_failures.lock().remove(spec.id.as_str());
                }
                Err(error) => {
                    tracing::warn!(%error, spec = %spec.id, "failed to start spec");
                    let mut failures = self.spec_start_failures.lock();
                    let count = failures.entry(spec.id.as_str().to_string()).or_insert(0);
                    *count += 1;
                    if *count >= self.config.max_spec_start_failures {
                        drop(failures);
                        let _ = self.commands.update_spec_status(
                            &spec.id,
                            SpecStatus::Error,
                            Some(format!("gave up after {} start failures: {error}", self.config.max_spec_start_failures)),
                        );
                    }
                }
            }
        }
    }

    async fn try_start_spec(&self, spec: &Spec) -> Result<(), EngineError> {
        let worktree_name = format!("spec-{}", spec.id.as_str());
        let path = self.worktree.create_worktree(&worktree_name, "main").await?;
        let branch_name = branch_name_for(&worktree_name);
        self.commands
            .assign_spec_workspace(&spec.id, worktree_name.clone(), branch_name)
            .map_err(EngineError::from)?;

        let agent_id = AgentInstanceId::new(format!("coordinator-{}", spec.id.as_str()));
        self.store.append(Event::AgentInstanceCreated {
            id: agent_id.clone(),
            role: AgentRole::Coordinator,
            context: Some(EntityRef::spec(spec.id.as_str())),
            worktree_name: Some(worktree_name.clone()),
            started_at_ms: self.clock.epoch_ms(),
        })?;
        self.agent
            .start(AgentSpawnConfig {
                id: agent_id.clone(),
                role: AgentRole::Coordinator,
                command: self.config.agent_command.clone(),
                base_args: self.config.agent_base_args.clone(),
                resume_flag: self.config.agent_resume_flag.clone(),
                resume_handle: None,
                cwd: path,
                env: Vec::new(),
            })
            .await?;

        self.commands
            .update_spec_status(&spec.id, SpecStatus::InProgress, None)
            .map_err(EngineError::from)?;
        self.dispatch_agent_message(agent_id, format!("Implement spec {}:\n\n{}", spec.id.as_str(), spec.content));
        Ok(())
    }

    // --- Step 4: completion check, validation, resolution ---
    async fn check_completions(&self) {
        let specs: Vec<Spec> = self
            .store
            .read()
            .specs
            .values()
            .filter(|s| s.status == SpecStatus::InProgress)
            .cloned()
            .collect();

        for spec in specs {
            if self.is_complete(&spec).await {
                self.validate_and_resolve(spec).await;
            }
        }
    }

    async fn is_complete(&self, spec: &Spec) -> bool {
        let groups = self.store.read().task_groups_for_spec(spec.id.as_str()).len();
        if groups > 0 {
            let all_done = self
                .store
                .read()
                .task_groups_for_spec(spec.id.as_str())
                .iter()
                .all(|g| g.status == devswarm_core::TaskGroupStatus::Done);
            if all_done {
                return true;
            }
        }

        let Some(worktree_name) = spec.worktree_name.clone() else {
            return false;
        };
        let has_commits = self.worktree.has_unpushed_commits(&worktree_name).await.unwrap_or(false);
        if !has_commits {
            return false;
        }
        let coordinator_idle = self
            .store
            .read()
            .agent_instances
            .values()
            .find(|a| a.context.as_ref() == Some(&EntityRef::spec(spec.id.as_str())) && a.role == AgentRole::Coordinator)
            .map(|a| a.idle_for_at_least(self.clock.epoch_ms(), self.config.agent_idle_threshold_ms))
            .unwrap_or(false);
        coordinator_idle
    }

    async fn validate_and_resolve(&self, spec: Spec) {
        let Some(worktree_name) = spec.worktree_name.clone() else {
            return;
        };
        if self
            .commands
            .update_spec_status(&spec.id, SpecStatus::Validating, None)
            .is_err()
        {
            return;
        }

        let worktree_path = match self.worktree.create_worktree(&worktree_name, "main").await {
            Ok(path) => path,
            Err(error) => {
                let _ = self.commands.update_spec_status(&spec.id, SpecStatus::Error, Some(error.to_string()));
                return;
            }
        };

        if let Err(failure) = validation::run_validation(&worktree_path, &self.config.validation).await {
            let message = format!("Pre-resolution validation failed: {} failed:\n{}", failure.command, failure.tail);
            let _ = self.commands.update_spec_status(&spec.id, SpecStatus::Error, Some(message.clone()));
            self.dispatch_agent_message(AgentInstanceId::new(MAIN_AGENT_ID), format!("Spec {} validation failed: {message}", spec.id.as_str()));
            return;
        }

        if self
            .commands
            .update_spec_status(&spec.id, SpecStatus::Merging, None)
            .is_err()
        {
            return;
        }

        let roadmap_item = self.store.read().get_roadmap_item(spec.roadmap_item_id.as_str()).cloned();
        let Some(roadmap_item) = roadmap_item else {
            let _ = self.commands.update_spec_status(&spec.id, SpecStatus::Error, Some("roadmap item disappeared".to_string()));
            return;
        };

        match resolution::resolve(
            &self.worktree,
            &worktree_name,
            roadmap_item.resolution_method,
            &roadmap_item.title,
            &roadmap_item.description,
            spec.id.as_str(),
        )
        .await
        {
            Ok(resolution::ResolutionOutcome::Done { pr_url }) => {
                let _ = self.commands.update_spec_status(&spec.id, SpecStatus::Done, None);
                if let Some(url) = pr_url {
                    self.dispatch_agent_message(AgentInstanceId::new(MAIN_AGENT_ID), format!("Spec {} resolved: {url}", spec.id.as_str()));
                }
            }
            Ok(resolution::ResolutionOutcome::Conflict { conflicts }) => {
                self.dispatch_agent_message(
                    AgentInstanceId::new(MAIN_AGENT_ID),
                    format!("Spec {} merge conflicts, needs human resolution: {}", spec.id.as_str(), conflicts.join(", ")),
                );
            }
            Ok(resolution::ResolutionOutcome::Manual) => {
                self.dispatch_agent_message(
                    AgentInstanceId::new(MAIN_AGENT_ID),
                    format!("Spec {} ready for manual finalization in worktree {worktree_name}", spec.id.as_str()),
                );
            }
            Err(error) => {
                let _ = self.commands.update_spec_status(&spec.id, SpecStatus::Error, Some(error.to_string()));
            }
        }
    }

    // --- Step 5: roadmap progression ---
    async fn progress_roadmap(&self) {
        let done_specs: Vec<Spec> = self
            .store
            .read()
            .specs
            .values()
            .filter(|s| s.status == SpecStatus::Done)
            .cloned()
            .collect();

        for spec in done_specs {
            if !self.already_pushed.lock().contains(spec.id.as_str()) {
                let pushed = match self.worktree.has_unpushed_commits("main").await {
                    Ok(true) => self.worktree.push("main").await.is_ok(),
                    Ok(false) => true,
                    Err(_) => false,
                };
                if pushed {
                    self.already_pushed.lock().insert(spec.id.as_str().to_string());
                }
            }

            let roadmap_item = self.store.read().get_roadmap_item(spec.roadmap_item_id.as_str()).cloned();
            if let Some(item) = roadmap_item {
                if item.status != RoadmapItemStatus::Done {
                    let _ = self.commands.update_roadmap_item(
                        &item.id,
                        None,
                        None,
                        Some(RoadmapItemStatus::Done),
                        None,
                    );
                }
            }
        }
    }

    // --- Step 6: issue closure ---
    async fn close_resolved_issues(&self) {
        let closeable: Vec<(String, u64)> = self
            .store
            .read()
            .roadmap_items
            .values()
            .filter(|item| item.status == RoadmapItemStatus::Done && !item.github_issue_closed)
            .filter_map(|item| item.issue.issue_id.map(|n| (item.id.as_str().to_string(), n)))
            .collect();

        for (id, issue_number) in closeable {
            match self.codehost.close_issue(issue_number).await {
                Ok(()) => {
                    let _ = self.commands.mark_issue_closed(&devswarm_core::RoadmapItemId::new(id));
                }
                Err(error) => {
                    tracing::warn!(%error, issue = issue_number, "failed to close upstream issue");
                }
            }
        }
    }

    /// Fire-and-forget: runs one agent invocation in the background and
    /// folds its emitted events into the store as they arrive, without
    /// holding up the tick (§5 "no blocking call is held across the tick").
    ///
    /// Public so the HTTP layer can inject a message to a running agent
    /// (`POST /api/main/message`, question answers) outside the tick.
    pub fn dispatch_agent_message(&self, id: AgentInstanceId, text: String)
    where
        A: 'static,
    {
        let agent = self.agent.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let (tx, mut rx) = mpsc::channel(64);
            let forward = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    if let Err(error) = store.append(event) {
                        tracing::warn!(%error, "failed to append agent event");
                    }
                }
            });
            if let Err(error) = agent.send_message(&id, &text, tx).await {
                tracing::warn!(%error, agent_id = %id, "agent invocation failed");
            }
            let _ = forward.await;
        });
    }

    async fn resume_on_start(&self) {
        let paused: Vec<AgentInstance> = self
            .store
            .read()
            .agent_instances
            .values()
            .filter(|a| a.status == AgentInstanceStatus::Paused)
            .cloned()
            .collect();

        for agent in paused {
            match (&agent.resume_handle, &agent.worktree_name) {
                (Some(handle), Some(worktree_name)) => {
                    let cwd = match self.worktree.create_worktree(worktree_name, "main").await {
                        Ok(path) => path,
                        Err(error) => {
                            tracing::warn!(%error, agent_id = %agent.id, "could not resolve worktree for resume");
                            PathBuf::new()
                        }
                    };
                    let started = self
                        .agent
                        .start(AgentSpawnConfig {
                            id: agent.id.clone(),
                            role: agent.role,
                            command: self.config.agent_command.clone(),
                            base_args: self.config.agent_base_args.clone(),
                            resume_flag: self.config.agent_resume_flag.clone(),
                            resume_handle: Some(handle.clone()),
                            cwd,
                            env: Vec::new(),
                        })
                        .await;
                    if started.is_ok() {
                        let _ = self.store.append(Event::AgentInstanceStatusChanged {
                            id: agent.id.clone(),
                            status: AgentInstanceStatus::Running,
                            resume_handle: Some(handle.clone()),
                        });
                        continue;
                    }
                }
                _ => {}
            }
            let _ = self.store.append(Event::AgentInstanceStatusChanged {
                id: agent.id.clone(),
                status: AgentInstanceStatus::Stopped,
                resume_handle: None,
            });
        }
    }

    async fn graceful_shutdown(&self) {
        let live: Vec<AgentInstance> = self
            .store
            .read()
            .agent_instances
            .values()
            .filter(|a| !a.status.is_terminal())
            .cloned()
            .collect();

        for agent in live {
            let resume_handle = match self.agent.interrupt(&agent.id).await {
                Ok(handle) => handle,
                Err(error) => {
                    tracing::warn!(%error, agent_id = %agent.id, "interrupt failed during shutdown");
                    None
                }
            };
            let _ = self.agent.stop(&agent.id).await;
            let _ = self.store.append(Event::AgentInstanceStatusChanged {
                id: agent.id.clone(),
                status: AgentInstanceStatus::Paused,
                resume_handle,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_adapters::{FakeAgentAdapter, FakeCodeHostAdapter, FakeWorktreeManager};
    use devswarm_core::{FakeClock, SequentialIdGen};
    use tempfile::tempdir;

    fn orchestrator() -> Orchestrator<FakeAgentAdapter, FakeWorktreeManager, FakeCodeHostAdapter, SequentialIdGen, FakeClock> {
        let dir = tempdir().unwrap();
        let store = Arc::new(crate::store::Store::open(&dir.path().join("wal.jsonl"), &dir.path().join("snap.json")).unwrap());
        Orchestrator::new(
            store,
            FakeAgentAdapter::default(),
            FakeWorktreeManager::new(dir.path().join("worktrees")),
            FakeCodeHostAdapter::new(),
            SequentialIdGen::new("id"),
            FakeClock::new(),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn sync_creates_roadmap_item_and_dependency_from_issue_body() {
        let orchestrator = orchestrator();
        orchestrator.codehost.seed_issue(devswarm_adapters::UpstreamIssue {
            number: 10,
            title: "Fix A".to_string(),
            body: "blocked by #11".to_string(),
            html_url: "https://example.invalid/10".to_string(),
        });
        orchestrator.codehost.seed_issue(devswarm_adapters::UpstreamIssue {
            number: 11,
            title: "Fix B".to_string(),
            body: String::new(),
            html_url: "https://example.invalid/11".to_string(),
        });

        orchestrator.sync_issues().await;

        assert!(orchestrator.store.read().get_roadmap_item("ri-10").is_some());
        assert!(orchestrator.store.read().get_roadmap_item("ri-11").is_some());
        assert!(orchestrator.commands.has_unresolved_dependencies(EntityKind::RoadmapItem, "ri-10"));
    }

    #[tokio::test]
    async fn second_sync_within_interval_is_a_no_op() {
        let orchestrator = orchestrator();
        orchestrator.codehost.seed_issue(devswarm_adapters::UpstreamIssue {
            number: 1,
            title: "A".to_string(),
            body: String::new(),
            html_url: "https://example.invalid/1".to_string(),
        });
        orchestrator.sync_issues().await;
        orchestrator.codehost.seed_issue(devswarm_adapters::UpstreamIssue {
            number: 2,
            title: "B".to_string(),
            body: String::new(),
            html_url: "https://example.invalid/2".to_string(),
        });
        orchestrator.sync_issues().await;
        assert!(orchestrator.store.read().get_roadmap_item("ri-2").is_none());
    }

    #[tokio::test]
    async fn pending_roadmap_item_with_no_spec_is_notified_once() {
        let orchestrator = orchestrator();
        orchestrator
            .commands
            .create_roadmap_item("Fix A", "desc", None, ResolutionMethod::MergeAndPush)
            .unwrap();
        orchestrator.notify_pending_specs();
        orchestrator.notify_pending_specs();
        assert_eq!(orchestrator.notified_pending.lock().len(), 1);
    }

    #[tokio::test]
    async fn approved_spec_with_unresolved_dependency_is_not_started() {
        let orchestrator = orchestrator();
        let ri_a = orchestrator
            .commands
            .create_roadmap_item("A", "d", None, ResolutionMethod::MergeAndPush)
            .unwrap();
        let ri_b = orchestrator
            .commands
            .create_roadmap_item("B", "d", None, ResolutionMethod::MergeAndPush)
            .unwrap();
        orchestrator
            .commands
            .add_dependency(EntityRef::roadmap_item(ri_b.as_str()), EntityRef::roadmap_item(ri_a.as_str()))
            .unwrap();
        let spec_id = orchestrator.commands.create_spec(&ri_a, "plan").unwrap();
        orchestrator.store.append(Event::SpecStatusChanged { id: spec_id.clone(), status: SpecStatus::PendingReview, error_message: None }).unwrap();
        orchestrator.store.append(Event::SpecStatusChanged { id: spec_id.clone(), status: SpecStatus::Approved, error_message: None }).unwrap();

        orchestrator.start_approved_specs().await;

        assert_eq!(orchestrator.store.read().get_spec(spec_id.as_str()).unwrap().status, SpecStatus::Approved);
    }

    #[tokio::test]
    async fn validation_failure_error_message_has_required_prefix() {
        let dir = tempdir().unwrap();
        let store = Arc::new(crate::store::Store::open(&dir.path().join("wal.jsonl"), &dir.path().join("snap.json")).unwrap());
        let worktrees_dir = dir.path().join("worktrees");
        let config = OrchestratorConfig {
            validation: validation::ValidationConfig {
                commands: vec![validation::ValidationCommand {
                    name: "lint".to_string(),
                    program: "sh".to_string(),
                    args: vec!["-c".to_string(), "echo 'ERROR in foo.ts' 1>&2; exit 1".to_string()],
                }],
            },
            ..OrchestratorConfig::default()
        };
        let orchestrator = Orchestrator::new(
            store,
            FakeAgentAdapter::default(),
            FakeWorktreeManager::new(worktrees_dir.clone()),
            FakeCodeHostAdapter::new(),
            SequentialIdGen::new("id"),
            FakeClock::new(),
            config,
        );

        let ri = orchestrator
            .commands
            .create_roadmap_item("A", "d", None, ResolutionMethod::MergeAndPush)
            .unwrap();
        let spec_id = orchestrator.commands.create_spec(&ri, "plan").unwrap();
        orchestrator.commands.assign_spec_workspace(&spec_id, "spec-1", "devswarm/spec-1").unwrap();
        std::fs::create_dir_all(worktrees_dir.join("spec-1")).unwrap();

        let spec = orchestrator.store.read().get_spec(spec_id.as_str()).cloned().unwrap();
        orchestrator.validate_and_resolve(spec).await;

        let error_message = orchestrator.store.read().get_spec(spec_id.as_str()).unwrap().error_message.clone().unwrap();
        assert!(error_message.starts_with("Pre-resolution validation failed:"));
        assert!(error_message.contains("ERROR in foo.ts"));
    }
}
