// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed CRUD over the [`Store`], with the dependency-resolution and
//! identity side effects described for the State Store (§4.1). Every
//! mutation here is expressed as an `Event` and appended through
//! `Store::append`; nothing here writes to `MaterializedState` directly.

use devswarm_core::{
    slug, would_create_cycle, Clock, DependencyId, EntityKind, EntityRef, Event, IdGen,
    ResolutionMethod, RoadmapItemId, RoadmapItemStatus, SpecId, SpecStatus, TaskGroupId,
    TaskGroupStatus, TaskId, TaskStatus,
};

use crate::store::SharedStore;
use crate::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    Conflict(String),
    #[error("dependency would create a cycle or is self-referential")]
    DependencyCycle,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub struct StateStore<I: IdGen, C: Clock> {
    store: SharedStore,
    ids: I,
    clock: C,
}

impl<I: IdGen, C: Clock> StateStore<I, C> {
    pub fn new(store: SharedStore, ids: I, clock: C) -> Self {
        Self { store, ids, clock }
    }

    fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    pub fn create_roadmap_item(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        issue: Option<(u64, String)>,
        resolution_method: ResolutionMethod,
    ) -> Result<RoadmapItemId, CommandError> {
        let title = title.into();
        let (issue_id, issue_url) = match issue {
            Some((id, url)) => (Some(id), Some(url)),
            None => (None, None),
        };
        let id = match issue_id {
            Some(n) => RoadmapItemId::new(format!("ri-{n}")),
            None => RoadmapItemId::new(format!("ri-live-{}", short_random(&self.ids))),
        };
        if self.store.read().get_roadmap_item(id.as_str()).is_some() {
            return Err(CommandError::Conflict(id.as_str().to_string()));
        }
        self.store.append(Event::RoadmapItemCreated {
            id: id.clone(),
            title,
            description: description.into(),
            issue_id,
            issue_url,
            resolution_method,
        })?;
        Ok(id)
    }

    pub fn update_roadmap_item(
        &self,
        id: &RoadmapItemId,
        title: Option<String>,
        description: Option<String>,
        status: Option<RoadmapItemStatus>,
        resolution_method: Option<ResolutionMethod>,
    ) -> Result<(), CommandError> {
        self.require_roadmap_item(id)?;
        self.store.append(Event::RoadmapItemUpdated {
            id: id.clone(),
            title,
            description,
            status,
            resolution_method,
        })?;
        Ok(())
    }

    pub fn mark_issue_closed(&self, id: &RoadmapItemId) -> Result<(), CommandError> {
        self.require_roadmap_item(id)?;
        self.store
            .append(Event::RoadmapItemIssueClosed { id: id.clone() })?;
        Ok(())
    }

    /// Computes the semantic spec id (§3: `iss-<n>-<slug>` or
    /// `live-<slug>-<suffix>`) and rejects if the roadmap item is missing.
    pub fn create_spec(
        &self,
        roadmap_item_id: &RoadmapItemId,
        content: impl Into<String>,
    ) -> Result<SpecId, CommandError> {
        let item = self
            .store
            .read()
            .get_roadmap_item(roadmap_item_id.as_str())
            .cloned()
            .ok_or_else(|| CommandError::NotFound(roadmap_item_id.as_str().to_string()))?;

        let id = match item.issue.issue_id {
            Some(n) => SpecId::new(slug::issue_spec_id(n, &item.title)),
            None => SpecId::new(slug::live_spec_id(&item.title, &short_random(&self.ids))),
        };
        if self.store.read().get_spec(id.as_str()).is_some() {
            return Err(CommandError::Conflict(id.as_str().to_string()));
        }
        self.store.append(Event::SpecCreated {
            id: id.clone(),
            roadmap_item_id: roadmap_item_id.clone(),
            content: content.into(),
        })?;
        self.store.append(Event::RoadmapItemSpecLinked {
            id: roadmap_item_id.clone(),
            spec_id: id.clone(),
        })?;
        Ok(id)
    }

    pub fn update_spec_status(
        &self,
        id: &SpecId,
        status: SpecStatus,
        error_message: Option<String>,
    ) -> Result<(), CommandError> {
        let spec = self.require_spec(id)?;
        if !spec.status.can_transition_to(status) {
            return Err(CommandError::Conflict(format!(
                "illegal spec transition {} -> {status}",
                spec.status
            )));
        }
        self.store.append(Event::SpecStatusChanged {
            id: id.clone(),
            status,
            error_message,
        })?;
        Ok(())
    }

    pub fn assign_spec_workspace(
        &self,
        id: &SpecId,
        worktree_name: impl Into<String>,
        branch_name: impl Into<String>,
    ) -> Result<(), CommandError> {
        self.require_spec(id)?;
        self.store.append(Event::SpecWorkspaceAssigned {
            id: id.clone(),
            worktree_name: worktree_name.into(),
            branch_name: branch_name.into(),
        })?;
        Ok(())
    }

    pub fn create_task_group(
        &self,
        spec_id: &SpecId,
        name: impl Into<String>,
        description: impl Into<String>,
        sequence: u32,
    ) -> Result<TaskGroupId, CommandError> {
        self.require_spec(spec_id)?;
        let id = TaskGroupId::new(self.ids.next());
        self.store.append(Event::TaskGroupCreated {
            id: id.clone(),
            spec_id: spec_id.clone(),
            name: name.into(),
            description: description.into(),
            sequence,
        })?;
        Ok(id)
    }

    pub fn create_task(
        &self,
        group_id: &TaskGroupId,
        description: impl Into<String>,
        sequence: u32,
    ) -> Result<TaskId, CommandError> {
        let id = TaskId::new(self.ids.next());
        self.store.append(Event::TaskCreated {
            id: id.clone(),
            group_id: group_id.clone(),
            description: description.into(),
            sequence,
        })?;
        Ok(id)
    }

    pub fn update_task_group_status(&self, id: &TaskGroupId, status: TaskGroupStatus) -> Result<(), CommandError> {
        if self.store.read().task_groups.get(id.as_str()).is_none() {
            return Err(CommandError::NotFound(id.as_str().to_string()));
        }
        self.store
            .append(Event::TaskGroupStatusChanged { id: id.clone(), status })?;
        Ok(())
    }

    pub fn update_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        commit_hash: Option<String>,
    ) -> Result<(), CommandError> {
        if self.store.read().tasks.get(id.as_str()).is_none() {
            return Err(CommandError::NotFound(id.as_str().to_string()));
        }
        self.store
            .append(Event::TaskStatusChanged { id: id.clone(), status, commit_hash })?;
        Ok(())
    }

    /// Adds a blocking edge, rejecting self-references and anything that
    /// would close a cycle (§3 invariant on the dependency graph, §7
    /// "Dependency violation").
    pub fn add_dependency(
        &self,
        blocker: EntityRef,
        blocked: EntityRef,
    ) -> Result<DependencyId, CommandError> {
        let edges = self.store.read().all_edges();
        if would_create_cycle(&edges, &blocker, &blocked) {
            return Err(CommandError::DependencyCycle);
        }
        let id = DependencyId::new(self.ids.next());
        self.store.append(Event::DependencyCreated { id: id.clone(), blocker, blocked })?;
        Ok(id)
    }

    pub fn remove_dependency(&self, id: &DependencyId) -> Result<(), CommandError> {
        self.store.append(Event::DependencyDeleted { id: id.clone() })?;
        Ok(())
    }

    /// `true` if an (unresolved or resolved) edge already exists between
    /// `blocker` and `blocked`, used to keep issue-sync reconciliation
    /// idempotent across repeated ticks.
    pub fn dependency_exists(&self, blocker: &EntityRef, blocked: &EntityRef) -> bool {
        self.store
            .read()
            .dependencies
            .values()
            .any(|d| &d.blocker == blocker && &d.blocked == blocked)
    }

    /// Resolves every unresolved edge between `blocker` and `blocked` (a
    /// checked task-list reference can match more than one dependency
    /// created across separate sync ticks).
    pub fn resolve_dependencies_matching(
        &self,
        blocker: &EntityRef,
        blocked: &EntityRef,
    ) -> Result<(), CommandError> {
        let ids: Vec<DependencyId> = self
            .store
            .read()
            .dependencies
            .values()
            .filter(|d| !d.resolved && &d.blocker == blocker && &d.blocked == blocked)
            .map(|d| d.id.clone())
            .collect();
        for id in ids {
            self.store.append(Event::DependencyResolved { id })?;
        }
        Ok(())
    }

    pub fn has_unresolved_dependencies(&self, kind: EntityKind, id: &str) -> bool {
        self.store.read().has_unresolved_dependencies(kind, id)
    }

    fn require_roadmap_item(&self, id: &RoadmapItemId) -> Result<(), CommandError> {
        if self.store.read().get_roadmap_item(id.as_str()).is_none() {
            return Err(CommandError::NotFound(id.as_str().to_string()));
        }
        Ok(())
    }

    fn require_spec(&self, id: &SpecId) -> Result<devswarm_core::Spec, CommandError> {
        self.store
            .read()
            .get_spec(id.as_str())
            .cloned()
            .ok_or_else(|| CommandError::NotFound(id.as_str().to_string()))
    }
}

fn short_random(ids: &impl IdGen) -> String {
    ids.next().chars().filter(|c| c.is_ascii_alphanumeric()).take(6).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_core::{FakeClock, SequentialIdGen};
    use tempfile::tempdir;

    fn store() -> SharedStore {
        let dir = tempdir().unwrap();
        std::sync::Arc::new(
            crate::store::Store::open(&dir.path().join("wal.jsonl"), &dir.path().join("snap.json")).unwrap(),
        )
    }

    fn subject() -> StateStore<SequentialIdGen, FakeClock> {
        StateStore::new(store(), SequentialIdGen::new("id"), FakeClock::new())
    }

    #[test]
    fn create_roadmap_item_from_issue_uses_deterministic_id() {
        let subject = subject();
        let id = subject
            .create_roadmap_item("Fix bug", "desc", Some((11, "https://x/11".into())), ResolutionMethod::MergeAndPush)
            .unwrap();
        assert_eq!(id.as_str(), "ri-11");
    }

    #[test]
    fn create_spec_rejects_missing_roadmap_item() {
        let subject = subject();
        let result = subject.create_spec(&RoadmapItemId::new("missing"), "content");
        assert!(matches!(result, Err(CommandError::NotFound(_))));
    }

    #[test]
    fn create_spec_computes_semantic_id_from_issue() {
        let subject = subject();
        let ri = subject
            .create_roadmap_item("Fix the Thing", "desc", Some((42, "https://x/42".into())), ResolutionMethod::MergeAndPush)
            .unwrap();
        let spec_id = subject.create_spec(&ri, "plan").unwrap();
        assert_eq!(spec_id.as_str(), "iss-42-fix-the-thing");
    }

    #[test]
    fn self_dependency_is_rejected() {
        let subject = subject();
        let r = EntityRef::roadmap_item("a");
        let result = subject.add_dependency(r.clone(), r);
        assert!(matches!(result, Err(CommandError::DependencyCycle)));
    }

    #[test]
    fn update_task_group_status_rejects_unknown_id() {
        let subject = subject();
        let result = subject.update_task_group_status(&TaskGroupId::new("missing"), TaskGroupStatus::Done);
        assert!(matches!(result, Err(CommandError::NotFound(_))));
    }

    #[test]
    fn update_task_status_records_commit_hash() {
        let subject = subject();
        let ri = subject
            .create_roadmap_item("A", "d", None, ResolutionMethod::MergeAndPush)
            .unwrap();
        let spec_id = subject.create_spec(&ri, "plan").unwrap();
        let group_id = subject.create_task_group(&spec_id, "Group 1", "d", 0).unwrap();
        let task_id = subject.create_task(&group_id, "do the thing", 0).unwrap();
        subject
            .update_task_status(&task_id, TaskStatus::Done, Some("abc123".to_string()))
            .unwrap();
    }

    #[test]
    fn spec_status_skip_is_rejected() {
        let subject = subject();
        let ri = subject
            .create_roadmap_item("A", "d", None, ResolutionMethod::MergeAndPush)
            .unwrap();
        let spec_id = subject.create_spec(&ri, "plan").unwrap();
        let result = subject.update_spec_status(&spec_id, SpecStatus::Approved, None);
        assert!(matches!(result, Err(CommandError::Conflict(_))));
    }
}
