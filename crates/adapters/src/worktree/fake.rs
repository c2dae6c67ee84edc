// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{branch_name_for, is_valid_worktree_name, MergeOutcome, PullRequestRef, WorktreeError, WorktreeManager};

#[derive(Debug, Clone)]
struct FakeWorktree {
    branch: String,
    unpushed: bool,
}

/// In-memory [`WorktreeManager`] double: no actual git repository is
/// touched. Tests configure outcomes via the `*_with_*` setters.
#[derive(Clone, Default)]
pub struct FakeWorktreeManager {
    root: PathBuf,
    worktrees: Arc<Mutex<HashMap<String, FakeWorktree>>>,
    next_merge_conflicts: Arc<Mutex<Option<Vec<String>>>>,
    pr_counter: Arc<Mutex<u64>>,
}

impl FakeWorktreeManager {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    pub fn force_next_merge_conflict(&self, files: Vec<String>) {
        *self.next_merge_conflicts.lock() = Some(files);
    }
}

#[async_trait]
impl WorktreeManager for FakeWorktreeManager {
    async fn init(&self, _upstream_url: &str) -> Result<(), WorktreeError> {
        self.worktrees.lock().insert(
            "main".to_string(),
            FakeWorktree {
                branch: "main".to_string(),
                unpushed: false,
            },
        );
        Ok(())
    }

    async fn create_worktree(
        &self,
        name: &str,
        _base_branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        if !is_valid_worktree_name(name) {
            return Err(WorktreeError::InvalidName(name.to_string()));
        }
        self.worktrees.lock().entry(name.to_string()).or_insert(FakeWorktree {
            branch: branch_name_for(name),
            unpushed: false,
        });
        Ok(self.root.join(name))
    }

    async fn merge(&self, _source: &str, target: &str) -> Result<MergeOutcome, WorktreeError> {
        if !self.worktrees.lock().contains_key(target) {
            return Err(WorktreeError::NotFound(target.to_string()));
        }
        if let Some(conflicts) = self.next_merge_conflicts.lock().take() {
            return Ok(MergeOutcome {
                success: false,
                conflicts,
            });
        }
        if let Some(wt) = self.worktrees.lock().get_mut(target) {
            wt.unpushed = true;
        }
        Ok(MergeOutcome {
            success: true,
            conflicts: Vec::new(),
        })
    }

    async fn push(&self, worktree_name: &str) -> Result<(), WorktreeError> {
        let mut worktrees = self.worktrees.lock();
        let wt = worktrees
            .get_mut(worktree_name)
            .ok_or_else(|| WorktreeError::NotFound(worktree_name.to_string()))?;
        wt.unpushed = false;
        Ok(())
    }

    async fn has_unpushed_commits(&self, worktree_name: &str) -> Result<bool, WorktreeError> {
        self.worktrees
            .lock()
            .get(worktree_name)
            .map(|wt| wt.unpushed)
            .ok_or_else(|| WorktreeError::NotFound(worktree_name.to_string()))
    }

    async fn create_pull_request(
        &self,
        worktree_name: &str,
        _title: &str,
        _body: &str,
    ) -> Result<PullRequestRef, WorktreeError> {
        self.push(worktree_name).await?;
        let mut counter = self.pr_counter.lock();
        *counter += 1;
        Ok(PullRequestRef {
            url: format!("https://example.invalid/pulls/{counter}"),
            number: *counter,
        })
    }

    async fn get_current_branch(&self, worktree_name: &str) -> Result<String, WorktreeError> {
        self.worktrees
            .lock()
            .get(worktree_name)
            .map(|wt| wt.branch.clone())
            .ok_or_else(|| WorktreeError::NotFound(worktree_name.to_string()))
    }

    async fn get_conflict_files(&self, _worktree_name: &str) -> Result<Vec<String>, WorktreeError> {
        Ok(Vec::new())
    }

    async fn abort_merge(&self, worktree_name: &str) -> Result<(), WorktreeError> {
        if !self.worktrees.lock().contains_key(worktree_name) {
            return Err(WorktreeError::NotFound(worktree_name.to_string()));
        }
        Ok(())
    }

    async fn remove_worktree(&self, worktree_name: &str) -> Result<(), WorktreeError> {
        self.worktrees.lock().remove(worktree_name);
        Ok(())
    }

    async fn list_worktrees(&self) -> Result<Vec<String>, WorktreeError> {
        Ok(self.worktrees.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_push_clears_unpushed_flag() {
        let manager = FakeWorktreeManager::new(PathBuf::from("/tmp/devswarm-test"));
        manager.create_worktree("spec-1", "main").await.unwrap();
        manager.merge("devswarm/spec-1", "spec-1").await.unwrap();
        assert!(manager.has_unpushed_commits("spec-1").await.unwrap());
        manager.push("spec-1").await.unwrap();
        assert!(!manager.has_unpushed_commits("spec-1").await.unwrap());
    }

    #[tokio::test]
    async fn forced_conflict_is_reported_once() {
        let manager = FakeWorktreeManager::new(PathBuf::from("/tmp/devswarm-test"));
        manager.create_worktree("spec-1", "main").await.unwrap();
        manager.force_next_merge_conflict(vec!["a.rs".to_string()]);
        let outcome = manager.merge("devswarm/spec-1", "spec-1").await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.conflicts, vec!["a.rs".to_string()]);

        let outcome2 = manager.merge("devswarm/spec-1", "spec-1").await.unwrap();
        assert!(outcome2.success);
    }
}
