// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree Manager (§4.2): wraps a bare content-addressable repository and
//! a directory of worktrees on disk. Reads/branches/merges go through
//! `git2` (native libgit2 bindings, grounded on the tracker's `GitTracker`);
//! push and PR creation shell out via [`crate::subprocess::run_with_timeout`]
//! since `git2` has no direct equivalent for either.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod git2_impl;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorktreeManager;
pub use git2_impl::Git2WorktreeManager;

use async_trait::async_trait;

/// Prefix applied to every non-`main` branch devswarm creates.
pub const BRANCH_PREFIX: &str = "devswarm/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub success: bool,
    pub conflicts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub url: String,
    pub number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushFailureKind {
    Auth,
    Diverged,
    Network,
    Permission,
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    #[error("worktree '{0}' not found")]
    NotFound(String),
    #[error("worktree name '{0}' is invalid: must be alphanumeric-and-hyphen")]
    InvalidName(String),
    #[error("push failed ({kind:?}): {message}")]
    PushFailed {
        kind: PushFailureKind,
        message: String,
    },
    #[error("pull request creation failed: {0}")]
    PullRequestFailed(String),
    #[error("git operation failed: {0}")]
    Git(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("{0}")]
    Timeout(String),
}

/// Name validation per §4.2's invariant: alphanumeric-and-hyphen only.
pub fn is_valid_worktree_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Branch name for a given worktree, per §4.2's invariant: `main` is
/// verbatim, everything else is prefixed with `devswarm/`.
pub fn branch_name_for(worktree_name: &str) -> String {
    if worktree_name == "main" {
        "main".to_string()
    } else {
        format!("{BRANCH_PREFIX}{worktree_name}")
    }
}

#[async_trait]
pub trait WorktreeManager: Clone + Send + Sync + 'static {
    /// Clone `upstream_url` as a bare repo, create the `main` worktree, and
    /// start the background daemon exposing it for local fetch/push.
    async fn init(&self, upstream_url: &str) -> Result<(), WorktreeError>;

    /// Idempotently ensure a worktree named `name` exists, rooted at
    /// `base_branch`, returning its filesystem path.
    async fn create_worktree(
        &self,
        name: &str,
        base_branch: &str,
    ) -> Result<std::path::PathBuf, WorktreeError>;

    async fn merge(&self, source: &str, target: &str) -> Result<MergeOutcome, WorktreeError>;

    async fn push(&self, worktree_name: &str) -> Result<(), WorktreeError>;

    async fn has_unpushed_commits(&self, worktree_name: &str) -> Result<bool, WorktreeError>;

    async fn create_pull_request(
        &self,
        worktree_name: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRef, WorktreeError>;

    async fn get_current_branch(&self, worktree_name: &str) -> Result<String, WorktreeError>;

    async fn get_conflict_files(&self, worktree_name: &str) -> Result<Vec<String>, WorktreeError>;

    async fn abort_merge(&self, worktree_name: &str) -> Result<(), WorktreeError>;

    async fn remove_worktree(&self, worktree_name: &str) -> Result<(), WorktreeError>;

    async fn list_worktrees(&self) -> Result<Vec<String>, WorktreeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_branch_is_verbatim() {
        assert_eq!(branch_name_for("main"), "main");
    }

    #[test]
    fn other_branches_are_prefixed() {
        assert_eq!(branch_name_for("spec-42"), "devswarm/spec-42");
    }

    #[test]
    fn worktree_name_validation_rejects_slashes_and_spaces() {
        assert!(is_valid_worktree_name("spec-42"));
        assert!(!is_valid_worktree_name("spec/42"));
        assert!(!is_valid_worktree_name("spec 42"));
        assert!(!is_valid_worktree_name(""));
    }
}
