// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merges a finished spec branch back into `main` once validation has
//! passed, dispatching on the roadmap item's resolution method (§4.5).

use devswarm_adapters::{WorktreeError, WorktreeManager};
use devswarm_core::ResolutionMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Done { pr_url: Option<String> },
    /// Merge conflicts were found; the spec stays at `merging` for a human
    /// to resolve rather than falling into `error` (§4.5).
    Conflict { conflicts: Vec<String> },
    /// Left for `main` to finalize by hand.
    Manual,
}

pub async fn resolve<W: WorktreeManager>(
    worktree: &W,
    spec_worktree_name: &str,
    method: ResolutionMethod,
    roadmap_title: &str,
    roadmap_description: &str,
    spec_id: &str,
) -> Result<ResolutionOutcome, WorktreeError> {
    match method {
        ResolutionMethod::MergeAndPush => {
            let outcome = worktree.merge(spec_worktree_name, "main").await?;
            if !outcome.success {
                return Ok(ResolutionOutcome::Conflict {
                    conflicts: outcome.conflicts,
                });
            }
            worktree.push("main").await?;
            Ok(ResolutionOutcome::Done { pr_url: None })
        }
        ResolutionMethod::CreatePr => {
            let title = format!("[DevSwarm] {roadmap_title}");
            let body = format!("Implements spec {spec_id}.\n\n{roadmap_description}");
            let pr = worktree
                .create_pull_request(spec_worktree_name, &title, &body)
                .await?;
            Ok(ResolutionOutcome::Done { pr_url: Some(pr.url) })
        }
        ResolutionMethod::PushBranch => {
            worktree.push(spec_worktree_name).await?;
            Ok(ResolutionOutcome::Done { pr_url: None })
        }
        ResolutionMethod::Manual => Ok(ResolutionOutcome::Manual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_adapters::FakeWorktreeManager;
    use std::path::PathBuf;

    async fn prepared(name: &str) -> FakeWorktreeManager {
        let worktree = FakeWorktreeManager::new(PathBuf::from("/tmp/devswarm-test"));
        worktree.init("https://example.invalid/upstream.git").await.unwrap();
        worktree.create_worktree(name, "main").await.unwrap();
        worktree
    }

    #[tokio::test]
    async fn merge_and_push_pushes_main_on_clean_merge() {
        let worktree = prepared("spec-1").await;
        let outcome = resolve(&worktree, "spec-1", ResolutionMethod::MergeAndPush, "Fix", "d", "spec-1")
            .await
            .unwrap();
        assert_eq!(outcome, ResolutionOutcome::Done { pr_url: None });
    }

    #[tokio::test]
    async fn merge_conflict_is_reported_without_erroring() {
        let worktree = prepared("spec-2").await;
        worktree.force_next_merge_conflict(vec!["src/lib.rs".to_string()]);
        let outcome = resolve(&worktree, "spec-2", ResolutionMethod::MergeAndPush, "Fix", "d", "spec-2")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ResolutionOutcome::Conflict {
                conflicts: vec!["src/lib.rs".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn create_pr_returns_pr_url() {
        let worktree = prepared("spec-3").await;
        let outcome = resolve(&worktree, "spec-3", ResolutionMethod::CreatePr, "Fix", "d", "spec-3")
            .await
            .unwrap();
        assert!(matches!(outcome, ResolutionOutcome::Done { pr_url: Some(_) }));
    }

    #[tokio::test]
    async fn manual_method_performs_no_git_operations() {
        let worktree = prepared("spec-4").await;
        let outcome = resolve(&worktree, "spec-4", ResolutionMethod::Manual, "Fix", "d", "spec-4")
            .await
            .unwrap();
        assert_eq!(outcome, ResolutionOutcome::Manual);
    }
}
