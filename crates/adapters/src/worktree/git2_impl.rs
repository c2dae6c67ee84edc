// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::process::Command;

use super::{
    branch_name_for, is_valid_worktree_name, MergeOutcome, PullRequestRef, PushFailureKind,
    WorktreeError, WorktreeManager,
};
use crate::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};

/// Native-`git2` worktree manager over a single bare repository, per §4.2.
#[derive(Clone)]
pub struct Git2WorktreeManager {
    bare_repo_path: PathBuf,
    worktrees_dir: PathBuf,
    /// CLI used for `create_pull_request`, e.g. `"gh"`.
    code_host_command: String,
    daemon: Arc<Mutex<Option<tokio::process::Child>>>,
}

impl Git2WorktreeManager {
    pub fn new(bare_repo_path: PathBuf, worktrees_dir: PathBuf, code_host_command: String) -> Self {
        Self {
            bare_repo_path,
            worktrees_dir,
            code_host_command,
            daemon: Arc::new(Mutex::new(None)),
        }
    }

    fn worktree_path(&self, name: &str) -> PathBuf {
        self.worktrees_dir.join(name)
    }

    fn require_valid_name(name: &str) -> Result<(), WorktreeError> {
        if is_valid_worktree_name(name) {
            Ok(())
        } else {
            Err(WorktreeError::InvalidName(name.to_string()))
        }
    }
}

#[async_trait]
impl WorktreeManager for Git2WorktreeManager {
    async fn init(&self, upstream_url: &str) -> Result<(), WorktreeError> {
        let bare_path = self.bare_repo_path.clone();
        let upstream = upstream_url.to_string();
        tokio::task::spawn_blocking(move || {
            let mut builder = git2::build::RepoBuilder::new();
            builder.bare(true);
            builder
                .clone(&upstream, &bare_path)
                .map_err(|e| WorktreeError::Git(e.to_string()))
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))??;

        self.create_worktree("main", "main").await?;

        let mut cmd = Command::new("git");
        cmd.arg("daemon")
            .arg("--reuseaddr")
            .arg("--export-all")
            .arg(format!("--base-path={}", self.bare_repo_path.display()))
            .arg(self.bare_repo_path.display().to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let child = cmd
            .spawn()
            .map_err(|e| WorktreeError::Io(format!("failed to start git daemon: {e}")))?;
        *self.daemon.lock() = Some(child);
        Ok(())
    }

    async fn create_worktree(
        &self,
        name: &str,
        base_branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        Self::require_valid_name(name)?;
        let path = self.worktree_path(name);
        if path.is_dir() {
            return Ok(path);
        }

        let bare_path = self.bare_repo_path.clone();
        let branch_name = branch_name_for(name);
        let base = base_branch.to_string();
        let target = path.clone();
        let name_owned = name.to_string();

        tokio::task::spawn_blocking(move || -> Result<(), WorktreeError> {
            let repo = git2::Repository::open(&bare_path).map_err(|e| WorktreeError::Git(e.to_string()))?;

            if let Ok(mut existing_branch) = repo.find_branch(&branch_name, git2::BranchType::Local) {
                if repo.find_worktree(&name_owned).is_err() {
                    // Branch exists but no worktree was ever created for it:
                    // treat as stale and delete so we can start clean.
                    existing_branch
                        .delete()
                        .map_err(|e| WorktreeError::Git(e.to_string()))?;
                }
            }

            let branch_ref = match repo.find_branch(&branch_name, git2::BranchType::Local) {
                Ok(branch) => branch.into_reference(),
                Err(_) => {
                    let base_branch = repo
                        .find_branch(&base, git2::BranchType::Local)
                        .map_err(|e| WorktreeError::Git(e.to_string()))?;
                    let base_commit = base_branch
                        .get()
                        .peel_to_commit()
                        .map_err(|e| WorktreeError::Git(e.to_string()))?;
                    repo.branch(&branch_name, &base_commit, false)
                        .map_err(|e| WorktreeError::Git(e.to_string()))?
                        .into_reference()
                }
            };

            let mut opts = git2::WorktreeAddOptions::new();
            opts.reference(Some(&branch_ref));
            repo.worktree(&name_owned, &target, Some(&opts))
                .map_err(|e| WorktreeError::Git(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))??;

        Ok(path)
    }

    async fn merge(&self, source: &str, target: &str) -> Result<MergeOutcome, WorktreeError> {
        let target_path = self.worktree_path(target);
        let source_branch = branch_name_for(source);

        let path = target_path.clone();
        tokio::task::spawn_blocking(move || -> Result<MergeOutcome, WorktreeError> {
            let repo = git2::Repository::open(&path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let annotated = repo
                .find_branch(&source_branch, git2::BranchType::Local)
                .map_err(|e| WorktreeError::Git(e.to_string()))?
                .get()
                .peel_to_commit()
                .and_then(|c| repo.find_annotated_commit(c.id()))
                .map_err(|e| WorktreeError::Git(e.to_string()))?;

            let mut merge_opts = git2::MergeOptions::new();
            repo.merge(&[&annotated], Some(&mut merge_opts), None)
                .map_err(|e| WorktreeError::Git(e.to_string()))?;

            let index = repo.index().map_err(|e| WorktreeError::Git(e.to_string()))?;
            if index.has_conflicts() {
                let conflicts = index
                    .conflicts()
                    .map_err(|e| WorktreeError::Git(e.to_string()))?
                    .filter_map(|c| c.ok())
                    .filter_map(|c| c.our.or(c.their))
                    .filter_map(|e| std::str::from_utf8(&e.path).ok().map(str::to_string))
                    .collect();
                return Ok(MergeOutcome {
                    success: false,
                    conflicts,
                });
            }

            let sig = git2::Signature::now("devswarm", "devswarm@localhost")
                .map_err(|e| WorktreeError::Git(e.to_string()))?;
            let tree_id = repo
                .index()
                .and_then(|mut i| i.write_tree())
                .map_err(|e| WorktreeError::Git(e.to_string()))?;
            let tree = repo.find_tree(tree_id).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let head = repo.head().and_then(|h| h.peel_to_commit()).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let source_commit = repo
                .find_commit(annotated.id())
                .map_err(|e| WorktreeError::Git(e.to_string()))?;
            repo.commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("Merge {source_branch} into {target_path}", target_path = path.display()),
                &tree,
                &[&head, &source_commit],
            )
            .map_err(|e| WorktreeError::Git(e.to_string()))?;
            repo.cleanup_state().map_err(|e| WorktreeError::Git(e.to_string()))?;

            Ok(MergeOutcome {
                success: true,
                conflicts: Vec::new(),
            })
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }

    async fn push(&self, worktree_name: &str) -> Result<(), WorktreeError> {
        let path = self.worktree_path(worktree_name);
        let branch = self.get_current_branch(worktree_name).await?;

        let mut cmd = Command::new("git");
        cmd.current_dir(&path).arg("push").arg("origin").arg(&branch);
        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, "git push")
            .await
            .map_err(WorktreeError::Timeout)?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        let kind = if stderr.contains("authentication") || stderr.contains("permission denied (publickey") {
            PushFailureKind::Auth
        } else if stderr.contains("non-fast-forward") || stderr.contains("fetch first") {
            PushFailureKind::Diverged
        } else if stderr.contains("could not resolve host") || stderr.contains("network") {
            PushFailureKind::Network
        } else if stderr.contains("permission") {
            PushFailureKind::Permission
        } else {
            PushFailureKind::Other
        };
        Err(WorktreeError::PushFailed {
            kind,
            message: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn has_unpushed_commits(&self, worktree_name: &str) -> Result<bool, WorktreeError> {
        let path = self.worktree_path(worktree_name);
        tokio::task::spawn_blocking(move || -> Result<bool, WorktreeError> {
            let repo = git2::Repository::open(&path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let head = repo.head().map_err(|e| WorktreeError::Git(e.to_string()))?;
            let local = head.peel_to_commit().map_err(|e| WorktreeError::Git(e.to_string()))?;
            let branch_name = head.shorthand().unwrap_or("HEAD").to_string();

            let Ok(upstream_ref) = repo.find_reference(&format!("refs/remotes/origin/{branch_name}")) else {
                return Ok(true);
            };
            let remote = upstream_ref
                .peel_to_commit()
                .map_err(|e| WorktreeError::Git(e.to_string()))?;
            Ok(local.id() != remote.id())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }

    async fn create_pull_request(
        &self,
        worktree_name: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRef, WorktreeError> {
        self.push(worktree_name).await?;
        let path = self.worktree_path(worktree_name);

        let mut cmd = Command::new(&self.code_host_command);
        cmd.current_dir(&path)
            .arg("pr")
            .arg("create")
            .arg("--title")
            .arg(title)
            .arg("--body")
            .arg(body);
        let output = run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, "create pull request")
            .await
            .map_err(WorktreeError::Timeout)?;

        if !output.status.success() {
            return Err(WorktreeError::PullRequestFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let number = url
            .rsplit('/')
            .next()
            .and_then(|tail| tail.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(PullRequestRef { url, number })
    }

    async fn get_current_branch(&self, worktree_name: &str) -> Result<String, WorktreeError> {
        let path = self.worktree_path(worktree_name);
        tokio::task::spawn_blocking(move || -> Result<String, WorktreeError> {
            let repo = git2::Repository::open(&path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let head = repo.head().map_err(|e| WorktreeError::Git(e.to_string()))?;
            Ok(head.shorthand().unwrap_or("HEAD").to_string())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }

    async fn get_conflict_files(&self, worktree_name: &str) -> Result<Vec<String>, WorktreeError> {
        let path = self.worktree_path(worktree_name);
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, WorktreeError> {
            let repo = git2::Repository::open(&path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let index = repo.index().map_err(|e| WorktreeError::Git(e.to_string()))?;
            if !index.has_conflicts() {
                return Ok(Vec::new());
            }
            Ok(index
                .conflicts()
                .map_err(|e| WorktreeError::Git(e.to_string()))?
                .filter_map(|c| c.ok())
                .filter_map(|c| c.our.or(c.their))
                .filter_map(|e| std::str::from_utf8(&e.path).ok().map(str::to_string))
                .collect())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }

    async fn abort_merge(&self, worktree_name: &str) -> Result<(), WorktreeError> {
        let path = self.worktree_path(worktree_name);
        tokio::task::spawn_blocking(move || -> Result<(), WorktreeError> {
            let repo = git2::Repository::open(&path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            repo.cleanup_state().map_err(|e| WorktreeError::Git(e.to_string()))?;
            let head = repo.head().and_then(|h| h.peel_to_commit()).map_err(|e| WorktreeError::Git(e.to_string()))?;
            repo.reset(head.as_object(), git2::ResetType::Hard, None)
                .map_err(|e| WorktreeError::Git(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }

    async fn remove_worktree(&self, worktree_name: &str) -> Result<(), WorktreeError> {
        Self::require_valid_name(worktree_name)?;
        let bare_path = self.bare_repo_path.clone();
        let path = self.worktree_path(worktree_name);
        let name = worktree_name.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), WorktreeError> {
            let repo = git2::Repository::open(&bare_path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            if let Ok(wt) = repo.find_worktree(&name) {
                wt.prune(Some(git2::WorktreePruneOptions::new().valid(true)))
                    .map_err(|e| WorktreeError::Git(e.to_string()))?;
            }
            if path.is_dir() {
                std::fs::remove_dir_all(&path).map_err(|e| WorktreeError::Io(e.to_string()))?;
            }
            Ok(())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }

    async fn list_worktrees(&self) -> Result<Vec<String>, WorktreeError> {
        let bare_path = self.bare_repo_path.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, WorktreeError> {
            let repo = git2::Repository::open(&bare_path).map_err(|e| WorktreeError::Git(e.to_string()))?;
            let names = repo.worktrees().map_err(|e| WorktreeError::Git(e.to_string()))?;
            Ok(names.iter().flatten().map(str::to_string).collect())
        })
        .await
        .map_err(|e| WorktreeError::Io(e.to_string()))?
    }
}
