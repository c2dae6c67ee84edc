// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream code-host client (§4.4 "Periodic external sync"). Out of scope
//! as a feature surface — referenced only through this interface, the same
//! way the concrete agent runtime is referenced only through
//! [`crate::agent::AgentAdapter`] — but the core still needs a real
//! implementation to drive against.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod github;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCodeHostAdapter;
pub use github::GitHubCodeHostAdapter;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamIssue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub html_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CodeHostError {
    #[error("code host request failed: {0}")]
    Request(String),
    #[error("code host returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// The subset of a code host's issue API the control loop needs: listing
/// open issues for sync, and closing one once its roadmap item lands.
#[async_trait]
pub trait CodeHostAdapter: Clone + Send + Sync + 'static {
    async fn list_open_issues(&self) -> Result<Vec<UpstreamIssue>, CodeHostError>;

    async fn close_issue(&self, number: u64) -> Result<(), CodeHostError>;
}
