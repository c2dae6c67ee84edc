// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RoadmapItem — a unit of planned work, usually one upstream issue.

use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    pub struct RoadmapItemId;
}

/// Lifecycle status of a roadmap item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapItemStatus {
    Pending,
    InProgress,
    Done,
}

impl Default for RoadmapItemStatus {
    fn default() -> Self {
        RoadmapItemStatus::Pending
    }
}

impl std::fmt::Display for RoadmapItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoadmapItemStatus::Pending => "pending",
            RoadmapItemStatus::InProgress => "in_progress",
            RoadmapItemStatus::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// How a completed spec for this roadmap item is returned upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    MergeAndPush,
    CreatePr,
    PushBranch,
    Manual,
}

impl Default for ResolutionMethod {
    fn default() -> Self {
        ResolutionMethod::MergeAndPush
    }
}

/// Where a roadmap item originated, when it was synced from an issue tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IssueRef {
    pub issue_id: Option<u64>,
    pub issue_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub id: RoadmapItemId,
    pub title: String,
    pub description: String,
    pub status: RoadmapItemStatus,
    pub issue: IssueRef,
    pub closed: bool,
    pub github_issue_closed: bool,
    pub spec_id: Option<String>,
    pub resolution_method: ResolutionMethod,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl RoadmapItem {
    pub fn new(
        id: RoadmapItemId,
        title: impl Into<String>,
        description: impl Into<String>,
        issue: IssueRef,
        resolution_method: ResolutionMethod,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: RoadmapItemStatus::Pending,
            issue,
            closed: false,
            github_issue_closed: false,
            spec_id: None,
            resolution_method,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == RoadmapItemStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_starts_pending_and_unclosed() {
        let item = RoadmapItem::new(
            RoadmapItemId::new("r1"),
            "Fix A",
            "desc",
            IssueRef {
                issue_id: Some(10),
                issue_url: None,
            },
            ResolutionMethod::MergeAndPush,
            1000,
        );
        assert_eq!(item.status, RoadmapItemStatus::Pending);
        assert!(!item.closed);
        assert!(!item.github_issue_closed);
        assert!(!item.is_done());
    }
}
