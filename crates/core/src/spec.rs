// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spec — a written plan for implementing one RoadmapItem.

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::roadmap_item::RoadmapItemId;

define_id! {
    pub struct SpecId;
}

/// Monotonic over the linear prefix, with `Error` reachable from any
/// non-terminal state (see invariant #2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecStatus {
    Draft,
    PendingReview,
    Approved,
    InProgress,
    Validating,
    Merging,
    Done,
    Error,
}

impl SpecStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SpecStatus::Done | SpecStatus::Error)
    }

    /// Position in the linear happy-path prefix, or `None` for `Error` (which
    /// is reachable from anywhere and therefore has no fixed position).
    fn ordinal(&self) -> Option<u8> {
        match self {
            SpecStatus::Draft => Some(0),
            SpecStatus::PendingReview => Some(1),
            SpecStatus::Approved => Some(2),
            SpecStatus::InProgress => Some(3),
            SpecStatus::Validating => Some(4),
            SpecStatus::Merging => Some(5),
            SpecStatus::Done => Some(6),
            SpecStatus::Error => None,
        }
    }

    /// Whether transitioning from `self` to `next` is legal under invariant #2.
    pub fn can_transition_to(&self, next: SpecStatus) -> bool {
        if next == SpecStatus::Error {
            return !self.is_terminal();
        }
        match (self.ordinal(), next.ordinal()) {
            (Some(from), Some(to)) => to == from + 1,
            _ => false,
        }
    }
}

impl std::fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SpecStatus::Draft => "draft",
            SpecStatus::PendingReview => "pending_review",
            SpecStatus::Approved => "approved",
            SpecStatus::InProgress => "in_progress",
            SpecStatus::Validating => "validating",
            SpecStatus::Merging => "merging",
            SpecStatus::Done => "done",
            SpecStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub id: SpecId,
    pub roadmap_item_id: RoadmapItemId,
    pub content: String,
    pub status: SpecStatus,
    pub worktree_name: Option<String>,
    pub branch_name: Option<String>,
    pub error_message: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Spec {
    pub fn new(
        id: SpecId,
        roadmap_item_id: RoadmapItemId,
        content: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            roadmap_item_id,
            content: content.into(),
            status: SpecStatus::Draft,
            worktree_name: None,
            branch_name: None,
            error_message: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Invariant #3: in_progress-or-later implies a worktree and branch are set.
    pub fn has_workspace(&self) -> bool {
        self.worktree_name.is_some() && self.branch_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal_in_order() {
        let order = [
            SpecStatus::Draft,
            SpecStatus::PendingReview,
            SpecStatus::Approved,
            SpecStatus::InProgress,
            SpecStatus::Validating,
            SpecStatus::Merging,
            SpecStatus::Done,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_a_step_is_illegal() {
        assert!(!SpecStatus::Draft.can_transition_to(SpecStatus::Approved));
    }

    #[test]
    fn error_reachable_from_any_nonterminal_state() {
        assert!(SpecStatus::Draft.can_transition_to(SpecStatus::Error));
        assert!(SpecStatus::Validating.can_transition_to(SpecStatus::Error));
        assert!(!SpecStatus::Done.can_transition_to(SpecStatus::Error));
        assert!(!SpecStatus::Error.can_transition_to(SpecStatus::Error));
    }
}
