// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-entity references: the (kind, id) pairs used by dependencies and by
//! an agent instance's "what am I working on" context.

use serde::{Deserialize, Serialize};

/// The entities a dependency or agent context can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    RoadmapItem,
    /// Not populated by any current code path; kept for forward compatibility
    /// (see open question on spec-kind dependencies).
    Spec,
}

/// A pointer at one entity, used as the blocker/blocked side of a `Dependency`
/// and as an `AgentInstance`'s context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn roadmap_item(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::RoadmapItem,
            id: id.into(),
        }
    }

    pub fn spec(id: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Spec,
            id: id.into(),
        }
    }
}
