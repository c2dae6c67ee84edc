// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency — a directed blocking edge between two entities.
//!
//! The dependency relation is a directed graph over entities (today, always
//! RoadmapItems). Edges are stored individually with a pre-commit cycle check;
//! the transitive closure is never materialized (design note, §9).

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::entity::EntityRef;

define_id! {
    pub struct DependencyId;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub blocker: EntityRef,
    pub blocked: EntityRef,
    pub resolved: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Dependency {
    pub fn new(id: DependencyId, blocker: EntityRef, blocked: EntityRef, now_ms: u64) -> Self {
        Self {
            id,
            blocker,
            blocked,
            resolved: false,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}

/// Detects whether adding an edge `blocker -> blocked` would introduce a
/// cycle, given the existing edges. Performs a DFS from `blocker` following
/// existing blocked-by-edges backwards to see if it can reach `blocked`
/// (which would mean `blocked` already (transitively) blocks `blocker`).
///
/// `edges` is `(blocker, blocked)` pairs, keyed the same way `Dependency`
/// stores them (matching on `EntityRef` equality, not a numeric index).
pub fn would_create_cycle(edges: &[(EntityRef, EntityRef)], new_blocker: &EntityRef, new_blocked: &EntityRef) -> bool {
    if new_blocker == new_blocked {
        return true;
    }
    // A cycle exists iff `new_blocked` can already reach `new_blocker` by
    // following existing blocker->blocked edges forward.
    let mut stack = vec![new_blocked.clone()];
    let mut seen = std::collections::HashSet::new();
    while let Some(node) = stack.pop() {
        if node == *new_blocker {
            return true;
        }
        if !seen.insert(node.clone()) {
            continue;
        }
        for (blocker, blocked) in edges {
            if *blocker == node {
                stack.push(blocked.clone());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: &str) -> EntityRef {
        EntityRef::roadmap_item(id)
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        assert!(would_create_cycle(&[], &r("a"), &r("a")));
    }

    #[test]
    fn direct_cycle_is_detected() {
        // existing: a blocks b. proposing: b blocks a => cycle.
        let edges = vec![(r("a"), r("b"))];
        assert!(would_create_cycle(&edges, &r("b"), &r("a")));
    }

    #[test]
    fn transitive_cycle_is_detected() {
        // existing: a blocks b, b blocks c. proposing: c blocks a => cycle.
        let edges = vec![(r("a"), r("b")), (r("b"), r("c"))];
        assert!(would_create_cycle(&edges, &r("c"), &r("a")));
    }

    #[test]
    fn unrelated_edge_is_not_a_cycle() {
        let edges = vec![(r("a"), r("b"))];
        assert!(!would_create_cycle(&edges, &r("c"), &r("d")));
    }
}
