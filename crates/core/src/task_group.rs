// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TaskGroup — a coarse, sequenced step within a Spec.

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::spec::SpecId;

define_id! {
    pub struct TaskGroupId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskGroupStatus {
    Pending,
    InProgress,
    Done,
}

impl Default for TaskGroupStatus {
    fn default() -> Self {
        TaskGroupStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskGroup {
    pub id: TaskGroupId,
    pub spec_id: SpecId,
    pub name: String,
    pub description: String,
    pub status: TaskGroupStatus,
    pub sequence: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl TaskGroup {
    pub fn new(
        id: TaskGroupId,
        spec_id: SpecId,
        name: impl Into<String>,
        description: impl Into<String>,
        sequence: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            spec_id,
            name: name.into(),
            description: description.into(),
            status: TaskGroupStatus::Pending,
            sequence,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}
