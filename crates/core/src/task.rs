// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task — a leaf step within a TaskGroup.

use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::task_group::TaskGroupId;

define_id! {
    pub struct TaskId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub group_id: TaskGroupId,
    pub description: String,
    pub status: TaskStatus,
    pub commit_hash: Option<String>,
    pub sequence: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Task {
    pub fn new(
        id: TaskId,
        group_id: TaskGroupId,
        description: impl Into<String>,
        sequence: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            group_id,
            description: description.into(),
            status: TaskStatus::Pending,
            commit_hash: None,
            sequence,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}
