// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UserQuestion — a blocking prompt an agent emitted for a human to answer.

use serde::{Deserialize, Serialize};

use crate::agent_instance::AgentInstanceId;
use crate::define_id;

define_id! {
    pub struct UserQuestionId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserQuestionStatus {
    Pending,
    Answered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuestion {
    pub id: UserQuestionId,
    pub agent_id: AgentInstanceId,
    pub question: String,
    pub response: Option<String>,
    pub status: UserQuestionStatus,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl UserQuestion {
    pub fn new(
        id: UserQuestionId,
        agent_id: AgentInstanceId,
        question: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            agent_id,
            question: question.into(),
            response: None,
            status: UserQuestionStatus::Pending,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}
