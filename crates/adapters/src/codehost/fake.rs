// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CodeHostAdapter, CodeHostError, UpstreamIssue};

#[derive(Clone, Default)]
pub struct FakeCodeHostAdapter {
    issues: Arc<Mutex<Vec<UpstreamIssue>>>,
    closed: Arc<Mutex<HashSet<u64>>>,
}

impl FakeCodeHostAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_issue(&self, issue: UpstreamIssue) {
        self.issues.lock().push(issue);
    }

    pub fn closed_issues(&self) -> Vec<u64> {
        self.closed.lock().iter().copied().collect()
    }
}

#[async_trait]
impl CodeHostAdapter for FakeCodeHostAdapter {
    async fn list_open_issues(&self) -> Result<Vec<UpstreamIssue>, CodeHostError> {
        let closed = self.closed.lock();
        Ok(self
            .issues
            .lock()
            .iter()
            .filter(|issue| !closed.contains(&issue.number))
            .cloned()
            .collect())
    }

    async fn close_issue(&self, number: u64) -> Result<(), CodeHostError> {
        self.closed.lock().insert(number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_issues_are_excluded_from_listing() {
        let host = FakeCodeHostAdapter::new();
        host.seed_issue(UpstreamIssue {
            number: 1,
            title: "fix bug".to_string(),
            body: String::new(),
            html_url: "https://example.invalid/issues/1".to_string(),
        });
        assert_eq!(host.list_open_issues().await.unwrap().len(), 1);
        host.close_issue(1).await.unwrap();
        assert!(host.list_open_issues().await.unwrap().is_empty());
        assert_eq!(host.closed_issues(), vec![1]);
    }
}
