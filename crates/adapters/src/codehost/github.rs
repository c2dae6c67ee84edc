// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use serde::Deserialize;

use super::{CodeHostAdapter, CodeHostError, UpstreamIssue};

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    /// Present only on pull requests; GitHub's issues endpoint returns both.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct GitHubCodeHostAdapter {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubCodeHostAdapter {
    pub fn new(owner: String, repo: String, token: String) -> Self {
        Self::with_base_url("https://api.github.com".to_string(), owner, repo, token)
    }

    pub fn with_base_url(base_url: String, owner: String, repo: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            owner,
            repo,
            token,
        }
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues?state=open&per_page=100",
            self.base_url, self.owner, self.repo
        )
    }

    fn issue_url(&self, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/issues/{number}",
            self.base_url, self.owner, self.repo
        )
    }
}

#[async_trait]
impl CodeHostAdapter for GitHubCodeHostAdapter {
    async fn list_open_issues(&self) -> Result<Vec<UpstreamIssue>, CodeHostError> {
        let response = self
            .client
            .get(self.issues_url())
            .bearer_auth(&self.token)
            .header("User-Agent", "devswarm")
            .send()
            .await
            .map_err(|e| CodeHostError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CodeHostError::Status { status, body });
        }

        let raw: Vec<RawIssue> = response
            .json()
            .await
            .map_err(|e| CodeHostError::Request(e.to_string()))?;

        Ok(raw
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(|issue| UpstreamIssue {
                number: issue.number,
                title: issue.title,
                body: issue.body.unwrap_or_default(),
                html_url: issue.html_url,
            })
            .collect())
    }

    async fn close_issue(&self, number: u64) -> Result<(), CodeHostError> {
        let response = self
            .client
            .patch(self.issue_url(number))
            .bearer_auth(&self.token)
            .header("User-Agent", "devswarm")
            .json(&serde_json::json!({ "state": "closed" }))
            .send()
            .await
            .map_err(|e| CodeHostError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CodeHostError::Status { status, body });
        }
        Ok(())
    }
}
