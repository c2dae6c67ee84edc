// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin `reqwest` client over devswarmd's HTTP surface (§6), used by the
//! `devswarm` front-end for process management — not a general API binding.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon is not running")]
    NotRunning,
    #[error("could not determine data directory")]
    NoDataDir,
    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    // Allow expect here as this fixed builder configuration is infallible.
    #[allow(clippy::expect_used)]
    fn new(port: u16) -> Self {
        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            http: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("static reqwest client config is always valid"),
        }
    }

    /// Connects only if a daemon already answers `/health` on this port.
    pub async fn connect(port: u16) -> Result<Self, ClientError> {
        let client = Self::new(port);
        client.health().await?;
        Ok(client)
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|_| ClientError::NotRunning)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::NotRunning)
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.http.post(format!("{}/shutdown", self.base_url)).send().await?;
        Ok(())
    }
}
