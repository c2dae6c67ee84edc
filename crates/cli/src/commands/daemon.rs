// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `devswarm daemon` — start/stop/status/logs against the running devswarmd.

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::{ClientError, DaemonClient};
use crate::{daemon_process, env};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background (no-op if already running)
    Start,
    /// Stop the daemon, waiting up to 60s for a graceful shutdown
    Stop,
    /// Check whether the daemon is running and answering health checks
    Status,
    /// Print the last N lines of the daemon log
    Logs {
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

pub async fn run(command: DaemonCommand) -> Result<()> {
    match command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
        DaemonCommand::Logs { lines } => logs(lines),
    }
}

async fn start() -> Result<()> {
    let port = env::port();
    if DaemonClient::connect(port).await.is_ok() {
        println!("daemon already running on port {port}");
        return Ok(());
    }

    daemon_process::start_daemon_background().map_err(|e| anyhow!("{e}"))?;

    let deadline = Duration::from_secs(10);
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if DaemonClient::connect(port).await.is_ok() {
            println!("daemon started on port {port}");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if let Some(error) = daemon_process::read_startup_error() {
        return Err(anyhow!("daemon failed to start: {error}"));
    }
    Err(anyhow!("daemon did not become healthy within {}s", deadline.as_secs()))
}

async fn stop() -> Result<()> {
    let port = env::port();
    match DaemonClient::connect(port).await {
        Ok(client) => {
            client.shutdown().await.map_err(|e| anyhow!("{e}"))?;
        }
        Err(ClientError::NotRunning) => {
            println!("daemon not running");
            return Ok(());
        }
        Err(error) => return Err(anyhow!("{error}")),
    }

    if daemon_process::stop_daemon(Duration::from_secs(60)).await {
        println!("daemon stopped");
    } else {
        println!("daemon was not running (stale state cleaned up)");
    }
    Ok(())
}

async fn status() -> Result<()> {
    let port = env::port();
    match DaemonClient::connect(port).await {
        Ok(_) => println!("running (http://127.0.0.1:{port})"),
        Err(_) => println!("not running"),
    }
    Ok(())
}

fn logs(lines: usize) -> Result<()> {
    let Some(path) = daemon_process::log_path() else {
        return Err(anyhow!("could not determine data directory"));
    };
    if !path.exists() {
        println!("no log file found at {}", path.display());
        return Ok(());
    }

    use std::io::{BufRead, BufReader};
    let file = std::fs::File::open(&path)?;
    let all: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = all.len().saturating_sub(lines);
    for line in &all[start..] {
        println!("{line}");
    }
    Ok(())
}
