// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! devswarm — process-management front-end for devswarmd (§2.1 "CLI").
//! The dashboard talks to devswarmd's HTTP surface directly; this binary
//! only starts, stops, and inspects the daemon process itself.

mod client;
mod commands;
mod daemon_process;
mod env;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::daemon::DaemonArgs;

#[derive(Parser)]
#[command(name = "devswarm", version, about = "Process management for devswarmd")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start, stop, and inspect the devswarmd daemon
    Daemon(DaemonArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Daemon(args) => commands::daemon::run(args.command).await,
    }
}
