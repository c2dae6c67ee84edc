// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! devswarmd
//!
//! Background process that owns the event-sourced control loop for one
//! repository and serves the dashboard's HTTP and websocket surface.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use devswarm_daemon::config::Config;
use devswarm_daemon::startup::{self, StartupError};
use devswarm_daemon::state::AppState;
use devswarm_daemon::{http, logging};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

/// Budget for draining in-flight agent turns and flushing the store before
/// a SIGTERM/SIGINT forces an exit (§5).
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("devswarmd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("devswarmd {}", env!("CARGO_PKG_VERSION"));
                println!("Autonomous single-repository coding orchestrator daemon.");
                println!();
                println!("USAGE:");
                println!("    devswarmd");
                println!();
                println!("Configured entirely through DEVSWARM_* environment variables and");
                println!("<data dir>/config/config.toml; see the devswarm CLI for normal use.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("usage: devswarmd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    logging::rotate_log_if_needed(&config.log_path);
    logging::write_startup_marker(&config.log_path)?;
    let log_guard = logging::setup(&config.log_path)?;

    info!(port = config.port, repo = %config.repo_name, "starting devswarmd");

    let bootstrap = match startup::bootstrap(&config).await {
        Ok(bootstrap) => bootstrap,
        Err(StartupError::LockFailed(_)) => {
            eprintln!("devswarmd is already running against {}", config.data_dir.display());
            std::process::exit(1);
        }
        Err(error) => {
            logging::write_startup_error(&config.log_path, &error);
            error!(%error, "failed to start daemon");
            drop(log_guard);
            return Err(error.into());
        }
    };

    let state = Arc::new(AppState::new(bootstrap.store, Arc::clone(&bootstrap.orchestrator), bootstrap.ids));
    state.spawn_dashboard_fanout();

    let orchestrator = Arc::clone(&bootstrap.orchestrator);
    let orchestrator_task = tokio::spawn(orchestrator.run());

    let router = http::build_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "listening");

    let sigterm = signal(SignalKind::terminate())?;
    let shutdown = shutdown_signal(sigterm, Arc::clone(&state.shutdown));
    let serve = axum::serve(listener, router).with_graceful_shutdown(shutdown);

    if let Err(error) = serve.await {
        error!(%error, "server exited with error");
    }

    tokio::time::timeout(SHUTDOWN_BUDGET, drain(state, orchestrator_task)).await.ok();
    drop(bootstrap.lock);
    info!("devswarmd stopped");
    Ok(())
}

/// Resolves once either a unix signal or an in-process `POST /shutdown`
/// fires the shared `Notify`.
async fn shutdown_signal(mut sigterm: tokio::signal::unix::Signal, notify: Arc<Notify>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
        _ = notify.notified() => {}
    }
    info!("shutdown requested");
}

/// Drives the `shutdown_progress` stages a dashboard observer expects
/// (§8 Scenario F): `stopping_orchestrator` while the control loop pauses
/// in-flight agents, `closing_database` once that has finished and the
/// store is checkpointed, then `complete`.
async fn drain(state: Arc<devswarm_daemon::state::AppState>, orchestrator_task: tokio::task::JoinHandle<()>) {
    let _ = state.store.append(devswarm_core::Event::ShutdownProgress { stage: "stopping_orchestrator".to_string() });
    state.shutdown.notify_waiters();
    if let Err(error) = orchestrator_task.await {
        error!(%error, "control loop task panicked during shutdown");
    }

    let _ = state.store.append(devswarm_core::Event::ShutdownProgress { stage: "closing_database".to_string() });
    state.store.checkpoint();

    let _ = state.store.append(devswarm_core::Event::ShutdownProgress { stage: "complete".to_string() });
}
