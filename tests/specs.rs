//! Black-box specifications for the `devswarm` CLI: invokes the compiled
//! binary and verifies stdout/stderr/exit codes, independent of whether a
//! daemon is actually running.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/daemon_status.rs"]
mod daemon_status;
