// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;

/// Resolve data directory: DEVSWARM_DATA_DIR > XDG_STATE_HOME/devswarm > ~/.local/state/devswarm
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DEVSWARM_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("devswarm"));
    }
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/state/devswarm"))
}

pub fn port() -> u16 {
    std::env::var("DEVSWARM_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(4190)
}

pub fn daemon_binary() -> Option<String> {
    std::env::var("DEVSWARM_DAEMON_BINARY").ok()
}

pub fn cargo_manifest_dir() -> Option<String> {
    std::env::var("CARGO_MANIFEST_DIR").ok()
}
