// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AuthState — an opaque key/value bag for already-resolved credentials.
//!
//! The core never performs the authentication UX itself (out of scope, §1);
//! it only stores and serves back whatever tokens were resolved externally.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub key: String,
    pub value: String,
    pub updated_at_ms: u64,
}
