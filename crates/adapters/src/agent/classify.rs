// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heuristic classification of an agent invocation's failure, from its
//! stderr tail (§4.3 "Agent-error classification").

use devswarm_core::AgentError;

/// Classify a failed invocation's stderr tail into one of the known
/// `AgentError` kinds, falling back to `Other` with the tail attached.
///
/// This is deliberately keyword-based rather than exit-code-based: different
/// agent runtimes and versions use inconsistent exit codes for the same
/// underlying condition, but tend to print recognizable phrases.
pub fn classify_agent_error(stderr_tail: &str) -> AgentError {
    let lower = stderr_tail.to_lowercase();

    if contains_any(
        &lower,
        &["unauthorized", "401", "invalid api key", "authentication_error", "not logged in"],
    ) {
        return AgentError::Unauthorized;
    }
    if contains_any(
        &lower,
        &["insufficient_quota", "out of credit", "billing", "quota exceeded", "credit balance"],
    ) {
        return AgentError::OutOfCredits;
    }
    if contains_any(
        &lower,
        &["rate_limit", "rate limit", "429", "too many requests"],
    ) {
        return AgentError::RateLimited;
    }
    if contains_any(
        &lower,
        &[
            "dns",
            "enotfound",
            "econnrefused",
            "network is unreachable",
            "could not resolve host",
            "no internet",
            "connection reset",
        ],
    ) {
        return AgentError::NoInternet;
    }

    AgentError::Other {
        message: crate::subprocess::truncate_tail(stderr_tail, 2048),
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unauthorized() {
        assert_eq!(
            classify_agent_error("Error: 401 Unauthorized: invalid api key"),
            AgentError::Unauthorized
        );
    }

    #[test]
    fn classifies_out_of_credits() {
        assert_eq!(
            classify_agent_error("Your credit balance is too low to continue"),
            AgentError::OutOfCredits
        );
    }

    #[test]
    fn classifies_rate_limited() {
        assert_eq!(
            classify_agent_error("429 Too Many Requests, please slow down"),
            AgentError::RateLimited
        );
    }

    #[test]
    fn classifies_no_internet() {
        assert_eq!(
            classify_agent_error("getaddrinfo ENOTFOUND api.anthropic.com"),
            AgentError::NoInternet
        );
    }

    #[test]
    fn unrecognized_text_falls_back_to_other() {
        match classify_agent_error("panic: unexpected nil pointer") {
            AgentError::Other { message } => assert!(message.contains("nil pointer")),
            other => panic!("expected Other, got {other:?}"),
        }
    }
}
