// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic Spec id generation (§3 identity rule, Testable Property #4).
//!
//! `iss-<n>-<slug>` when the roadmap item came from an issue (deterministic:
//! a pure function of the issue number and title), otherwise
//! `live-<slug>-<6-char-random>` (unique suffix supplied by the caller's
//! random source, kept out of this function so the function itself stays
//! pure and testable).

/// Lowercase, replace runs of non-alphanumeric characters with a single
/// hyphen, trim leading/trailing hyphens, cap length. Idempotent on
/// already-slugged input.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_hyphen = true; // swallow leading hyphen
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    const MAX_LEN: usize = 40;
    if out.len() > MAX_LEN {
        out.truncate(MAX_LEN);
        while out.ends_with('-') {
            out.pop();
        }
    }
    out
}

/// Deterministic id for a spec originating from an issue.
pub fn issue_spec_id(issue_number: u64, title: &str) -> String {
    format!("iss-{}-{}", issue_number, slugify(title))
}

/// Id for a spec with no originating issue. `random_suffix` must be supplied
/// by the caller (6 lowercase-alphanumeric characters); this function does
/// not perform randomness itself so it stays a pure, testable function.
pub fn live_spec_id(title: &str, random_suffix: &str) -> String {
    format!("live-{}-{}", slugify(title), random_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_is_idempotent_on_already_slugged_input() {
        let once = slugify("Fix the Thing!!");
        let twice = slugify(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn issue_spec_id_is_deterministic() {
        assert_eq!(
            issue_spec_id(42, "Fix the Thing"),
            issue_spec_id(42, "Fix the Thing")
        );
        assert_eq!(issue_spec_id(42, "Fix the Thing"), "iss-42-fix-the-thing");
    }

    #[test]
    fn different_titles_give_different_issue_ids() {
        assert_ne!(issue_spec_id(1, "A"), issue_spec_id(1, "B"));
    }

    #[test]
    fn live_spec_id_embeds_suffix() {
        let id = live_spec_id("Quick Fix", "ab12cd");
        assert_eq!(id, "live-quick-fix-ab12cd");
    }

    #[test]
    fn slugify_collapses_runs_of_punctuation() {
        assert_eq!(slugify("a---b  c"), "a-b-c");
    }
}
