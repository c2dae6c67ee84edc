// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses an issue body for dependency references and reconciles them
//! against the dependency edges already recorded for a roadmap item.
//!
//! Recognized forms (all case-insensitive):
//! - unchecked task-list items: `- [ ] #11`
//! - checked task-list items: `- [x] #11` (resolves instead of creating)
//! - phrases: `blocked by #11`, `depends on #11`, `requires #11`,
//!   `waiting on #11` / `waiting for #11`

use std::sync::OnceLock;

use regex::Regex;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn task_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[( |x)\]\s*#(\d+)").expect("constant regex pattern is valid"))
}

#[allow(clippy::expect_used)]
fn phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:blocked by|depends on|requires|waiting (?:on|for))\s+#(\d+)")
            .expect("constant regex pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub issue_number: u64,
    /// `true` if the reference is a checked task-list item (`[x]`), meaning
    /// the dependency it names should be resolved rather than created.
    pub resolved: bool,
}

/// Scan `body` and return every dependency reference found, deduplicated by
/// `(issue_number, resolved)`.
pub fn parse_references(body: &str) -> Vec<ParsedReference> {
    let mut refs = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for caps in task_list_re().captures_iter(body) {
        let resolved = caps[1].eq_ignore_ascii_case("x");
        if let Ok(issue_number) = caps[2].parse() {
            if seen.insert((issue_number, resolved)) {
                refs.push(ParsedReference { issue_number, resolved });
            }
        }
    }
    for caps in phrase_re().captures_iter(body) {
        if let Ok(issue_number) = caps[1].parse() {
            if seen.insert((issue_number, false)) {
                refs.push(ParsedReference {
                    issue_number,
                    resolved: false,
                });
            }
        }
    }
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_task_list_item_is_a_blocking_reference() {
        let refs = parse_references("- [ ] #11\nsome text");
        assert_eq!(
            refs,
            vec![ParsedReference {
                issue_number: 11,
                resolved: false
            }]
        );
    }

    #[test]
    fn checked_task_list_item_is_a_resolution() {
        let refs = parse_references("- [x] #11");
        assert_eq!(
            refs,
            vec![ParsedReference {
                issue_number: 11,
                resolved: true
            }]
        );
    }

    #[test]
    fn phrase_forms_are_case_insensitive() {
        for phrase in [
            "Blocked By #5",
            "depends on #5",
            "REQUIRES #5",
            "waiting on #5",
            "waiting for #5",
        ] {
            let refs = parse_references(phrase);
            assert_eq!(refs, vec![ParsedReference {
                issue_number: 5,
                resolved: false
            }], "failed for phrase: {phrase}");
        }
    }

    #[test]
    fn duplicate_references_are_deduplicated() {
        let refs = parse_references("blocked by #9\nrequires #9\n- [ ] #9");
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn unrelated_text_yields_no_references() {
        assert!(parse_references("just a normal description, no refs here").is_empty());
    }

    #[test]
    fn mixed_checked_and_unchecked_of_the_same_issue_both_appear() {
        let refs = parse_references("- [ ] #3\n- [x] #3");
        assert_eq!(refs.len(), 2);
        assert!(refs.contains(&ParsedReference {
            issue_number: 3,
            resolved: false
        }));
        assert!(refs.contains(&ParsedReference {
            issue_number: 3,
            resolved: true
        }));
    }
}
