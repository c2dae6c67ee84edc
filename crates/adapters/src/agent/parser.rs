// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming extraction of top-level JSON objects from an agent's stdout, and
//! marker scanning over the text content of parsed messages (§4.3).
//!
//! Modeled as a byte-buffer state machine producing a lazy sequence of parsed
//! JSON values, not a coroutine: bytes are pushed in from wherever they
//! arrive, and `extract` drains whatever complete objects are now available.

use regex::Regex;
use std::sync::OnceLock;

/// Accumulates bytes from a child's stdout and yields complete top-level JSON
/// objects as they become available, tolerating arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub struct JsonFrameExtractor {
    buf: Vec<u8>,
}

impl JsonFrameExtractor {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop every complete top-level JSON object currently in the buffer, in
    /// order. Malformed fragments in a framed position are dropped (logged
    /// by the caller) without desynchronizing subsequent objects.
    pub fn extract(&mut self) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        let mut consumed = 0usize;

        loop {
            let Some(start) = self.buf[consumed..]
                .iter()
                .position(|&b| b == b'{')
                .map(|p| p + consumed)
            else {
                break;
            };
            let Some(end) = find_balanced_end(&self.buf[start..]) else {
                // No complete object yet; wait for more bytes.
                break;
            };
            let end = start + end;
            let frame = &self.buf[start..=end];
            match serde_json::from_slice::<serde_json::Value>(frame) {
                Ok(value) => out.push(value),
                Err(error) => {
                    tracing::warn!(%error, "dropping malformed JSON frame from agent stdout");
                }
            }
            consumed = end + 1;
        }

        if consumed > 0 {
            self.buf.drain(..consumed);
        }
        out
    }
}

/// Find the index (relative to `bytes`, which must start with `{`) of the
/// closing brace that balances the opening one, respecting string literals
/// and escape sequences. Returns `None` if the object is not yet complete.
fn find_balanced_end(bytes: &[u8]) -> Option<usize> {
    debug_assert_eq!(bytes.first(), Some(&b'{'));
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn question_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\[QUESTION_FOR_USER\](.*?)\[/QUESTION_FOR_USER\]").expect("constant regex pattern is valid")
    })
}

#[allow(clippy::expect_used)]
fn resume_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Resume ID:\s*(\S+)").expect("constant regex pattern is valid"))
}

/// Markers detected in one chunk of assistant text (§4.3 "Markers in text").
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetectedMarkers {
    pub question: Option<String>,
    pub task_complete: bool,
    pub resume_id: Option<String>,
}

/// Scan a text block for the three recognized markers. Markers are
/// best-effort hints (§9 "Markers vs structured fields") — never gate a
/// state transition on these alone.
pub fn scan_markers(text: &str) -> DetectedMarkers {
    let question = question_marker_re()
        .captures(text)
        .map(|c| c[1].trim().to_string());
    let task_complete = text.contains("[TASK_COMPLETE]");
    let resume_id = resume_id_re().captures(text).map(|c| c[1].to_string());
    DetectedMarkers {
        question,
        task_complete,
        resume_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_objects_split_across_pushes() {
        let mut extractor = JsonFrameExtractor::new();
        extractor.push(br#"{"type":"sys"#);
        assert!(extractor.extract().is_empty());
        extractor.push(br#"tem"}{"type":"result"#);
        let first = extractor.extract();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["type"], "system");
        extractor.push(br#","result":"done"}"#);
        let second = extractor.extract();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["result"], "done");
    }

    #[test]
    fn braces_inside_strings_do_not_affect_depth() {
        let mut extractor = JsonFrameExtractor::new();
        extractor.push(br#"{"type":"assistant","message":{"content":[{"type":"text","text":"has } and \" in it"}]}}"#);
        let objects = extractor.extract();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0]["message"]["content"][0]["text"],
            "has } and \" in it"
        );
    }

    #[test]
    fn scenario_e_three_messages_in_order() {
        let stream = br#"{"type":"system"}{"type":"assistant","message":{"content":[{"type":"text","text":"has } and \" in it"}]}}{"type":"result","result":"done"}"#;
        let mut extractor = JsonFrameExtractor::new();
        // Feed in arbitrary chunk boundaries.
        for chunk in stream.chunks(7) {
            extractor.push(chunk);
        }
        let objects = extractor.extract();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0]["type"], "system");
        assert_eq!(objects[1]["type"], "assistant");
        assert_eq!(objects[2]["result"], "done");
    }

    #[test]
    fn malformed_frame_is_dropped_without_desyncing_next() {
        let mut extractor = JsonFrameExtractor::new();
        extractor.push(br#"{"bad": }{"type":"ok"}"#);
        let objects = extractor.extract();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["type"], "ok");
    }

    #[test]
    fn question_marker_is_extracted_non_greedy_and_multiline() {
        let text = "before\n[QUESTION_FOR_USER]\nwhich db?\n[/QUESTION_FOR_USER]\nafter";
        let markers = scan_markers(text);
        assert_eq!(markers.question.as_deref(), Some("which db?"));
    }

    #[test]
    fn task_complete_marker_is_detected() {
        assert!(scan_markers("done. [TASK_COMPLETE]").task_complete);
        assert!(!scan_markers("still working").task_complete);
    }

    #[test]
    fn resume_id_is_extracted_as_fallback() {
        let markers = scan_markers("some text\nResume ID: abc-123\nmore text");
        assert_eq!(markers.resume_id.as_deref(), Some("abc-123"));
    }
}
