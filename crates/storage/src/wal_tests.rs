// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use devswarm_core::RoadmapItemId;
use tempfile::tempdir;

fn sample_event(title: &str) -> Event {
    Event::RoadmapItemCreated {
        id: RoadmapItemId::new("r1"),
        title: title.to_string(),
        description: "desc".to_string(),
        issue_id: None,
        issue_url: None,
        resolution_method: devswarm_core::ResolutionMethod::MergeAndPush,
    }
}

#[test]
fn append_then_flush_makes_entries_readable() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    let seq = wal.append(&sample_event("a")).unwrap();
    assert_eq!(seq, 1);
    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 1);
    assert_eq!(entry.event, sample_event("a"));
}

#[test]
fn mark_processed_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&sample_event("a")).unwrap();
        wal.append(&sample_event("b")).unwrap();
        wal.flush().unwrap();
        let first = wal.next_unprocessed().unwrap().unwrap();
        wal.mark_processed(first.seq);
    }
    let mut reopened = Wal::open(&path, 1).unwrap();
    let entry = reopened.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 2);
}

#[test]
fn next_unprocessed_returns_none_when_drained() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    wal.append(&sample_event("a")).unwrap();
    wal.next_unprocessed().unwrap();
    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn entries_after_returns_only_newer_entries() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();
    wal.append(&sample_event("a")).unwrap();
    wal.append(&sample_event("b")).unwrap();
    wal.append(&sample_event("c")).unwrap();
    wal.flush().unwrap();
    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 2);
    assert_eq!(entries[1].seq, 3);
}

#[test]
fn corrupt_wal_is_rotated_and_valid_prefix_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&sample_event("a")).unwrap();
        wal.flush().unwrap();
    }
    // Corrupt the file by appending an unparseable line.
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "not json").unwrap();

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 1);
    assert!(dir.path().join("wal.bak").exists());
}
