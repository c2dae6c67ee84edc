// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::MaterializedState;
use devswarm_core::{Event, ResolutionMethod, RoadmapItemId};
use std::io::Write;
use tempfile::tempdir;

fn sample_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    state.apply(&Event::RoadmapItemCreated {
        id: RoadmapItemId::new("r1"),
        title: "Fix the thing".to_string(),
        description: "desc".to_string(),
        issue_id: Some(7),
        issue_url: None,
        resolution_method: ResolutionMethod::CreatePr,
    });
    state
}

#[test]
fn test_snapshot_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let snapshot = Snapshot::new(42, sample_state());
    snapshot.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 42);
    assert!(loaded.state.get_roadmap_item("r1").is_some());
}

#[test]
fn test_load_nonexistent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nonexistent.json");
    assert!(Snapshot::load(&path).unwrap().is_none());
}

#[test]
fn test_snapshot_atomic_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let tmp_path = path.with_extension("tmp");

    Snapshot::new(1, sample_state()).save(&path).unwrap();

    assert!(!tmp_path.exists());
    assert!(path.exists());
}

#[test]
fn test_snapshot_preserves_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut state = MaterializedState::default();
    for i in 0..3 {
        state.apply(&Event::RoadmapItemCreated {
            id: RoadmapItemId::new(format!("r{i}")),
            title: format!("Item {i}"),
            description: "desc".to_string(),
            issue_id: None,
            issue_url: None,
            resolution_method: ResolutionMethod::MergeAndPush,
        });
    }

    let snapshot = Snapshot::new(100, state);
    snapshot.save(&path).unwrap();

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 100);
    assert_eq!(loaded.state.roadmap_items.len(), 3);
    for i in 0..3 {
        assert!(loaded.state.roadmap_items.contains_key(&format!("r{i}")));
    }
}

#[test]
fn test_load_corrupt_snapshot_returns_none_and_creates_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"\xe5\x03\x01binary-garbage").unwrap();
    drop(f);

    let result = Snapshot::load(&path).unwrap();
    assert!(result.is_none());
    assert!(!path.exists());
    assert!(path.with_extension("bak").exists());
}

#[test]
fn test_load_corrupt_snapshot_rotates_bak_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    for i in 1..=4u8 {
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[i; 4]).unwrap();
        drop(f);
        assert!(Snapshot::load(&path).unwrap().is_none());
    }

    let bak1 = path.with_extension("bak");
    assert!(bak1.exists());
    assert_eq!(std::fs::read(&bak1).unwrap(), vec![4u8; 4]);

    let bak2 = path.with_extension("bak.2");
    assert!(bak2.exists());
    assert_eq!(std::fs::read(&bak2).unwrap(), vec![3u8; 4]);

    let bak3 = path.with_extension("bak.3");
    assert!(bak3.exists());
    assert_eq!(std::fs::read(&bak3).unwrap(), vec![2u8; 4]);

    assert!(!path.with_extension("bak.4").exists());
}
