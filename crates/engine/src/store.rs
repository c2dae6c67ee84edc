// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, observable event store: every mutation is first appended to the
//! write-ahead log, then folded into the in-memory projection, then
//! broadcast to observers (§9 "Event fan-out" — the WAL append is the
//! durable ingress, the broadcast is best-effort).

use std::path::Path;
use std::sync::Arc;

use devswarm_core::Event;
use devswarm_storage::{MaterializedState, Snapshot, Wal};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tokio::sync::broadcast;

use crate::EngineError;

const BROADCAST_CAPACITY: usize = 1024;
/// Snapshot every this many appended events (§9 Open Question #1: snapshots
/// are a pure optimization, never a correctness requirement).
const SNAPSHOT_EVERY: u64 = 200;

pub struct Store {
    wal: Mutex<Wal>,
    state: RwLock<MaterializedState>,
    events_tx: broadcast::Sender<Event>,
    snapshot_path: std::path::PathBuf,
    last_snapshot_seq: Mutex<u64>,
}

impl Store {
    /// Open the WAL at `wal_path`, restoring from `snapshot_path` first if
    /// present, then replaying any WAL entries after the snapshot's `seq`.
    pub fn open(wal_path: &Path, snapshot_path: &Path) -> Result<Self, EngineError> {
        let restored = Snapshot::load(snapshot_path)?;
        let (state, processed_seq) = match restored {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(wal_path, processed_seq)?;
        let mut state = state;
        let mut last_seq = processed_seq;
        for entry in wal.entries_after(processed_seq)? {
            state.apply(&entry.event);
            last_seq = entry.seq;
        }
        wal.mark_processed(last_seq);

        let (events_tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);

        Ok(Self {
            wal: Mutex::new(wal),
            state: RwLock::new(state),
            events_tx,
            snapshot_path: snapshot_path.to_owned(),
            last_snapshot_seq: Mutex::new(processed_seq),
        })
    }

    /// Append `event` durably, fold it into the projection, and publish it
    /// to any subscribers. Returns the assigned WAL sequence number.
    pub fn append(&self, event: Event) -> Result<u64, EngineError> {
        let seq = {
            let mut wal = self.wal.lock();
            let seq = wal.append(&event)?;
            wal.flush()?;
            wal.mark_processed(seq);
            seq
        };
        self.state.write().apply(&event);
        let _ = self.events_tx.send(event);
        self.maybe_snapshot(seq);
        Ok(seq)
    }

    fn maybe_snapshot(&self, seq: u64) {
        let mut last = self.last_snapshot_seq.lock();
        if seq.saturating_sub(*last) < SNAPSHOT_EVERY {
            return;
        }
        self.write_snapshot(seq, &mut last);
    }

    /// Forces a snapshot at the current WAL sequence regardless of
    /// [`SNAPSHOT_EVERY`], so a graceful shutdown leaves the next startup's
    /// WAL replay as short as possible.
    pub fn checkpoint(&self) {
        let seq = self.wal.lock().write_seq();
        let mut last = self.last_snapshot_seq.lock();
        self.write_snapshot(seq, &mut last);
    }

    fn write_snapshot(&self, seq: u64, last: &mut u64) {
        let state = self.state.read().clone();
        let snapshot = Snapshot::new(seq, state);
        if let Err(error) = snapshot.save(&self.snapshot_path) {
            tracing::warn!(%error, "failed to write snapshot");
            return;
        }
        *last = seq;
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MaterializedState> {
        self.state.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events_tx.subscribe()
    }
}

/// Convenience wrapper so callers can share one store across the control
/// loop and the HTTP surface without an extra layer of `Arc<Mutex<_>>`.
pub type SharedStore = Arc<Store>;

#[cfg(test)]
mod tests {
    use super::*;
    use devswarm_core::{ResolutionMethod, RoadmapItemId};
    use tempfile::tempdir;

    #[test]
    fn append_is_visible_through_read_and_subscribe() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("wal.jsonl"), &dir.path().join("snapshot.json")).unwrap();
        let mut rx = store.subscribe();

        store
            .append(Event::RoadmapItemCreated {
                id: RoadmapItemId::new("ri-1"),
                title: "t".to_string(),
                description: "d".to_string(),
                issue_id: Some(1),
                issue_url: Some("https://example.invalid/issues/1".to_string()),
                resolution_method: ResolutionMethod::MergeAndPush,
            })
            .unwrap();

        assert!(store.read().get_roadmap_item("ri-1").is_some());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn reopening_replays_wal_into_state() {
        let dir = tempdir().unwrap();
        let wal_path = dir.path().join("wal.jsonl");
        let snap_path = dir.path().join("snapshot.json");
        {
            let store = Store::open(&wal_path, &snap_path).unwrap();
            store
                .append(Event::RoadmapItemCreated {
                    id: RoadmapItemId::new("ri-1"),
                    title: "t".to_string(),
                    description: "d".to_string(),
                    issue_id: None,
                    issue_url: None,
                    resolution_method: ResolutionMethod::CreatePr,
                })
                .unwrap();
        }
        let reopened = Store::open(&wal_path, &snap_path).unwrap();
        assert!(reopened.read().get_roadmap_item("ri-1").is_some());
    }

    #[test]
    fn checkpoint_snapshots_below_the_periodic_threshold() {
        let dir = tempdir().unwrap();
        let snap_path = dir.path().join("snapshot.json");
        let store = Store::open(&dir.path().join("wal.jsonl"), &snap_path).unwrap();
        store
            .append(Event::RoadmapItemCreated {
                id: RoadmapItemId::new("ri-1"),
                title: "t".to_string(),
                description: "d".to_string(),
                issue_id: None,
                issue_url: None,
                resolution_method: ResolutionMethod::MergeAndPush,
            })
            .unwrap();

        assert!(Snapshot::load(&snap_path).unwrap().is_none());
        store.checkpoint();
        let snapshot = Snapshot::load(&snap_path).unwrap().unwrap();
        assert!(snapshot.state.get_roadmap_item("ri-1").is_some());
    }
}
