//! Per-record write lanes.
//!
//! Every autosave for one `(kind, id)` goes through that record's lane. The
//! lane's writer task applies them one at a time in submission order, across
//! every editor session opened on the record, so the stored value is always
//! the one from the most recent update. A lane outlives the sessions that
//! opened it until its queue is drained.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{mpsc, watch, Notify};

use crate::error::CoreError;
use crate::store::{RecordStore, StoreKind};
use crate::types::RecordId;

type LaneKey = (StoreKind, RecordId);

/// Autosave state, for the "saving / saved / failed" indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing edited yet.
    Idle,
    Pending { seq: u64 },
    Saved { seq: u64 },
    /// The latest edit did not reach the store. The edit is still held in
    /// memory; [`RecordEditor::retry`](crate::editor::RecordEditor::retry)
    /// writes it again.
    Failed { seq: u64, message: String },
}

/// One session's view of its own writes.
#[derive(Debug, Clone, Default)]
pub(crate) struct SaveProgress {
    pub(crate) requested: u64,
    pub(crate) committed: u64,
    pub(crate) failure: Option<(u64, String)>,
}

impl SaveProgress {
    pub(crate) fn status(&self) -> SaveStatus {
        if self.committed >= self.requested {
            return if self.requested == 0 {
                SaveStatus::Idle
            } else {
                SaveStatus::Saved {
                    seq: self.committed,
                }
            };
        }
        match &self.failure {
            Some((seq, message)) if *seq == self.requested => SaveStatus::Failed {
                seq: *seq,
                message: message.clone(),
            },
            _ => SaveStatus::Pending {
                seq: self.requested,
            },
        }
    }

    fn acknowledge(&mut self, seq: u64, outcome: &Result<RecordId, CoreError>) {
        match outcome {
            Ok(_) => self.committed = self.committed.max(seq),
            Err(err) => self.failure = Some((seq, err.to_string())),
        }
    }
}

/// A whole-record overwrite queued by one session.
pub(crate) struct LaneWrite {
    pub(crate) seq: u64,
    pub(crate) document: Value,
    pub(crate) progress: Arc<watch::Sender<SaveProgress>>,
}

struct Lane {
    key: LaneKey,
    queue: mpsc::UnboundedSender<LaneWrite>,
    /// Writes submitted but not yet attempted.
    outstanding: watch::Sender<usize>,
    released: Notify,
}

struct LaneEntry {
    lane: Arc<Lane>,
    sessions: usize,
}

/// Registry of live write lanes for one store.
///
/// Cloning shares the registry; every handle onto the same storage must
/// hand out the same `WriteLanes`.
#[derive(Clone, Default)]
pub struct WriteLanes {
    lanes: Arc<Mutex<HashMap<LaneKey, LaneEntry>>>,
}

impl std::fmt::Debug for WriteLanes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteLanes")
            .field("active", &self.active())
            .finish()
    }
}

impl WriteLanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records that currently have a lane.
    pub fn active(&self) -> usize {
        self.lock().len()
    }

    /// Attach a session to the lane for `(kind, id)`, starting its writer
    /// task if there is none. Must run inside a tokio runtime.
    pub(crate) fn join(
        &self,
        store: &Arc<dyn RecordStore>,
        kind: StoreKind,
        id: RecordId,
    ) -> LaneHandle {
        let key = (kind, id);
        let mut lanes = self.lock();
        if let Some(entry) = lanes.get_mut(&key) {
            entry.sessions += 1;
            return LaneHandle {
                lanes: self.clone(),
                lane: Arc::clone(&entry.lane),
            };
        }

        let (queue, pending) = mpsc::unbounded_channel();
        let (outstanding, _) = watch::channel(0);
        let lane = Arc::new(Lane {
            key,
            queue,
            outstanding,
            released: Notify::new(),
        });
        lanes.insert(
            key,
            LaneEntry {
                lane: Arc::clone(&lane),
                sessions: 1,
            },
        );
        tokio::spawn(run_lane(
            self.clone(),
            Arc::clone(store),
            Arc::clone(&lane),
            pending,
        ));
        tracing::trace!(%kind, id, "Opened write lane");

        LaneHandle {
            lanes: self.clone(),
            lane,
        }
    }

    fn leave(&self, lane: &Lane) {
        if let Some(entry) = self.lock().get_mut(&lane.key) {
            entry.sessions = entry.sessions.saturating_sub(1);
        }
        lane.released.notify_one();
    }

    /// Remove the lane once no session holds it and nothing is queued.
    fn close_if_idle(&self, lane: &Lane) -> bool {
        let mut lanes = self.lock();
        let idle = lanes
            .get(&lane.key)
            .is_some_and(|entry| entry.sessions == 0 && *lane.outstanding.borrow() == 0);
        if idle {
            lanes.remove(&lane.key);
        }
        idle
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LaneKey, LaneEntry>> {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A session's membership in a record's lane; leaves on drop.
pub(crate) struct LaneHandle {
    lanes: WriteLanes,
    lane: Arc<Lane>,
}

impl LaneHandle {
    pub(crate) fn submit(&self, write: LaneWrite) -> Result<(), CoreError> {
        self.lane.outstanding.send_modify(|n| *n += 1);
        self.lane.queue.send(write).map_err(|_| {
            self.lane.outstanding.send_modify(|n| *n -= 1);
            CoreError::Internal("autosave writer has stopped".into())
        })
    }

    /// Wait until every write queued on this record, by any session, has
    /// been attempted.
    pub(crate) async fn settled(&self) {
        let mut outstanding = self.lane.outstanding.subscribe();
        // The sender lives in the lane we hold, so this cannot close.
        let _ = outstanding.wait_for(|n| *n == 0).await;
    }
}

impl Drop for LaneHandle {
    fn drop(&mut self) {
        self.lanes.leave(&self.lane);
    }
}

async fn run_lane(
    lanes: WriteLanes,
    store: Arc<dyn RecordStore>,
    lane: Arc<Lane>,
    mut pending: mpsc::UnboundedReceiver<LaneWrite>,
) {
    let (kind, id) = lane.key;
    loop {
        tokio::select! {
            write = pending.recv() => match write {
                Some(first) => {
                    let mut batch = vec![first];
                    while let Ok(newer) = pending.try_recv() {
                        batch.push(newer);
                    }
                    let count = batch.len();
                    write_newest(store.as_ref(), kind, id, batch).await;
                    lane.outstanding.send_modify(|n| *n = n.saturating_sub(count));
                }
                None => break,
            },
            () = lane.released.notified() => {}
        }
        if lanes.close_if_idle(&lane) {
            tracing::trace!(%kind, id, "Closed write lane");
            break;
        }
    }
}

/// Write the newest value in `batch` and report the outcome to every
/// session whose write it covers.
async fn write_newest(
    store: &dyn RecordStore,
    kind: StoreKind,
    id: RecordId,
    mut batch: Vec<LaneWrite>,
) {
    let Some(newest) = batch.pop() else {
        return;
    };
    let LaneWrite {
        seq,
        document,
        progress,
    } = newest;

    let outcome = store.put(kind, Some(id), document).await;
    match &outcome {
        Ok(_) => tracing::debug!(%kind, id, seq, "Autosaved record"),
        Err(err) => tracing::warn!(%kind, id, seq, error = %err, "Autosave failed"),
    }

    for superseded in &batch {
        superseded
            .progress
            .send_modify(|p| p.acknowledge(superseded.seq, &outcome));
    }
    progress.send_modify(|p| p.acknowledge(seq, &outcome));
}
