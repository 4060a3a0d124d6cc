//! Editable-record controller.
//!
//! A [`RecordEditor`] owns the in-memory copy of one record for the length of
//! an edit session. Every accepted [`update`](RecordEditor::update) replaces
//! the whole record and queues a whole-record overwrite on the record's
//! write lane (see [`crate::autosave`]). The lane is shared by every session
//! on the same record, so the value left in the store is always the one from
//! the most recent `update`, however slow earlier writes were.
//!
//! Dropping an editor does not cancel queued writes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::autosave::{LaneHandle, LaneWrite, SaveProgress};
use crate::error::CoreError;
use crate::store::{self, Record, RecordStore};
use crate::types::RecordId;

pub use crate::autosave::SaveStatus;

/// Backoff used while waiting for a just-created record to become readable.
#[derive(Debug, Clone)]
pub struct HydrateConfig {
    /// Total load attempts before giving up with `NotFound`.
    pub attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each miss.
    pub multiplier: f64,
}

impl Default for HydrateConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay, clamped to [`HydrateConfig::max_delay`].
pub fn next_delay(current: Duration, config: &HydrateConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// What the page should render.
#[derive(Debug, Clone, PartialEq)]
pub enum EditState<R> {
    Loading,
    Ready(R),
    /// Load failed (or the record is gone); carries the message to show.
    Error(String),
}

pub struct RecordEditor<R: Record> {
    store: Arc<dyn RecordStore>,
    id: RecordId,
    state: watch::Sender<EditState<R>>,
    progress: Arc<watch::Sender<SaveProgress>>,
    lane: LaneHandle,
    seq: u64,
}

impl<R: Record> RecordEditor<R> {
    /// Start an edit session for `id` in the `Loading` state.
    ///
    /// Joins (or starts) the record's write lane, so this must run inside a
    /// tokio runtime.
    pub fn new(store: Arc<dyn RecordStore>, id: RecordId) -> Self {
        let (state, _) = watch::channel(EditState::Loading);
        let (progress, _) = watch::channel(SaveProgress::default());
        let lane = store.write_lanes().join(&store, R::KIND, id);

        Self {
            store,
            id,
            state,
            progress: Arc::new(progress),
            lane,
            seq: 0,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Observe state transitions (loading, ready, error).
    pub fn subscribe(&self) -> watch::Receiver<EditState<R>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> EditState<R> {
        self.state.borrow().clone()
    }

    /// The current in-memory record, if loaded.
    pub fn record(&self) -> Option<R> {
        match &*self.state.borrow() {
            EditState::Ready(record) => Some(record.clone()),
            _ => None,
        }
    }

    pub fn save_status(&self) -> SaveStatus {
        self.progress.borrow().status()
    }

    /// Load the record, retrying while it is not yet visible.
    pub async fn hydrate(&mut self, config: &HydrateConfig) -> Result<R, CoreError> {
        self.hydrate_with(config, |record| async move { Ok(record) })
            .await
    }

    /// Load the record and pass it through `enrich` before exposing it.
    ///
    /// Nothing is written; `enrich` only shapes the first `Ready` state.
    pub async fn hydrate_with<F, Fut>(
        &mut self,
        config: &HydrateConfig,
        enrich: F,
    ) -> Result<R, CoreError>
    where
        F: FnOnce(R) -> Fut,
        Fut: Future<Output = Result<R, CoreError>>,
    {
        // The stored copy is older than an edit that failed to save; keep
        // showing the edit so `retry` can still write it.
        if let Err(err) = self.flush().await {
            tracing::warn!(kind = %R::KIND, id = self.id, error = %err, "Refusing to reload over an unsaved edit");
            return Err(err);
        }
        // Writes queued by an earlier session on this record land first.
        self.lane.settled().await;
        self.state.send_replace(EditState::Loading);

        let loaded = match load_when_visible::<R>(self.store.as_ref(), self.id, config).await {
            Ok(record) => enrich(record).await,
            Err(err) => Err(err),
        };

        match loaded {
            Ok(record) => {
                tracing::debug!(kind = %R::KIND, id = self.id, "Record hydrated");
                self.state.send_replace(EditState::Ready(record.clone()));
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(kind = %R::KIND, id = self.id, error = %err, "Failed to load record");
                self.state.send_replace(EditState::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Replace the whole record and queue it for saving. Returns the edit's
    /// sequence number.
    pub fn update(&mut self, mut record: R) -> Result<u64, CoreError> {
        if !matches!(*self.state.borrow(), EditState::Ready(_)) {
            return Err(CoreError::Conflict(format!(
                "{} {} is not loaded for editing",
                R::KIND.entity(),
                self.id
            )));
        }
        record.set_id(self.id);
        let document = serde_json::to_value(&record)?;

        self.seq += 1;
        let seq = self.seq;
        self.state.send_replace(EditState::Ready(record));
        self.progress.send_modify(|p| p.requested = seq);

        self.lane.submit(LaneWrite {
            seq,
            document,
            progress: Arc::clone(&self.progress),
        })?;
        Ok(seq)
    }

    /// Apply `change` to a copy of the current record and [`update`](Self::update) with it.
    pub fn edit(&mut self, change: impl FnOnce(&mut R)) -> Result<u64, CoreError> {
        let mut record = self.record().ok_or_else(|| {
            CoreError::Conflict(format!(
                "{} {} is not loaded for editing",
                R::KIND.entity(),
                self.id
            ))
        })?;
        change(&mut record);
        self.update(record)
    }

    /// Re-queue the in-memory record after a failed save.
    ///
    /// Returns the new sequence number, or `None` if the last save did not fail.
    pub fn retry(&mut self) -> Result<Option<u64>, CoreError> {
        if !matches!(self.save_status(), SaveStatus::Failed { .. }) {
            return Ok(None);
        }
        let record = self.record().ok_or_else(|| {
            CoreError::Conflict(format!("{} {} is not loaded", R::KIND.entity(), self.id))
        })?;
        tracing::info!(kind = %R::KIND, id = self.id, "Retrying failed autosave");
        self.update(record).map(Some)
    }

    /// Wait until the latest edit has been written.
    ///
    /// Fails with [`CoreError::Storage`] if that write failed.
    pub async fn flush(&self) -> Result<(), CoreError> {
        let target = self.seq;
        if target == 0 {
            return Ok(());
        }
        let mut progress = self.progress.subscribe();
        let outcome = progress
            .wait_for(|p| {
                p.committed >= target || p.failure.as_ref().is_some_and(|(seq, _)| *seq >= target)
            })
            .await
            .map_err(|_| CoreError::Internal("autosave progress channel closed".into()))?;

        if outcome.committed >= target {
            return Ok(());
        }
        let message = outcome
            .failure
            .as_ref()
            .map(|(_, message)| message.clone())
            .unwrap_or_default();
        Err(CoreError::Storage(message))
    }

    /// Show a loaded record without writing it.
    pub(crate) fn refresh(&mut self, record: R) {
        self.state.send_replace(EditState::Ready(record));
    }

    /// End the session; later updates are rejected.
    pub(crate) fn close(&mut self, reason: impl Into<String>) {
        self.state.send_replace(EditState::Error(reason.into()));
    }
}

/// Load `id`, retrying `NotFound` with exponential backoff.
///
/// Covers the window between a child record being created and its editor
/// opening. Any other error is returned immediately.
pub async fn load_when_visible<R: Record>(
    store: &dyn RecordStore,
    id: RecordId,
    config: &HydrateConfig,
) -> Result<R, CoreError> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match store::load::<R>(store, id).await {
            Err(err) if err.is_not_found() && attempt < config.attempts => {
                tracing::debug!(
                    kind = %R::KIND,
                    id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Record not visible yet, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, config);
            }
            result => return result,
        }
    }
}
