//! Store doubles for exercising latency and failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::autosave::WriteLanes;
use crate::error::CoreError;
use crate::store::{MemoryStore, RecordStore, StoreKind};
use crate::types::RecordId;

/// Delays writes whose document has `notes == slow_notes`.
pub struct SlowStore {
    pub inner: MemoryStore,
    pub slow_notes: &'static str,
    pub delay: Duration,
    lanes: WriteLanes,
}

impl SlowStore {
    pub fn new(slow_notes: &'static str, delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            slow_notes,
            delay,
            lanes: WriteLanes::new(),
        }
    }
}

#[async_trait]
impl RecordStore for SlowStore {
    async fn put(
        &self,
        kind: StoreKind,
        id: Option<RecordId>,
        document: Value,
    ) -> Result<RecordId, CoreError> {
        if document.get("notes").and_then(Value::as_str) == Some(self.slow_notes) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.put(kind, id, document).await
    }

    async fn get(&self, kind: StoreKind, id: RecordId) -> Result<Option<Value>, CoreError> {
        self.inner.get(kind, id).await
    }

    async fn delete(&self, kind: StoreKind, id: RecordId) -> Result<bool, CoreError> {
        self.inner.delete(kind, id).await
    }

    async fn list_by_station(
        &self,
        kind: StoreKind,
        station_id: RecordId,
    ) -> Result<Vec<(RecordId, Value)>, CoreError> {
        self.inner.list_by_station(kind, station_id).await
    }

    fn write_lanes(&self) -> &WriteLanes {
        &self.lanes
    }
}

/// Fails every write while `failing` is set; counts attempted writes.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub failing: AtomicBool,
    pub puts: AtomicUsize,
    lanes: WriteLanes,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn put(
        &self,
        kind: StoreKind,
        id: Option<RecordId>,
        document: Value,
    ) -> Result<RecordId, CoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::Storage("disk unavailable".into()));
        }
        self.inner.put(kind, id, document).await
    }

    async fn get(&self, kind: StoreKind, id: RecordId) -> Result<Option<Value>, CoreError> {
        self.inner.get(kind, id).await
    }

    async fn delete(&self, kind: StoreKind, id: RecordId) -> Result<bool, CoreError> {
        self.inner.delete(kind, id).await
    }

    async fn list_by_station(
        &self,
        kind: StoreKind,
        station_id: RecordId,
    ) -> Result<Vec<(RecordId, Value)>, CoreError> {
        self.inner.list_by_station(kind, station_id).await
    }

    fn write_lanes(&self) -> &WriteLanes {
        &self.lanes
    }
}
