//! In-process record store.
//!
//! Backs the device-side edit session and every test in the workspace.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::autosave::WriteLanes;
use crate::error::CoreError;
use crate::export::{trip_document_date, ExportRange, TripArchive};
use crate::models::Trip;
use crate::store::{check_record_id, RecordStore, StoreKind};
use crate::types::RecordId;

/// Documents keyed by `(kind, id)`; ids are unique across kinds.
pub struct MemoryStore {
    records: RwLock<BTreeMap<(StoreKind, RecordId), Value>>,
    next_id: AtomicI64,
    lanes: WriteLanes,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            lanes: WriteLanes::new(),
        }
    }

    /// Number of documents of `kind` currently stored.
    pub async fn count(&self, kind: StoreKind) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(
        &self,
        kind: StoreKind,
        id: Option<RecordId>,
        document: Value,
    ) -> Result<RecordId, CoreError> {
        if !document.is_object() {
            return Err(CoreError::Validation(format!(
                "{} documents must be JSON objects",
                kind.entity()
            )));
        }
        let id = match id {
            Some(id) => {
                check_record_id(kind, id)?;
                // Keep generated ids ahead of any caller-supplied one.
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        self.records.write().await.insert((kind, id), document);
        tracing::trace!(%kind, id, "Stored record");
        Ok(id)
    }

    async fn get(&self, kind: StoreKind, id: RecordId) -> Result<Option<Value>, CoreError> {
        Ok(self.records.read().await.get(&(kind, id)).cloned())
    }

    async fn delete(&self, kind: StoreKind, id: RecordId) -> Result<bool, CoreError> {
        Ok(self.records.write().await.remove(&(kind, id)).is_some())
    }

    async fn list_by_station(
        &self,
        kind: StoreKind,
        station_id: RecordId,
    ) -> Result<Vec<(RecordId, Value)>, CoreError> {
        if !kind.is_station_child() {
            return Ok(Vec::new());
        }
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|((k, _), doc)| {
                *k == kind && doc.get("stationId").and_then(Value::as_i64) == Some(station_id)
            })
            .map(|((_, id), doc)| (*id, doc.clone()))
            .collect())
    }

    fn write_lanes(&self) -> &WriteLanes {
        &self.lanes
    }
}

#[async_trait]
impl TripArchive for MemoryStore {
    async fn trips_between(&self, range: &ExportRange) -> Result<Vec<Trip>, CoreError> {
        let records = self.records.read().await;
        let mut trips = Vec::new();
        for ((kind, id), doc) in records.iter() {
            if *kind != StoreKind::Trip {
                continue;
            }
            let Some(date) = trip_document_date(doc) else {
                tracing::warn!(id, "Skipping trip without a valid date");
                continue;
            };
            if !range.contains(&date) {
                continue;
            }
            let mut trip: Trip = serde_json::from_value(doc.clone())?;
            trip.id = Some(*id);
            trips.push(trip);
        }
        trips.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(trips)
    }
}
