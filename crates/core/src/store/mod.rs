//! Record store seam.
//!
//! A store keeps whole JSON documents per [`StoreKind`], addressed by a
//! generated [`RecordId`]. The device keeps a local store
//! ([`MemoryStore`] here); the server keeps the synced copy in PostgreSQL
//! (`eelgrass_db::PgRecordStore`). Typed access goes through the
//! [`Record`] trait and the free functions in this module.

pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::autosave::WriteLanes;
use crate::error::CoreError;
use crate::models::{DropFrame, Sample, Station, Trip};
use crate::types::RecordId;

pub use memory::MemoryStore;

/// The object stores a survey database is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKind {
    Trip,
    Station,
    DropFrame,
    Sample,
}

impl StoreKind {
    /// Storage name, also used as the `kind` column on the server.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trip => "trips",
            Self::Station => "stations",
            Self::DropFrame => "drop_frames",
            Self::Sample => "samples",
        }
    }

    /// Entity name used in error messages.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Trip => "Trip",
            Self::Station => "Station",
            Self::DropFrame => "DropFrame",
            Self::Sample => "Sample",
        }
    }

    /// Kinds whose documents carry a `stationId` foreign key.
    pub fn is_station_child(self) -> bool {
        matches!(self, Self::DropFrame | Self::Sample)
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-addressed document storage.
///
/// `put` with `id: None` inserts and returns a freshly generated id; with
/// `Some(id)` it overwrites (or creates) that record, so retrying the same
/// call is harmless.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(
        &self,
        kind: StoreKind,
        id: Option<RecordId>,
        document: Value,
    ) -> Result<RecordId, CoreError>;

    async fn get(&self, kind: StoreKind, id: RecordId) -> Result<Option<Value>, CoreError>;

    /// Returns `false` if nothing was stored under `id`.
    async fn delete(&self, kind: StoreKind, id: RecordId) -> Result<bool, CoreError>;

    /// Child documents of a station, ordered by id. Only meaningful for
    /// kinds where [`StoreKind::is_station_child`] holds.
    async fn list_by_station(
        &self,
        kind: StoreKind,
        station_id: RecordId,
    ) -> Result<Vec<(RecordId, Value)>, CoreError>;

    /// Autosave lanes for this store's records. Every handle onto the same
    /// storage must return the same lanes.
    fn write_lanes(&self) -> &WriteLanes;
}

/// Reject caller-supplied ids a store cannot hold or allocate past.
pub fn check_record_id(kind: StoreKind, id: RecordId) -> Result<(), CoreError> {
    if (1..RecordId::MAX).contains(&id) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{} id must be between 1 and {}, got {id}",
            kind.entity(),
            RecordId::MAX - 1
        )))
    }
}

/// A typed entity that lives in one object store.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: StoreKind;

    fn id(&self) -> Option<RecordId>;

    fn set_id(&mut self, id: RecordId);
}

macro_rules! impl_record {
    ($ty:ty, $kind:expr) => {
        impl Record for $ty {
            const KIND: StoreKind = $kind;

            fn id(&self) -> Option<RecordId> {
                self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = Some(id);
            }
        }
    };
}

impl_record!(Trip, StoreKind::Trip);
impl_record!(Station, StoreKind::Station);
impl_record!(DropFrame, StoreKind::DropFrame);
impl_record!(Sample, StoreKind::Sample);

/// Insert `record` (or overwrite it if it already has an id). Returns the id.
pub async fn insert<R: Record>(store: &dyn RecordStore, record: &R) -> Result<RecordId, CoreError> {
    let document = serde_json::to_value(record)?;
    store.put(R::KIND, record.id(), document).await
}

/// Overwrite an existing record by its id.
pub async fn save<R: Record>(store: &dyn RecordStore, record: &R) -> Result<RecordId, CoreError> {
    let id = record.id().ok_or_else(|| {
        CoreError::Validation(format!("{} has no id; insert it first", R::KIND.entity()))
    })?;
    let document = serde_json::to_value(record)?;
    store.put(R::KIND, Some(id), document).await
}

/// Load a record, mapping a missing document to [`CoreError::NotFound`].
pub async fn load<R: Record>(store: &dyn RecordStore, id: RecordId) -> Result<R, CoreError> {
    let document = store.get(R::KIND, id).await?.ok_or(CoreError::NotFound {
        entity: R::KIND.entity(),
        id,
    })?;
    decode(id, document)
}

/// All child records of `R`'s kind that belong to `station_id`.
pub async fn children<R: Record>(
    store: &dyn RecordStore,
    station_id: RecordId,
) -> Result<Vec<R>, CoreError> {
    store
        .list_by_station(R::KIND, station_id)
        .await?
        .into_iter()
        .map(|(id, document)| decode(id, document))
        .collect()
}

/// Delete a record, mapping a missing document to [`CoreError::NotFound`].
pub async fn remove<R: Record>(store: &dyn RecordStore, id: RecordId) -> Result<(), CoreError> {
    if store.delete(R::KIND, id).await? {
        Ok(())
    } else {
        Err(CoreError::NotFound {
            entity: R::KIND.entity(),
            id,
        })
    }
}

fn decode<R: Record>(id: RecordId, document: Value) -> Result<R, CoreError> {
    let mut record: R = serde_json::from_value(document)?;
    record.set_id(id);
    Ok(record)
}
