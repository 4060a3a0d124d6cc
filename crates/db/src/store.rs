//! [`RecordStore`] and [`TripArchive`] backed by PostgreSQL.

use async_trait::async_trait;
use eelgrass_core::autosave::WriteLanes;
use eelgrass_core::error::CoreError;
use eelgrass_core::export::{ExportRange, TripArchive};
use eelgrass_core::models::Trip;
use eelgrass_core::store::{check_record_id, Record, RecordStore, StoreKind};
use eelgrass_core::types::RecordId;
use serde_json::Value;

use crate::repositories::{RecordRepo, TripRepo};
use crate::DbPool;

/// Stores every record kind as JSONB rows in `survey_records`.
///
/// Clones share the pool and the autosave lanes.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: DbPool,
    lanes: WriteLanes,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            lanes: WriteLanes::new(),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn storage_error(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Record store query failed");
    CoreError::Storage(err.to_string())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn put(
        &self,
        kind: StoreKind,
        id: Option<RecordId>,
        document: Value,
    ) -> Result<RecordId, CoreError> {
        if !document.is_object() {
            return Err(CoreError::Validation(format!(
                "{} document must be a JSON object",
                kind.entity()
            )));
        }
        match id {
            None => RecordRepo::insert(&self.pool, kind, &document)
                .await
                .map_err(storage_error),
            Some(id) => {
                check_record_id(kind, id)?;
                RecordRepo::upsert(&self.pool, kind, id, &document)
                    .await
                    .map_err(storage_error)?
                    .ok_or_else(|| {
                        CoreError::Conflict(format!(
                            "Record id {id} already belongs to another kind"
                        ))
                    })
            }
        }
    }

    async fn get(&self, kind: StoreKind, id: RecordId) -> Result<Option<Value>, CoreError> {
        let row = RecordRepo::find_by_id(&self.pool, kind, id)
            .await
            .map_err(storage_error)?;
        Ok(row.map(|row| row.document.0))
    }

    async fn delete(&self, kind: StoreKind, id: RecordId) -> Result<bool, CoreError> {
        RecordRepo::delete(&self.pool, kind, id)
            .await
            .map_err(storage_error)
    }

    async fn list_by_station(
        &self,
        kind: StoreKind,
        station_id: RecordId,
    ) -> Result<Vec<(RecordId, Value)>, CoreError> {
        let rows = RecordRepo::list_by_station(&self.pool, kind, station_id)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(|row| (row.id, row.document.0)).collect())
    }

    fn write_lanes(&self) -> &WriteLanes {
        &self.lanes
    }
}

#[async_trait]
impl TripArchive for PgRecordStore {
    async fn trips_between(&self, range: &ExportRange) -> Result<Vec<Trip>, CoreError> {
        let rows = TripRepo::list_between(&self.pool, range.after, range.before)
            .await
            .map_err(storage_error)?;
        rows.into_iter()
            .map(|row| {
                let mut trip: Trip = serde_json::from_value(row.document.0)?;
                trip.set_id(row.id);
                Ok(trip)
            })
            .collect()
    }
}
