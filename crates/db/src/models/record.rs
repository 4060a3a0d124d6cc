//! Row shapes for the `survey_records` table.

use eelgrass_core::export::trip_document_date;
use eelgrass_core::store::StoreKind;
use eelgrass_core::types::{RecordId, Timestamp};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// A document row as read back for the record store.
#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: RecordId,
    pub document: Json<Value>,
}

/// Columns derived from a document so they can be indexed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexColumns {
    pub station_id: Option<RecordId>,
    pub trip_date: Option<Timestamp>,
}

impl IndexColumns {
    /// Pull `stationId` from drop frames and samples, `date` from trips.
    ///
    /// Station documents also carry a `stationId`, but there it is a field
    /// label, so it is never indexed.
    pub fn from_document(kind: StoreKind, document: &Value) -> Self {
        let station_id = if kind.is_station_child() {
            document.get("stationId").and_then(Value::as_i64)
        } else {
            None
        };
        let trip_date = if kind == StoreKind::Trip {
            trip_document_date(document)
        } else {
            None
        };
        Self {
            station_id,
            trip_date,
        }
    }
}
