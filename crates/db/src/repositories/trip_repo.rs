//! Trip queries used by the export endpoint.

use eelgrass_core::store::StoreKind;
use eelgrass_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::record::RecordRow;

pub struct TripRepo;

impl TripRepo {
    /// Trips dated within `[after, before]`, newest first.
    pub async fn list_between(
        pool: &PgPool,
        after: Timestamp,
        before: Timestamp,
    ) -> Result<Vec<RecordRow>, sqlx::Error> {
        sqlx::query_as::<_, RecordRow>(
            "SELECT id, document FROM survey_records \
             WHERE kind = $1 AND trip_date >= $2 AND trip_date <= $3 \
             ORDER BY trip_date DESC, id DESC",
        )
        .bind(StoreKind::Trip.as_str())
        .bind(after)
        .bind(before)
        .fetch_all(pool)
        .await
    }
}
