//! Document CRUD over the `survey_records` table.

use eelgrass_core::store::StoreKind;
use eelgrass_core::types::RecordId;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::record::{IndexColumns, RecordRow};

/// Column list for document reads.
const RECORD_COLUMNS: &str = "id, document";

/// Provides document storage keyed by `(kind, id)`.
pub struct RecordRepo;

impl RecordRepo {
    /// Insert a document under a freshly allocated id.
    pub async fn insert(
        pool: &PgPool,
        kind: StoreKind,
        document: &Value,
    ) -> Result<RecordId, sqlx::Error> {
        let cols = IndexColumns::from_document(kind, document);
        sqlx::query_scalar::<_, RecordId>(
            "INSERT INTO survey_records (kind, station_id, trip_date, document) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(kind.as_str())
        .bind(cols.station_id)
        .bind(cols.trip_date)
        .bind(Json(document))
        .fetch_one(pool)
        .await
    }

    /// Write a document under a caller-chosen id, replacing any row of the
    /// same kind.
    ///
    /// Returns `None` when the id is already taken by a different kind.
    pub async fn upsert(
        pool: &PgPool,
        kind: StoreKind,
        id: RecordId,
        document: &Value,
    ) -> Result<Option<RecordId>, sqlx::Error> {
        let cols = IndexColumns::from_document(kind, document);
        let mut tx = pool.begin().await?;

        let written = sqlx::query_as::<_, (RecordId, bool)>(
            "INSERT INTO survey_records (id, kind, station_id, trip_date, document) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                station_id = EXCLUDED.station_id, \
                trip_date = EXCLUDED.trip_date, \
                document = EXCLUDED.document, \
                updated_at = NOW() \
             WHERE survey_records.kind = EXCLUDED.kind \
             RETURNING id, (xmax = 0) AS inserted",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(cols.station_id)
        .bind(cols.trip_date)
        .bind(Json(document))
        .fetch_optional(&mut *tx)
        .await?;

        // A caller-chosen id must never be handed out again by the sequence.
        if let Some((_, true)) = written {
            sqlx::query(
                "SELECT setval(pg_get_serial_sequence('survey_records', 'id'), \
                 GREATEST((SELECT MAX(id) FROM survey_records), 1))",
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(written.map(|(id, _)| id))
    }

    /// Find a document by kind and id.
    pub async fn find_by_id(
        pool: &PgPool,
        kind: StoreKind,
        id: RecordId,
    ) -> Result<Option<RecordRow>, sqlx::Error> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM survey_records WHERE kind = $1 AND id = $2");
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a document. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, kind: StoreKind, id: RecordId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM survey_records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List the child documents of one station, oldest id first.
    pub async fn list_by_station(
        pool: &PgPool,
        kind: StoreKind,
        station_id: RecordId,
    ) -> Result<Vec<RecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM survey_records \
             WHERE kind = $1 AND station_id = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(kind.as_str())
            .bind(station_id)
            .fetch_all(pool)
            .await
    }
}
