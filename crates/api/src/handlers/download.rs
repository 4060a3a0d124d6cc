//! Handlers for the trip export endpoint.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use eelgrass_core::export::ExportRange;
use eelgrass_core::models::Trip;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters for `GET /api/download`.
///
/// Both bounds are kept as raw strings so a missing or malformed value is
/// reported with our own error body instead of the extractor's. A query
/// string that does not decode at all (a repeated key, say) is a 400
/// `BAD_REQUEST`.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub after: Option<String>,
    pub before: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /download
// ---------------------------------------------------------------------------

/// Return every trip dated within `[after, before]`, newest first.
pub async fn download_trips(
    State(state): State<AppState>,
    query: Result<Query<DownloadParams>, QueryRejection>,
) -> AppResult<Json<Vec<Trip>>> {
    let Query(params) =
        query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let range = ExportRange::parse(
        params.after.as_deref().unwrap_or_default(),
        params.before.as_deref().unwrap_or_default(),
    )?;

    let trips = state.archive.trips_between(&range).await?;
    tracing::info!(
        after = %range.after,
        before = %range.before,
        count = trips.len(),
        "Exported trips"
    );
    Ok(Json(trips))
}

/// Any other method on the export endpoint.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed { allowed: "GET" }
}
