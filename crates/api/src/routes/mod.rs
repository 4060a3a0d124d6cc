pub mod download;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /download?after=..&before=..     trips in range, newest first (GET only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(download::router())
}
