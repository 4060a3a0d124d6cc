use axum::routing::get;
use axum::Router;

use crate::handlers::download;
use crate::state::AppState;

/// Mount the export route. Methods other than GET get a JSON 405.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/download",
        get(download::download_trips).fallback(download::method_not_allowed),
    )
}
