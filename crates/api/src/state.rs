use std::sync::Arc;

use eelgrass_core::export::TripArchive;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Where exported trips are read from.
    pub archive: Arc<dyn TripArchive>,
    /// Database pool, absent when the server runs against an in-memory archive.
    pub pool: Option<eelgrass_db::DbPool>,
}
