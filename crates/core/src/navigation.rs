//! Redirect instructions handed to the routing layer.

use serde::Serialize;

use crate::types::RecordId;

/// Where the client should go next. Carries identifiers only; the target
/// editor loads the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Home,
    Trip { id: RecordId },
    Station { id: RecordId },
    /// `index` is the frame's position within its station.
    DropFrame { id: RecordId, index: usize },
    Sample { id: RecordId },
}

impl Route {
    /// Client URL for this route.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Trip { id } => format!("/trips?id={id}"),
            Route::Station { id } => format!("/trips/stations?id={id}"),
            Route::DropFrame { id, index } => format!("/trips/stations/frames?id={id}&i={index}"),
            Route::Sample { id } => format!("/trips/stations/samples?id={id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Trip { id: 3 }.path(), "/trips?id=3");
        assert_eq!(
            Route::DropFrame { id: 9, index: 2 }.path(),
            "/trips/stations/frames?id=9&i=2"
        );
        assert_eq!(Route::Sample { id: 4 }.path(), "/trips/stations/samples?id=4");
    }

    #[test]
    fn test_serializes_with_route_tag() {
        let json = serde_json::to_value(Route::DropFrame { id: 9, index: 0 }).unwrap();
        assert_eq!(json, serde_json::json!({ "route": "drop_frame", "id": 9, "index": 0 }));
    }
}
