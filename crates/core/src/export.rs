//! Date-range export of synced trips.
//!
//! The HTTP surface lives in `eelgrass-api`; this module owns the bound
//! parsing and the [`TripArchive`] seam it reads through.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::CoreError;
use crate::models::Trip;
use crate::types::Timestamp;

/// Inclusive `[after, before]` window over `Trip::date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRange {
    pub after: Timestamp,
    pub before: Timestamp,
}

impl ExportRange {
    /// Parse the `after` / `before` query bounds.
    ///
    /// Each bound is either an RFC 3339 timestamp or a plain `YYYY-MM-DD`
    /// date. A plain-date `before` covers the whole of that day, so
    /// `after=2024-05-01&before=2024-05-31` selects all of May.
    pub fn parse(after: &str, before: &str) -> Result<Self, CoreError> {
        let after = parse_bound("after", after, Bound::Start)?;
        let before = parse_bound("before", before, Bound::End)?;
        if after > before {
            return Err(CoreError::Validation(format!(
                "'after' ({}) must not be later than 'before' ({})",
                after.to_rfc3339(),
                before.to_rfc3339()
            )));
        }
        Ok(Self { after, before })
    }

    pub fn contains(&self, date: &Timestamp) -> bool {
        self.after <= *date && *date <= self.before
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn parse_bound(name: &str, raw: &str, bound: Bound) -> Result<Timestamp, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::Validation(format!("'{name}' is required")));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!(
            "'{name}' must be an ISO-8601 date or timestamp, got '{raw}'"
        ))
    })?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| CoreError::Internal("invalid end-of-day time".into()))?,
    };
    Ok(date.and_time(time).and_utc())
}

/// The `date` of a stored trip document, if it holds a valid timestamp.
///
/// Trips without one cannot be placed in any range and are left out of
/// every export.
pub fn trip_document_date(document: &serde_json::Value) -> Option<Timestamp> {
    document
        .get("date")
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Read access to the synced trip collection.
#[async_trait]
pub trait TripArchive: Send + Sync {
    /// Trips whose date falls inside `range`, newest first.
    async fn trips_between(&self, range: &ExportRange) -> Result<Vec<Trip>, CoreError>;
}
