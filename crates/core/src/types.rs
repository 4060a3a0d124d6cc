/// Record ids are generated by the store (PostgreSQL BIGSERIAL on the server,
/// a monotonic counter in the device store).
pub type RecordId = i64;

/// All exported timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
