//! Repository structs, one per concern over `survey_records`.

pub mod record_repo;
pub mod trip_repo;

pub use record_repo::RecordRepo;
pub use trip_repo::TripRepo;
