//! Eelgrass survey core.
//!
//! Record shapes, completeness checks and the autosave edit session for the
//! trip → station → drop frame / sample hierarchy. No HTTP and no database
//! driver here; stores plug in through [`store::RecordStore`].

pub mod autosave;
pub mod editor;
pub mod error;
pub mod export;
pub mod models;
pub mod navigation;
pub mod station_editor;
pub mod store;
pub mod types;
pub mod validation;
