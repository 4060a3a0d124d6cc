//! Survey record shapes.
//!
//! Documents are stored as camelCase JSON so they stay compatible with the
//! records the mobile client writes. Numeric form inputs arrive as numbers,
//! numeric strings or empty strings; see [`field`] for how blanks map to
//! `None`.

pub mod field;
pub mod frame;
pub mod sample;
pub mod secchi;
pub mod station;
pub mod trip;

pub use frame::{DropFrame, DropFrames, MAX_DROP_FRAMES};
pub use sample::{Sample, Shoot, SHOOTS_PER_SAMPLE};
pub use secchi::{Secchi, SecchiDrop};
pub use station::{Location, Station, StationSection, StationUi, Weather};
pub use trip::Trip;
