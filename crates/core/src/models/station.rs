//! Station record and its embedded sections.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::field::blank_as_none;
use crate::models::frame::DropFrames;
use crate::models::sample::Sample;
use crate::models::secchi::Secchi;
use crate::types::RecordId;

/// GPS fix for a station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default, deserialize_with = "blank_as_none")]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default, deserialize_with = "blank_as_none")]
    pub longitude: Option<f64>,
    /// Reported fix accuracy in meters.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub accuracy: Option<f64>,
}

/// Conditions recorded at the station. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    #[serde(default)]
    pub cloud_cover: String,
    #[serde(default)]
    pub wind_speed: String,
    #[serde(default)]
    pub wind_direction: String,
    #[serde(default)]
    pub tide: String,
}

/// Which collapsible sections of the station page are open.
///
/// View state only. It is persisted with the station so the page reopens
/// the same way, but no completeness check ever reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationUi {
    #[serde(default)]
    pub info: bool,
    #[serde(default)]
    pub location: bool,
    #[serde(default)]
    pub weather: bool,
    #[serde(default)]
    pub secchi: bool,
    #[serde(default)]
    pub frames: bool,
    #[serde(default)]
    pub sample: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationSection {
    Info,
    Location,
    Weather,
    Secchi,
    Frames,
    Sample,
}

impl StationUi {
    pub fn is_open(&self, section: StationSection) -> bool {
        *self.flag(section)
    }

    /// Flip one section, returning the new state.
    pub fn toggled(mut self, section: StationSection) -> Self {
        let flag = self.flag_mut(section);
        *flag = !*flag;
        self
    }

    fn flag(&self, section: StationSection) -> &bool {
        match section {
            StationSection::Info => &self.info,
            StationSection::Location => &self.location,
            StationSection::Weather => &self.weather,
            StationSection::Secchi => &self.secchi,
            StationSection::Frames => &self.frames,
            StationSection::Sample => &self.sample,
        }
    }

    fn flag_mut(&mut self, section: StationSection) -> &mut bool {
        match section {
            StationSection::Info => &mut self.info,
            StationSection::Location => &mut self.location,
            StationSection::Weather => &mut self.weather,
            StationSection::Secchi => &mut self.secchi,
            StationSection::Frames => &mut self.frames,
            StationSection::Sample => &mut self.sample,
        }
    }
}

/// One surveyed location within a trip.
///
/// `frames` and `samples` are a snapshot of the child records, refreshed
/// from their own stores whenever the station is opened for editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub trip_id: RecordId,
    /// Field label for the station (e.g. "B-12"), not a record id.
    #[serde(default)]
    pub station_id: String,
    #[serde(default)]
    pub is_indicator_station: bool,
    #[serde(default)]
    pub harbor: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub secchi: Secchi,
    #[serde(default)]
    pub frames: DropFrames,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(rename = "$ui", default)]
    pub ui: StationUi,
}

impl Station {
    /// A blank station for `trip_id` with a single Secchi drop.
    pub fn new(trip_id: RecordId, label: impl Into<String>) -> Self {
        Self {
            id: None,
            trip_id,
            station_id: label.into(),
            is_indicator_station: false,
            harbor: String::new(),
            notes: String::new(),
            location: Location::default(),
            weather: Weather::default(),
            secchi: Secchi::with_drops(1),
            frames: DropFrames::default(),
            samples: Vec::new(),
            ui: StationUi::default(),
        }
    }
}
