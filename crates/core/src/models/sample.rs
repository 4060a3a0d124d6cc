//! Indicator samples and their shoot measurements.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::field::blank_as_none;
use crate::types::{RecordId, Timestamp};

/// Every indicator sample measures exactly this many shoots.
pub const SHOOTS_PER_SAMPLE: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub disease_coverage: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub epiphyte_coverage: Option<f64>,
}

/// A vegetation sample taken at an indicator station.
///
/// `shoots` is a fixed-size array: a document with any other number of
/// shoots fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub station_id: RecordId,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub picture: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub picture_taken_at: Option<Timestamp>,
    pub shoots: [Shoot; SHOOTS_PER_SAMPLE],
    #[serde(default)]
    pub notes: String,
}

impl Sample {
    /// The default shape inserted when a sample is created: three blank shoots.
    pub fn new(station_id: RecordId) -> Self {
        Self {
            id: None,
            station_id,
            units: String::new(),
            picture: false,
            picture_taken_at: None,
            shoots: Default::default(),
            notes: String::new(),
        }
    }

    /// Replace the shoot at `index` (0-based).
    pub fn replace_shoot(&mut self, index: usize, shoot: Shoot) -> Result<(), CoreError> {
        let slot = self.shoots.get_mut(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Shoot index {index} out of range (samples have {SHOOTS_PER_SAMPLE} shoots)"
            ))
        })?;
        *slot = shoot;
        Ok(())
    }
}
