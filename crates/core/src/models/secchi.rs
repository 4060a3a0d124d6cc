//! Secchi (water clarity) reading embedded in a station.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::field::{blank_as_none, optional_time};

/// One lowering of the Secchi disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecchiDrop {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub depth: Option<f64>,
    #[serde(default)]
    pub hit_bottom: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secchi {
    /// Water depth at the station.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub depth: Option<f64>,
    #[serde(default, with = "optional_time")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub drops: Vec<SecchiDrop>,
    #[serde(default)]
    pub notes: String,
}

impl Secchi {
    /// An empty reading with `count` blank drops.
    pub fn with_drops(count: usize) -> Self {
        Self {
            drops: vec![SecchiDrop::default(); count],
            ..Self::default()
        }
    }

    /// Replace the drop at `index`, leaving the others untouched.
    pub fn replace_drop(&mut self, index: usize, drop: SecchiDrop) -> Result<(), CoreError> {
        let count = self.drops.len();
        let slot = self.drops.get_mut(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Secchi drop index {index} out of range (reading has {count} drops)"
            ))
        })?;
        *slot = drop;
        Ok(())
    }

    /// Fill in `time` if the reading has none yet. Returns `true` if it changed.
    pub fn ensure_time(&mut self, now: NaiveTime) -> bool {
        if self.time.is_some() {
            return false;
        }
        // Minute precision, as entered on the form.
        self.time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0);
        true
    }
}
