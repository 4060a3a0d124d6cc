//! Drop-frame (quadrat) observations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::field::blank_as_none;
use crate::types::{RecordId, Timestamp};

/// A station holds at most this many drop frames.
pub const MAX_DROP_FRAMES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub station_id: RecordId,
    #[serde(default)]
    pub picture: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub picture_taken_at: Option<Timestamp>,
    /// Sediment types observed in the frame, keyed by sediment name.
    #[serde(default)]
    pub sediments: BTreeMap<String, bool>,
    #[serde(default)]
    pub coverage: String,
    #[serde(default)]
    pub notes: String,
}

impl DropFrame {
    /// The default shape inserted when a frame is created.
    pub fn new(station_id: RecordId) -> Self {
        Self {
            id: None,
            station_id,
            picture: false,
            picture_taken_at: None,
            sediments: BTreeMap::new(),
            coverage: String::new(),
            notes: String::new(),
        }
    }
}

/// The frames embedded in a station, capped at [`MAX_DROP_FRAMES`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DropFrame>", into = "Vec<DropFrame>")]
pub struct DropFrames(Vec<DropFrame>);

impl DropFrames {
    /// Build from child records loaded from the store.
    ///
    /// Anything past [`MAX_DROP_FRAMES`] is dropped with a warning; the
    /// store itself does not enforce the cap.
    pub fn from_loaded(mut frames: Vec<DropFrame>) -> Self {
        if frames.len() > MAX_DROP_FRAMES {
            tracing::warn!(
                count = frames.len(),
                max = MAX_DROP_FRAMES,
                "Station has more drop frames than allowed, ignoring extras"
            );
            frames.truncate(MAX_DROP_FRAMES);
        }
        Self(frames)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_DROP_FRAMES
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DropFrame> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&DropFrame> {
        self.0.get(index)
    }

    pub fn try_push(&mut self, frame: DropFrame) -> Result<(), CoreError> {
        if self.is_full() {
            return Err(CoreError::Conflict(format!(
                "Station already has {MAX_DROP_FRAMES} drop frames"
            )));
        }
        self.0.push(frame);
        Ok(())
    }

    pub fn replace(&mut self, index: usize, frame: DropFrame) -> Result<(), CoreError> {
        let count = self.0.len();
        let slot = self.0.get_mut(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Drop frame index {index} out of range (station has {count} frames)"
            ))
        })?;
        *slot = frame;
        Ok(())
    }
}

impl TryFrom<Vec<DropFrame>> for DropFrames {
    type Error = CoreError;

    fn try_from(frames: Vec<DropFrame>) -> Result<Self, Self::Error> {
        if frames.len() > MAX_DROP_FRAMES {
            return Err(CoreError::Validation(format!(
                "A station holds at most {MAX_DROP_FRAMES} drop frames, got {}",
                frames.len()
            )));
        }
        Ok(Self(frames))
    }
}

impl From<DropFrames> for Vec<DropFrame> {
    fn from(frames: DropFrames) -> Self {
        frames.0
    }
}

impl<'a> IntoIterator for &'a DropFrames {
    type Item = &'a DropFrame;
    type IntoIter = std::slice::Iter<'a, DropFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
