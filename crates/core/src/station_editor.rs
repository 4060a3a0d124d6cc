//! Station page session: autosave plus child creation and deletion.
//!
//! New drop frames and samples are inserted into their own stores and the
//! caller is handed a [`Route`] to the editor for the new record. That editor
//! hydrates through [`load_when_visible`](crate::editor::load_when_visible),
//! so it does not depend on the insert having been observed yet.

use std::sync::Arc;

use chrono::{Local, NaiveTime};

use crate::editor::{EditState, HydrateConfig, RecordEditor, SaveStatus};
use crate::error::CoreError;
use crate::models::{
    DropFrame, DropFrames, Sample, Secchi, Shoot, Station, StationSection, MAX_DROP_FRAMES,
};
use crate::navigation::Route;
use crate::store::{self, Record, RecordStore};
use crate::types::RecordId;
use crate::validation::{self, EelgrassRule, SampleProgress, StationProgress};

pub const DELETE_STATION_PROMPT: &str = "Are you sure you want to delete this station?";

pub struct StationEditor {
    editor: RecordEditor<Station>,
    rule: Arc<dyn EelgrassRule>,
}

impl StationEditor {
    pub fn new(store: Arc<dyn RecordStore>, id: RecordId, rule: Arc<dyn EelgrassRule>) -> Self {
        Self {
            editor: RecordEditor::new(store, id),
            rule,
        }
    }

    /// Load the station with its current drop frames and samples.
    ///
    /// A Secchi reading without a time gets the current local time, which
    /// is saved straight away.
    pub async fn hydrate(&mut self, config: &HydrateConfig) -> Result<Station, CoreError> {
        let store = Arc::clone(self.editor.store());
        self.editor
            .hydrate_with(config, |station| async move {
                with_children(store.as_ref(), station).await
            })
            .await?;
        self.ensure_secchi_time(Local::now().time())?;
        self.loaded()
    }

    pub fn id(&self) -> RecordId {
        self.editor.id()
    }

    pub fn state(&self) -> EditState<Station> {
        self.editor.state()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<EditState<Station>> {
        self.editor.subscribe()
    }

    pub fn station(&self) -> Option<Station> {
        self.editor.record()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.editor.save_status()
    }

    pub async fn flush(&self) -> Result<(), CoreError> {
        self.editor.flush().await
    }

    pub fn retry(&mut self) -> Result<Option<u64>, CoreError> {
        self.editor.retry()
    }

    pub fn update(&mut self, station: Station) -> Result<u64, CoreError> {
        self.editor.update(station)
    }

    pub fn edit(&mut self, change: impl FnOnce(&mut Station)) -> Result<u64, CoreError> {
        self.editor.edit(change)
    }

    pub fn set_secchi(&mut self, secchi: Secchi) -> Result<u64, CoreError> {
        self.editor.edit(|station| station.secchi = secchi)
    }

    /// Open or close one section of the page. Saved like any other edit.
    pub fn toggle_section(&mut self, section: StationSection) -> Result<u64, CoreError> {
        self.editor
            .edit(|station| station.ui = station.ui.toggled(section))
    }

    pub fn progress(&self) -> Option<StationProgress> {
        self.station()
            .map(|station| validation::station_progress(&station, self.rule.as_ref()))
    }

    pub fn sample_progress(&self) -> Option<SampleProgress> {
        self.station()
            .map(|station| validation::sample_progress(&station, self.rule.as_ref()))
    }

    pub fn can_create_frame(&self) -> bool {
        self.station()
            .is_some_and(|station| validation::can_create_frame(&station))
    }

    pub fn can_create_sample(&self) -> bool {
        self.station().is_some_and(|station| {
            station.is_indicator_station
                && validation::can_create_sample(&station, self.rule.as_ref())
        })
    }

    /// Insert a blank drop frame and return the route to its editor.
    pub async fn create_drop_frame(&mut self) -> Result<Route, CoreError> {
        let mut station = self.loaded()?;
        if !validation::can_create_frame(&station) {
            return Err(CoreError::Conflict(format!(
                "Station already has {MAX_DROP_FRAMES} drop frames"
            )));
        }

        let station_id = self.id();
        let mut frame = DropFrame::new(station_id);
        let id = store::insert(self.editor.store().as_ref(), &frame).await?;
        frame.set_id(id);

        let index = station.frames.len();
        station.frames.try_push(frame)?;
        self.editor.refresh(station);

        tracing::info!(station_id, frame_id = id, index, "Created drop frame");
        Ok(Route::DropFrame { id, index })
    }

    /// Insert a sample with three blank shoots and return the route to its editor.
    ///
    /// Only indicator stations take samples, one per frame that showed eelgrass.
    pub async fn create_sample(&mut self) -> Result<Route, CoreError> {
        let mut station = self.loaded()?;
        if !station.is_indicator_station {
            return Err(CoreError::Conflict(
                "Samples are only taken at indicator stations".into(),
            ));
        }
        let progress = validation::sample_progress(&station, self.rule.as_ref());
        if !progress.can_create() {
            return Err(CoreError::Conflict(format!(
                "Station already has {} samples for {} frames with eelgrass",
                progress.total, progress.eligible_frames
            )));
        }

        let station_id = self.id();
        let mut sample = Sample::new(station_id);
        let id = store::insert(self.editor.store().as_ref(), &sample).await?;
        sample.set_id(id);

        station.samples.push(sample);
        self.editor.refresh(station);

        tracing::info!(station_id, sample_id = id, "Created indicator sample");
        Ok(Route::Sample { id })
    }

    /// Start deleting this station. Nothing is removed until the returned
    /// gate is confirmed.
    pub fn delete_station(&mut self) -> Result<PendingDeletion<'_>, CoreError> {
        let trip_id = self.loaded()?.trip_id;
        Ok(PendingDeletion {
            page: self,
            trip_id,
        })
    }

    /// Wait for outstanding saves, then route back to the trip.
    pub async fn save_and_return(&self) -> Result<Route, CoreError> {
        let trip_id = self.loaded()?.trip_id;
        self.editor.flush().await?;
        Ok(Route::Trip { id: trip_id })
    }

    fn ensure_secchi_time(&mut self, now: NaiveTime) -> Result<(), CoreError> {
        let mut station = self.loaded()?;
        if station.secchi.ensure_time(now) {
            tracing::debug!(station_id = self.id(), "Defaulted Secchi time");
            self.editor.update(station)?;
        }
        Ok(())
    }

    fn loaded(&self) -> Result<Station, CoreError> {
        self.editor.record().ok_or_else(|| {
            CoreError::Conflict(format!("Station {} is not loaded", self.editor.id()))
        })
    }
}

/// Confirmation gate for [`StationEditor::delete_station`].
#[must_use = "the station is only deleted once the deletion is confirmed"]
pub struct PendingDeletion<'a> {
    page: &'a mut StationEditor,
    trip_id: RecordId,
}

impl PendingDeletion<'_> {
    pub fn prompt(&self) -> &'static str {
        DELETE_STATION_PROMPT
    }

    /// Delete the station record and route back to its trip.
    ///
    /// Drop frames and samples that reference the station are left in their
    /// stores.
    pub async fn confirm(self) -> Result<Route, CoreError> {
        let station_id = self.page.id();

        // A save still in flight would recreate the record after the delete.
        if let Err(err) = self.page.editor.flush().await {
            tracing::warn!(station_id, error = %err, "Deleting station with unsaved edits");
        }
        store::remove::<Station>(self.page.editor.store().as_ref(), station_id).await?;
        self.page.editor.close(format!("Station {station_id} was deleted"));

        tracing::info!(station_id, trip_id = self.trip_id, "Deleted station");
        Ok(Route::Trip { id: self.trip_id })
    }

    pub fn cancel(self) {
        tracing::debug!(station_id = self.page.id(), "Station deletion cancelled");
    }
}

impl RecordEditor<Sample> {
    /// Replace one of the sample's three shoots.
    pub fn set_shoot(&mut self, index: usize, shoot: Shoot) -> Result<u64, CoreError> {
        let mut sample = self.record().ok_or_else(|| {
            CoreError::Conflict(format!("Sample {} is not loaded", self.id()))
        })?;
        sample.replace_shoot(index, shoot)?;
        self.update(sample)
    }
}

async fn with_children(store: &dyn RecordStore, mut station: Station) -> Result<Station, CoreError> {
    let Some(station_id) = station.id else {
        return Ok(station);
    };
    station.frames = DropFrames::from_loaded(store::children::<DropFrame>(store, station_id).await?);
    station.samples = store::children::<Sample>(store, station_id).await?;
    Ok(station)
}
