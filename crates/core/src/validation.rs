//! Completeness predicates, pure logic, no store access.
//!
//! Incomplete records are an ordinary state, so everything here returns
//! plain booleans or counts and never fails. Callers re-derive on every
//! render; nothing is cached.

use serde::Serialize;
use validator::Validate;

use crate::models::{DropFrame, Location, Sample, Secchi, Shoot, Station, MAX_DROP_FRAMES};

/// Decides whether a drop frame's observations show eelgrass.
///
/// The field-level rule belongs to the survey protocol, so it is injected
/// by the caller. Any `Fn(&DropFrame) -> bool` qualifies.
pub trait EelgrassRule: Send + Sync {
    fn has_eelgrass(&self, frame: &DropFrame) -> bool;
}

impl<F> EelgrassRule for F
where
    F: Fn(&DropFrame) -> bool + Send + Sync,
{
    fn has_eelgrass(&self, frame: &DropFrame) -> bool {
        self(frame)
    }
}

pub fn valid_indicator_shoot(shoot: &Shoot) -> bool {
    shoot.length.is_some()
        && shoot.width.is_some()
        && shoot.disease_coverage.is_some()
        && shoot.epiphyte_coverage.is_some()
}

/// One `"Shoot N incomplete"` message per failing shoot, N counted from 1.
pub fn incomplete_shoot_summary(sample: &Sample) -> Vec<String> {
    sample
        .shoots
        .iter()
        .enumerate()
        .filter(|(_, shoot)| !valid_indicator_shoot(shoot))
        .map(|(i, _)| format!("Shoot {} incomplete", i + 1))
        .collect()
}

/// All shoots measured. The picture is tracked separately, see
/// [`sample_picture_recorded`].
pub fn valid_sample(sample: &Sample) -> bool {
    sample.shoots.iter().all(valid_indicator_shoot)
}

pub fn sample_picture_recorded(sample: &Sample) -> bool {
    sample.picture && sample.picture_taken_at.is_some()
}

pub fn frame_picture_recorded(frame: &DropFrame) -> bool {
    frame.picture && frame.picture_taken_at.is_some()
}

/// Depth and time set and every drop has a depth. `hit_bottom` is a plain
/// flag and never affects the result.
pub fn valid_secchi(secchi: &Secchi) -> bool {
    secchi.depth.is_some()
        && secchi.time.is_some()
        && secchi.drops.iter().all(|drop| drop.depth.is_some())
}

/// Both coordinates present and within range.
pub fn valid_location(location: &Location) -> bool {
    location.latitude.is_some() && location.longitude.is_some() && location.validate().is_ok()
}

/// Samples taken versus samples allowed at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleProgress {
    /// Samples whose shoots are all measured.
    pub valid: usize,
    /// Samples taken.
    pub total: usize,
    /// Frames that showed eelgrass; one sample is allowed per such frame.
    pub eligible_frames: usize,
}

impl SampleProgress {
    /// Section heading, e.g. `"Indicator Sample 2/3"`.
    pub fn label(&self) -> String {
        format!("Indicator Sample {}/{}", self.total, self.eligible_frames)
    }

    pub fn complete(&self) -> bool {
        self.valid == self.total
    }

    pub fn can_create(&self) -> bool {
        self.total < self.eligible_frames
    }
}

pub fn eligible_frames<'a>(
    frames: impl IntoIterator<Item = &'a DropFrame>,
    rule: &dyn EelgrassRule,
) -> usize {
    frames
        .into_iter()
        .filter(|frame| rule.has_eelgrass(frame))
        .count()
}

pub fn sample_progress(station: &Station, rule: &dyn EelgrassRule) -> SampleProgress {
    SampleProgress {
        valid: station.samples.iter().filter(|s| valid_sample(s)).count(),
        total: station.samples.len(),
        eligible_frames: eligible_frames(&station.frames, rule),
    }
}

pub fn can_create_frame(station: &Station) -> bool {
    station.frames.len() < MAX_DROP_FRAMES
}

pub fn can_create_sample(station: &Station, rule: &dyn EelgrassRule) -> bool {
    sample_progress(station, rule).can_create()
}

/// Per-section completeness for the station page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationProgress {
    pub location: bool,
    pub secchi: bool,
    pub frames: usize,
    /// `None` unless this is an indicator station.
    pub samples: Option<SampleProgress>,
}

impl StationProgress {
    pub fn complete(&self) -> bool {
        self.location && self.secchi && self.samples.map_or(true, |s| s.complete())
    }
}

pub fn station_progress(station: &Station, rule: &dyn EelgrassRule) -> StationProgress {
    StationProgress {
        location: valid_location(&station.location),
        secchi: valid_secchi(&station.secchi),
        frames: station.frames.len(),
        samples: station
            .is_indicator_station
            .then(|| sample_progress(station, rule)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};

    use super::*;
    use crate::models::{DropFrames, SecchiDrop, StationSection};

    fn full_shoot() -> Shoot {
        Shoot {
            length: Some(42.0),
            width: Some(0.4),
            disease_coverage: Some(0.0),
            epiphyte_coverage: Some(10.0),
        }
    }

    fn complete_sample() -> Sample {
        let mut sample = Sample::new(1);
        sample.shoots = [full_shoot(), full_shoot(), full_shoot()];
        sample
    }

    fn frame_with(coverage: &str) -> DropFrame {
        let mut frame = DropFrame::new(1);
        frame.coverage = coverage.to_string();
        frame
    }

    /// Test rule: any recorded coverage other than "0" counts as eelgrass.
    fn coverage_rule(frame: &DropFrame) -> bool {
        !frame.coverage.is_empty() && frame.coverage != "0"
    }

    #[test]
    fn test_shoot_missing_any_field_is_invalid() {
        assert!(valid_indicator_shoot(&full_shoot()));

        let blanks: [fn(&mut Shoot); 4] = [
            |s| s.length = None,
            |s| s.width = None,
            |s| s.disease_coverage = None,
            |s| s.epiphyte_coverage = None,
        ];
        for blank in blanks {
            let mut shoot = full_shoot();
            blank(&mut shoot);
            assert!(!valid_indicator_shoot(&shoot));
        }
        assert!(!valid_indicator_shoot(&Shoot::default()));
    }

    #[test]
    fn test_zero_counts_as_present() {
        let shoot = Shoot {
            disease_coverage: Some(0.0),
            epiphyte_coverage: Some(0.0),
            ..full_shoot()
        };
        assert!(valid_indicator_shoot(&shoot));
    }

    #[test]
    fn test_sample_valid_iff_all_shoots_valid() {
        assert!(valid_sample(&complete_sample()));
        assert!(!valid_sample(&Sample::new(1)));

        for i in 0..3 {
            let mut sample = complete_sample();
            sample.shoots[i].width = None;
            assert!(!valid_sample(&sample));
        }
    }

    #[test]
    fn test_filling_fields_flips_validity_monotonically() {
        let mut sample = Sample::new(1);
        let mut seen_valid = false;
        for i in 0..3 {
            for field in 0..4 {
                let shoot = &mut sample.shoots[i];
                match field {
                    0 => shoot.length = Some(1.0),
                    1 => shoot.width = Some(1.0),
                    2 => shoot.disease_coverage = Some(1.0),
                    _ => shoot.epiphyte_coverage = Some(1.0),
                }
                assert_eq!(valid_indicator_shoot(&sample.shoots[i]), field == 3);
                let now_valid = valid_sample(&sample);
                assert!(!seen_valid || now_valid, "validity must not regress");
                seen_valid = now_valid;
            }
        }
        assert!(seen_valid);
    }

    #[test]
    fn test_picture_does_not_gate_sample() {
        let mut sample = complete_sample();
        sample.picture = false;
        assert!(valid_sample(&sample));
        assert!(!sample_picture_recorded(&sample));

        sample.picture = true;
        assert!(!sample_picture_recorded(&sample));
        sample.picture_taken_at = Some(Utc::now());
        assert!(sample_picture_recorded(&sample));
    }

    #[test]
    fn test_frame_camera_cue_needs_flag_and_timestamp() {
        let mut frame = DropFrame::new(1);
        assert!(!frame_picture_recorded(&frame));

        frame.picture_taken_at = Some(Utc::now());
        assert!(!frame_picture_recorded(&frame));

        frame.picture = true;
        assert!(frame_picture_recorded(&frame));

        // The cue is independent of whether the frame counts toward samples.
        assert!(!coverage_rule(&frame));
    }

    #[test]
    fn test_incomplete_summary_uses_one_based_positions() {
        let mut sample = complete_sample();
        assert!(incomplete_shoot_summary(&sample).is_empty());

        sample.shoots[0].length = None;
        sample.shoots[2].epiphyte_coverage = None;
        assert_eq!(
            incomplete_shoot_summary(&sample),
            vec!["Shoot 1 incomplete".to_string(), "Shoot 3 incomplete".to_string()]
        );
        assert_eq!(incomplete_shoot_summary(&Sample::new(1)).len(), 3);
    }

    #[test]
    fn test_secchi_requires_depth_time_and_drop_depths() {
        let mut secchi = Secchi::with_drops(2);
        assert!(!valid_secchi(&secchi));

        secchi.depth = Some(3.2);
        secchi.time = NaiveTime::from_hms_opt(10, 15, 0);
        assert!(!valid_secchi(&secchi));

        secchi.drops[0].depth = Some(1.1);
        assert!(!valid_secchi(&secchi));
        secchi.drops[1].depth = Some(1.3);
        assert!(valid_secchi(&secchi));

        secchi.time = None;
        assert!(!valid_secchi(&secchi));
    }

    #[test]
    fn test_hit_bottom_never_changes_secchi_validity() {
        let mut secchi = Secchi::with_drops(2);
        secchi.depth = Some(2.0);
        secchi.time = NaiveTime::from_hms_opt(9, 0, 0);
        secchi.drops[0].depth = Some(1.0);

        for filled in [false, true] {
            secchi.drops[1] = SecchiDrop {
                depth: filled.then_some(1.0),
                hit_bottom: false,
            };
            let before = valid_secchi(&secchi);
            secchi.drops[1].hit_bottom = true;
            assert_eq!(valid_secchi(&secchi), before);
            secchi.drops[0].hit_bottom = !secchi.drops[0].hit_bottom;
            assert_eq!(valid_secchi(&secchi), before);
        }
    }

    #[test]
    fn test_sample_creation_gated_by_eligible_frames() {
        let mut station = Station::new(1, "A");
        station.is_indicator_station = true;
        station.frames =
            DropFrames::try_from(vec![frame_with("50"), frame_with("0"), frame_with("10")])
                .unwrap();
        station.samples = vec![complete_sample(), Sample::new(1)];

        let progress = sample_progress(&station, &coverage_rule);
        assert_eq!(progress.eligible_frames, 2);
        assert_eq!(progress.label(), "Indicator Sample 2/2");
        assert!(!can_create_sample(&station, &coverage_rule));

        station.frames.try_push(frame_with("75")).unwrap();
        assert!(can_create_sample(&station, &coverage_rule));
        assert_eq!(sample_progress(&station, &coverage_rule).label(), "Indicator Sample 2/3");
    }

    #[test]
    fn test_sample_section_complete_only_when_all_samples_valid() {
        let mut station = Station::new(1, "A");
        station.is_indicator_station = true;
        station.samples = vec![complete_sample(), Sample::new(1)];
        let progress = sample_progress(&station, &coverage_rule);
        assert_eq!(progress.valid, 1);
        assert!(!progress.complete());

        station.samples.pop();
        assert!(sample_progress(&station, &coverage_rule).complete());
    }

    #[test]
    fn test_frame_creation_gated_at_four() {
        let mut station = Station::new(1, "A");
        for _ in 0..3 {
            station.frames.try_push(DropFrame::new(1)).unwrap();
        }
        assert!(can_create_frame(&station));
        station.frames.try_push(DropFrame::new(1)).unwrap();
        assert!(!can_create_frame(&station));
    }

    #[test]
    fn test_station_progress_ignores_ui_state() {
        let mut station = Station::new(1, "A");
        station.location.latitude = Some(42.5);
        station.location.longitude = Some(-70.8);
        station.secchi.depth = Some(2.0);
        station.secchi.time = NaiveTime::from_hms_opt(9, 30, 0);
        station.secchi.drops[0].depth = Some(1.0);

        let progress = station_progress(&station, &coverage_rule);
        assert!(progress.complete());
        assert_eq!(progress.samples, None);

        station.ui = station
            .ui
            .toggled(StationSection::Secchi)
            .toggled(StationSection::Location);
        assert_eq!(station_progress(&station, &coverage_rule), progress);
    }

    #[test]
    fn test_location_out_of_range_is_incomplete() {
        let mut location = Location {
            latitude: Some(42.0),
            longitude: Some(-70.0),
            accuracy: Some(5.0),
        };
        assert!(valid_location(&location));
        location.longitude = Some(-200.0);
        assert!(!valid_location(&location));
        location.longitude = None;
        assert!(!valid_location(&location));
    }
}
