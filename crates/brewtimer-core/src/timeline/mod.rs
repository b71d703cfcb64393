//! Stage expansion.
//!
//! Turns cumulative, author-facing [`Stage`]s into a contiguous list of
//! pour/wait [`ExpandedStage`] segments:
//!
//! ```text
//! stages:   [30s, pour 10s, 50g]          [90s, pour 20s, 150g]
//! segments: |pour 0-10|  wait 10-30  |pour 30-50|    wait 50-90    |
//! water:     0 -> 50g      50g        50 -> 150g        150g
//! ```
//!
//! Untimed stages produce no segments but stay addressable through
//! [`Timeline::stage`]. Malformed input yields an empty timeline.

mod segment;

pub use segment::{ExpandedStage, SegmentKind};

use std::ops::Range;

use crate::error::TimelineError;
use crate::stage::{PourKind, Stage};

/// Expand `stages` into timeline segments.
///
/// Returns an empty list if the stages are malformed; see [`validate`] for
/// the reason.
pub fn expand(stages: &[Stage]) -> Vec<ExpandedStage> {
    Timeline::build(stages).segments
}

/// Check that `stages` can be expanded.
pub fn validate(stages: &[Stage]) -> Result<(), TimelineError> {
    Timeline::try_build(stages).map(|_| ())
}

/// Immutable expanded timeline plus the stages it was derived from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    segments: Vec<ExpandedStage>,
    stages: Vec<Stage>,
    untimed_water: f64,
}

impl Timeline {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Expand `stages`, logging and returning an empty timeline on
    /// malformed input.
    pub fn build(stages: &[Stage]) -> Self {
        match Self::try_build(stages) {
            Ok(timeline) => timeline,
            Err(err) => {
                tracing::warn!(error = %err, "refusing to expand malformed stages");
                Self::empty()
            }
        }
    }

    pub fn try_build(stages: &[Stage]) -> Result<Self, TimelineError> {
        let mut segments = Vec::with_capacity(stages.len() * 2);
        let mut untimed_water = 0.0;
        let mut prev_time: u32 = 0;
        let mut prev_water: f64 = 0.0;

        for (index, stage) in stages.iter().enumerate() {
            let water = stage
                .water()
                .map_err(|_| TimelineError::InvalidWater {
                    index,
                    value: stage.cumulative_water.clone(),
                })?
                .value();

            match stage.pour_kind {
                PourKind::Untimed => {
                    untimed_water += water;
                    continue;
                }
                PourKind::Timed => {}
            }

            if stage.cumulative_time < prev_time {
                return Err(TimelineError::NonMonotonicTime {
                    index,
                    previous: prev_time,
                    current: stage.cumulative_time,
                });
            }
            if water < prev_water {
                return Err(TimelineError::DecreasingWater {
                    index,
                    previous: prev_water,
                    current: water,
                });
            }

            let interval = stage.cumulative_time - prev_time;
            match stage.pour_duration {
                Some(pour) if pour < interval => {
                    let pour_end = prev_time + pour;
                    segments.push(ExpandedStage {
                        kind: SegmentKind::Pour,
                        start_time: prev_time,
                        end_time: pour_end,
                        pour_duration: pour,
                        water_at_start: prev_water,
                        water_at_end: water,
                        original_index: index,
                    });
                    segments.push(ExpandedStage {
                        kind: SegmentKind::Wait,
                        start_time: pour_end,
                        end_time: stage.cumulative_time,
                        pour_duration: stage.cumulative_time - pour_end,
                        water_at_start: water,
                        water_at_end: water,
                        original_index: index,
                    });
                }
                _ => segments.push(ExpandedStage {
                    kind: SegmentKind::Pour,
                    start_time: prev_time,
                    end_time: stage.cumulative_time,
                    pour_duration: interval,
                    water_at_start: prev_water,
                    water_at_end: water,
                    original_index: index,
                }),
            }

            prev_time = stage.cumulative_time;
            prev_water = water;
        }

        Ok(Self {
            segments,
            stages: stages.to_vec(),
            untimed_water,
        })
    }

    pub fn segments(&self) -> &[ExpandedStage] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&ExpandedStage> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Brew length in seconds: the last timed stage's cumulative time.
    pub fn total_secs(&self) -> u32 {
        self.segments.last().map(|s| s.end_time).unwrap_or(0)
    }

    /// Source stage by authored position, untimed stages included.
    pub fn stage(&self, original_index: usize) -> Option<&Stage> {
        self.stages.get(original_index)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Range of segment indices emitted for the stage at `original_index`.
    /// Empty for untimed or unknown stages.
    pub fn segments_for_stage(&self, original_index: usize) -> Range<usize> {
        let start = self
            .segments
            .iter()
            .position(|s| s.original_index == original_index);
        match start {
            Some(start) => {
                let len = self.segments[start..]
                    .iter()
                    .take_while(|s| s.original_index == original_index)
                    .count();
                start..start + len
            }
            None => 0..0,
        }
    }

    /// Water added off the clock by untimed stages.
    pub fn untimed_water(&self) -> f64 {
        self.untimed_water
    }

    /// Water poured on the clock by the end of the brew.
    pub fn brew_water(&self) -> f64 {
        self.segments.last().map(|s| s.water_at_end).unwrap_or(0.0)
    }

    /// Everything in the cup: brew water plus untimed additions.
    pub fn total_water(&self) -> f64 {
        self.brew_water() + self.untimed_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pour_recipe() -> Vec<Stage> {
        vec![
            Stage::timed(30, "50g").with_pour_duration(10),
            Stage::timed(90, "150g").with_pour_duration(20),
        ]
    }

    #[test]
    fn splits_pours_and_waits() {
        let segments = expand(&two_pour_recipe());
        let shape: Vec<_> = segments
            .iter()
            .map(|s| (s.kind, s.start_time, s.end_time, s.water_at_start, s.water_at_end))
            .collect();
        assert_eq!(
            shape,
            vec![
                (SegmentKind::Pour, 0, 10, 0.0, 50.0),
                (SegmentKind::Wait, 10, 30, 50.0, 50.0),
                (SegmentKind::Pour, 30, 50, 50.0, 150.0),
                (SegmentKind::Wait, 50, 90, 150.0, 150.0),
            ]
        );
        assert_eq!(segments[2].pour_duration, 20);
        assert_eq!(segments[3].original_index, 1);
    }

    #[test]
    fn pour_without_duration_fills_interval() {
        let segments = expand(&[Stage::timed(25, "30g")]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Pour);
        assert_eq!((segments[0].start_time, segments[0].end_time), (0, 25));
        assert_eq!(segments[0].pour_duration, 25);
    }

    #[test]
    fn pour_duration_at_or_over_interval_is_single_pour() {
        let segments = expand(&[
            Stage::timed(20, "40g").with_pour_duration(20),
            Stage::timed(30, "60g").with_pour_duration(45),
        ]);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Pour));
        assert_eq!(segments[1].pour_duration, 10);
    }

    #[test]
    fn zero_length_stage_emits_bookkeeping_pour() {
        let segments = expand(&[Stage::timed(10, "20g"), Stage::timed(10, "40g")]);
        assert_eq!(segments.len(), 2);
        assert!(segments[1].is_zero_length());
        assert_eq!(segments[1].pour_duration, 0);
        assert_eq!(segments[1].water_at_end, 40.0);
    }

    #[test]
    fn untimed_stages_keep_original_indices() {
        let stages = vec![
            Stage::timed(25, "36g").with_label("Shot"),
            Stage::untimed("120g").with_label("Hot water"),
            Stage::timed(40, "40g"),
        ];
        let timeline = Timeline::build(&stages);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.segment(1).map(|s| s.original_index), Some(2));
        assert_eq!(timeline.segment(1).map(|s| s.water_at_start), Some(36.0));
        assert_eq!(timeline.stage(1).map(|s| s.label.as_str()), Some("Hot water"));
        assert_eq!(timeline.segments_for_stage(1), 0..0);
        assert_eq!(timeline.untimed_water(), 120.0);
        assert_eq!(timeline.total_water(), 160.0);
        assert_eq!(timeline.total_secs(), 40);
    }

    #[test]
    fn only_untimed_stages_yield_empty_timeline() {
        let timeline = Timeline::build(&[Stage::untimed("100g")]);
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_secs(), 0);
    }

    #[test]
    fn decreasing_time_is_malformed() {
        let stages = vec![Stage::timed(30, "50g"), Stage::timed(20, "100g")];
        assert!(expand(&stages).is_empty());
        assert_eq!(
            validate(&stages),
            Err(TimelineError::NonMonotonicTime {
                index: 1,
                previous: 30,
                current: 20
            })
        );
    }

    #[test]
    fn decreasing_water_is_malformed() {
        let stages = vec![Stage::timed(30, "100g"), Stage::timed(60, "80g")];
        assert!(expand(&stages).is_empty());
        assert!(matches!(
            validate(&stages),
            Err(TimelineError::DecreasingWater { index: 1, .. })
        ));
    }

    #[test]
    fn unparsable_water_is_malformed() {
        let stages = vec![Stage::timed(30, "lots")];
        assert!(expand(&stages).is_empty());
        assert!(matches!(
            validate(&stages),
            Err(TimelineError::InvalidWater { index: 0, .. })
        ));
    }

    #[test]
    fn segments_for_stage_covers_pour_and_wait() {
        let timeline = Timeline::build(&two_pour_recipe());
        assert_eq!(timeline.segments_for_stage(0), 0..2);
        assert_eq!(timeline.segments_for_stage(1), 2..4);
        assert_eq!(timeline.segments_for_stage(7), 0..0);
    }
}
