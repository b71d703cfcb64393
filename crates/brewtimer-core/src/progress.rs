//! Point queries over an expanded timeline.
//!
//! Everything here is pure: any `t` is accepted, including before the
//! brew starts and after it ends, so the UI can preview a recipe without
//! a running timer.

use crate::timeline::{ExpandedStage, SegmentKind};

/// Index of the segment containing `t`.
///
/// Past the end this clamps to the last segment; before the start it
/// resolves to the first segment with non-zero length. Zero-length pours
/// are never current. `None` only for an empty timeline.
pub fn current_stage_index(t: f64, segments: &[ExpandedStage]) -> Option<usize> {
    let last = segments.len().checked_sub(1)?;
    let total = f64::from(segments[last].end_time);
    if t >= total {
        return Some(last);
    }
    if let Some(i) = segments.iter().position(|s| s.contains(t)) {
        return Some(i);
    }
    Some(
        segments
            .iter()
            .position(|s| !s.is_zero_length())
            .unwrap_or(last),
    )
}

/// Fraction of segment `index` covered at `t`, clamped to `[0, 1]`.
pub fn stage_progress(index: usize, t: f64, segments: &[ExpandedStage]) -> f64 {
    let Some(segment) = segments.get(index) else {
        return 0.0;
    };
    if segment.is_zero_length() || t.is_nan() {
        return 0.0;
    }
    let start = f64::from(segment.start_time);
    let length = f64::from(segment.duration());
    ((t - start) / length).clamp(0.0, 1.0)
}

/// Cumulative water expected at `t` within segment `index`.
///
/// Pours reach their target at the end of the pour sub-duration; waits hold
/// the target.
pub fn interpolated_water(t: f64, index: usize, segments: &[ExpandedStage]) -> f64 {
    let Some(segment) = segments.get(index) else {
        return 0.0;
    };
    match segment.kind {
        SegmentKind::Wait => segment.water_at_end,
        SegmentKind::Pour => {
            if segment.pour_duration == 0 {
                return segment.water_at_end;
            }
            let pour = f64::from(segment.pour_duration);
            let into = (t - f64::from(segment.start_time)).clamp(0.0, pour);
            let delta = segment.water_at_end - segment.water_at_start;
            segment.water_at_start + delta * (into / pour)
        }
    }
}

/// Grams per second the pourer should aim for during `segment`.
pub fn target_flow_rate(segment: &ExpandedStage) -> f64 {
    match segment.kind {
        SegmentKind::Wait => 0.0,
        SegmentKind::Pour if segment.pour_duration == 0 => 0.0,
        SegmentKind::Pour => {
            (segment.water_at_end - segment.water_at_start) / f64::from(segment.pour_duration)
        }
    }
}

/// Cumulative water at `t` anywhere on the timeline.
pub fn water_at(t: f64, segments: &[ExpandedStage]) -> f64 {
    current_stage_index(t, segments)
        .map(|i| interpolated_water(t, i, segments))
        .unwrap_or(0.0)
}

/// Fraction of the whole brew elapsed at `t`, clamped to `[0, 1]`.
pub fn overall_progress(t: f64, segments: &[ExpandedStage]) -> f64 {
    let total = segments.last().map(|s| s.end_time).unwrap_or(0);
    if total == 0 || t.is_nan() {
        return 0.0;
    }
    (t / f64::from(total)).clamp(0.0, 1.0)
}
