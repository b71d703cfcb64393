use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Pour,
    Wait,
}

/// One disjoint slice of the brew clock.
///
/// Times are seconds from brew start, half-open `[start_time, end_time)`.
/// Water bounds are cumulative grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedStage {
    pub kind: SegmentKind,
    pub start_time: u32,
    pub end_time: u32,
    /// Active pour time. Equals the segment length for waits and for
    /// pours that fill their whole interval.
    pub pour_duration: u32,
    pub water_at_start: f64,
    pub water_at_end: f64,
    /// Position of the source stage in the authored list, untimed stages
    /// included.
    pub original_index: usize,
}

impl ExpandedStage {
    pub fn duration(&self) -> u32 {
        self.end_time - self.start_time
    }

    pub fn is_wait(&self) -> bool {
        self.kind == SegmentKind::Wait
    }

    /// Zero-length pours are bookkeeping only and never "current".
    pub fn is_zero_length(&self) -> bool {
        self.end_time <= self.start_time
    }

    /// Whether `t` falls in `[start_time, end_time)`.
    pub fn contains(&self, t: f64) -> bool {
        f64::from(self.start_time) <= t && t < f64::from(self.end_time)
    }
}
