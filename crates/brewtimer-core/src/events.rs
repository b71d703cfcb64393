use serde::{Deserialize, Serialize};

use crate::timeline::SegmentKind;
use crate::timer::{CueKind, StageChange, TimerPhase};

/// Every observable change in a brew produces an Event.
/// Listeners receive them as callbacks; the driver broadcasts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PhaseChanged {
        from: TimerPhase,
        to: TimerPhase,
    },
    CountdownChanged {
        remaining: Option<u32>,
    },
    Tick {
        elapsed_secs: u32,
    },
    StageChanged(StageChange),
    Completed {
        total_elapsed_secs: u32,
    },
    HapticRequested {
        kind: CueKind,
    },
    AudioRequested {
        kind: CueKind,
    },
    StateSnapshot {
        phase: TimerPhase,
        elapsed_secs: u32,
        total_secs: u32,
        countdown_remaining: Option<u32>,
        stage_index: Option<usize>,
        original_index: Option<usize>,
        stage_label: String,
        segment_kind: Option<SegmentKind>,
        stage_progress: f64,
        water_g: f64,
        /// Only present when flow-rate display is enabled.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flow_rate_gps: Option<f64>,
        overall_progress_pct: f64,
    },
}
