//! Author-facing brewing stages.
//!
//! A [`Stage`] states where the brew should be by the time the stage ends:
//! the *cumulative* elapsed time and the *cumulative* water poured. Stages
//! are immutable once a brew starts; the timer works on the expanded
//! [`Timeline`](crate::timeline::Timeline) derived from them.

mod water;

pub use water::Grams;

use serde::{Deserialize, Serialize};

use crate::error::WaterParseError;

/// Whether a stage occupies time on the brew clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PourKind {
    #[default]
    Timed,
    /// Added off the clock (e.g. beverage or bypass water on an espresso
    /// flow). Contributes no segments.
    Untimed,
}

/// Valve position for switch-style drippers. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Seconds since brew start by which this stage's water must be in.
    pub cumulative_time: u32,
    /// Seconds of active pouring at the start of the stage interval.
    /// `None` means the pour fills the whole interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pour_duration: Option<u32>,
    /// Total water by the end of this stage, as `"<number>g"`.
    pub cumulative_water: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub pour_kind: PourKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valve_state: Option<ValveState>,
}

impl Stage {
    /// A timed stage ending at `cumulative_time` with `cumulative_water`.
    pub fn timed(cumulative_time: u32, cumulative_water: impl Into<String>) -> Self {
        Self {
            cumulative_time,
            pour_duration: None,
            cumulative_water: cumulative_water.into(),
            label: String::new(),
            detail: String::new(),
            pour_kind: PourKind::Timed,
            valve_state: None,
        }
    }

    /// An off-the-clock addition of `water`.
    pub fn untimed(water: impl Into<String>) -> Self {
        Self {
            cumulative_time: 0,
            pour_kind: PourKind::Untimed,
            ..Self::timed(0, water)
        }
    }

    pub fn with_pour_duration(mut self, secs: u32) -> Self {
        self.pour_duration = Some(secs);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_valve(mut self, valve: ValveState) -> Self {
        self.valve_state = Some(valve);
        self
    }

    pub fn is_timed(&self) -> bool {
        self.pour_kind == PourKind::Timed
    }

    /// Parsed water target.
    pub fn water(&self) -> Result<Grams, WaterParseError> {
        self.cumulative_water.parse()
    }
}
