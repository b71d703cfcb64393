//! # Brewtimer Core Library
//!
//! This library provides the timing engine behind guided coffee brewing.
//! A recipe is authored as a short list of cumulative stages; the engine
//! expands it into a contiguous pour/wait timeline and walks that timeline
//! with a countdown, running, paused and completed state machine.
//!
//! ## Architecture
//!
//! - **Stage expansion**: pure `Stage[] -> ExpandedStage[]`
//! - **Progress resolution**: pure point queries (current segment, progress,
//!   water, flow rate) at any elapsed time
//! - **Timer controller**: a host-driven state machine holding at most one
//!   scheduled callback, notifying listeners once per boundary crossed
//! - **Driver**: a tokio task that hosts one controller behind typed
//!   channels
//!
//! ## Key Components
//!
//! - [`Timeline`]: Expanded, immutable brew timeline
//! - [`TimerController`]: Core timer state machine
//! - [`TimerListener`]: Callback contract for UI, haptics and audio
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod progress;
pub mod recipe;
pub mod stage;
pub mod storage;
pub mod timeline;
pub mod timer;

pub use error::{ConfigError, CoreError, TimelineError, TimerError, WaterParseError};
pub use events::Event;
pub use recipe::Recipe;
pub use stage::{Grams, PourKind, Stage, ValveState};
pub use storage::Config;
pub use timeline::{expand, validate, ExpandedStage, SegmentKind, Timeline};
pub use timer::{
    CueKind, EventLog, StageChange, TimerClient, TimerController, TimerListener, TimerPhase,
    TimerSettings,
};
