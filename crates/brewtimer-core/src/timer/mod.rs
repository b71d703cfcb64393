mod driver;
mod engine;
mod listener;
mod schedule;

pub use driver::{spawn, TimerClient};
pub use engine::{TimerController, TimerPhase, TimerSettings, COUNTDOWN_SECS};
pub use listener::{CueKind, EventLog, EventSink, StageChange, TimerListener};
pub use schedule::{Scheduled, ScheduledKind, TimerHandle};
