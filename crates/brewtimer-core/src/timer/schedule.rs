use std::fmt;
use std::time::Duration;

/// Generation number of a scheduled callback.
///
/// Every new schedule gets a fresh handle; firing with any other handle is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(pub(crate) u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledKind {
    /// Pre-roll count, repeating every second.
    Countdown,
    /// Main brew clock, repeating every tick step.
    Tick,
    /// One-shot delay between a skip and completion.
    SkipGrace,
}

/// The controller's single outstanding callback request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub handle: TimerHandle,
    pub kind: ScheduledKind,
    /// Delay before the first firing, and the period if repeating.
    pub delay: Duration,
    pub repeating: bool,
}
