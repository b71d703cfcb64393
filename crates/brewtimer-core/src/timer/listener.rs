//! Observer side of the timer.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::TimerPhase;
use crate::error::ListenerError;
use crate::events::Event;

/// Which moment a haptic/audio cue marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Countdown,
    Start,
    Stage,
    Complete,
}

/// Payload of a boundary-crossing notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageChange {
    /// Index into the expanded timeline.
    pub stage_index: usize,
    /// Authored stage the segment came from.
    pub original_index: usize,
    pub progress: f64,
    pub is_waiting: bool,
}

/// Callbacks invoked by [`TimerController`](super::TimerController).
///
/// All methods default to no-ops. Cue requests are best-effort: an `Err`
/// or a panic is logged and the tick carries on.
pub trait TimerListener: Send {
    fn on_phase_change(&mut self, _from: TimerPhase, _to: TimerPhase) {}

    fn on_tick(&mut self, _elapsed_secs: u32) {}

    fn on_stage_change(&mut self, _change: StageChange) {}

    fn on_countdown_change(&mut self, _remaining: Option<u32>) {}

    fn on_complete(&mut self, _total_elapsed_secs: u32) {}

    fn on_haptic_request(&mut self, _kind: CueKind) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_audio_request(&mut self, _kind: CueKind) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Adapts a closure over [`Event`] into a listener.
pub struct EventSink<F>(pub F);

impl<F> TimerListener for EventSink<F>
where
    F: FnMut(Event) + Send,
{
    fn on_phase_change(&mut self, from: TimerPhase, to: TimerPhase) {
        (self.0)(Event::PhaseChanged { from, to });
    }

    fn on_tick(&mut self, elapsed_secs: u32) {
        (self.0)(Event::Tick { elapsed_secs });
    }

    fn on_stage_change(&mut self, change: StageChange) {
        (self.0)(Event::StageChanged(change));
    }

    fn on_countdown_change(&mut self, remaining: Option<u32>) {
        (self.0)(Event::CountdownChanged { remaining });
    }

    fn on_complete(&mut self, total_elapsed_secs: u32) {
        (self.0)(Event::Completed { total_elapsed_secs });
    }

    fn on_haptic_request(&mut self, kind: CueKind) -> Result<(), ListenerError> {
        (self.0)(Event::HapticRequested { kind });
        Ok(())
    }

    fn on_audio_request(&mut self, kind: CueKind) -> Result<(), ListenerError> {
        (self.0)(Event::AudioRequested { kind });
        Ok(())
    }
}

/// In-memory record of every event, shareable across clones.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that appends into this log.
    pub fn listener(&self) -> EventSink<impl FnMut(Event) + Send + 'static> {
        let events = Arc::clone(&self.events);
        EventSink(move |event| {
            events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(event);
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    pub fn stage_changes(&self) -> Vec<StageChange> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::StageChanged(change) => Some(change),
                _ => None,
            })
            .collect()
    }
}
