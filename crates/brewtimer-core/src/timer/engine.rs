//! Brew timer state machine.
//!
//! The controller never sleeps or spawns. It owns exactly one scheduled
//! callback request at a time (see [`TimerController::pending`]); the host
//! loop waits for it and calls [`TimerController::fire`] with its handle.
//! Any transition that schedules something new cancels the old request
//! first, and a fire with a stale handle is dropped, so elapsed time can
//! only advance once per live tick.
//!
//! ## State Transitions
//!
//! ```text
//! Idle ──start──> Countdown ──3,2,1──> Running ──tick*──> Completed
//!                                       │   ^
//!                                  pause│   │start
//!                                       v   │
//!                                       Paused
//! ```
//!
//! `reset()` returns to `Idle` from anywhere.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::listener::{CueKind, StageChange, TimerListener};
use super::schedule::{Scheduled, ScheduledKind, TimerHandle};
use crate::error::{ListenerError, TimelineError, TimerError};
use crate::events::Event;
use crate::progress;
use crate::stage::Stage;
use crate::timeline::Timeline;

/// Length of the pre-roll in seconds.
pub const COUNTDOWN_SECS: u32 = 3;

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Countdown,
    Running,
    Paused,
    Completed,
}

/// Feedback gates and clock granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub haptics_enabled: bool,
    pub audio_enabled: bool,
    pub flow_rate_display_enabled: bool,
    /// Seconds added to elapsed per main tick. Also the tick period.
    pub tick_secs: u32,
    /// Delay between `skip()` and completion.
    pub skip_grace: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            haptics_enabled: true,
            audio_enabled: true,
            flow_rate_display_enabled: true,
            tick_secs: 1,
            skip_grace: Duration::from_millis(500),
        }
    }
}

/// Drives one brew through its expanded timeline.
pub struct TimerController {
    stages: Vec<Stage>,
    stages_revision: u64,
    timeline: Arc<Timeline>,
    timeline_revision: u64,
    timeline_error: Option<TimelineError>,
    settings: TimerSettings,
    phase: TimerPhase,
    elapsed: u32,
    countdown_remaining: Option<u32>,
    last_notified: Option<usize>,
    pending: Option<Scheduled>,
    next_handle: u64,
    listeners: Vec<Box<dyn TimerListener>>,
}

impl std::fmt::Debug for TimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerController")
            .field("phase", &self.phase)
            .field("elapsed", &self.elapsed)
            .field("countdown_remaining", &self.countdown_remaining)
            .field("last_notified", &self.last_notified)
            .field("pending", &self.pending)
            .field("segments", &self.timeline.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TimerController {
    /// Create a controller for `stages`. Starts `Idle`.
    pub fn new(stages: Vec<Stage>, settings: TimerSettings) -> Self {
        let mut controller = Self {
            stages,
            stages_revision: 1,
            timeline: Arc::new(Timeline::empty()),
            timeline_revision: 0,
            timeline_error: None,
            settings,
            phase: TimerPhase::Idle,
            elapsed: 0,
            countdown_remaining: None,
            last_notified: None,
            pending: None,
            next_handle: 0,
            listeners: Vec::new(),
        };
        controller.refresh_timeline();
        controller
    }

    pub fn add_listener(&mut self, listener: impl TimerListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown_remaining
    }

    pub fn last_notified_stage(&self) -> Option<usize> {
        self.last_notified
    }

    /// Current immutable timeline. Replaced, never mutated, on stage
    /// changes.
    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// The outstanding callback request, if any.
    pub fn pending(&self) -> Option<Scheduled> {
        self.pending
    }

    pub fn current_stage_index(&self) -> Option<usize> {
        progress::current_stage_index(f64::from(self.elapsed), self.timeline.segments())
    }

    /// Full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let t = f64::from(self.elapsed);
        let segments = self.timeline.segments();
        let index = self.current_stage_index();
        let segment = index.and_then(|i| segments.get(i));
        let original_index = segment.map(|s| s.original_index);
        let stage_label = original_index
            .and_then(|i| self.timeline.stage(i))
            .map(|s| s.label.clone())
            .unwrap_or_default();
        let flow_rate_gps = if self.settings.flow_rate_display_enabled {
            segment.map(progress::target_flow_rate)
        } else {
            None
        };
        Event::StateSnapshot {
            phase: self.phase,
            elapsed_secs: self.elapsed,
            total_secs: self.timeline.total_secs(),
            countdown_remaining: self.countdown_remaining,
            stage_index: index,
            original_index,
            stage_label,
            segment_kind: segment.map(|s| s.kind),
            stage_progress: index
                .map(|i| progress::stage_progress(i, t, segments))
                .unwrap_or(0.0),
            water_g: progress::water_at(t, segments),
            flow_rate_gps,
            overall_progress_pct: progress::overall_progress(t, segments) * 100.0,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a brew, or resume a paused one.
    ///
    /// Redundant calls while counting down or running are no-ops. Refuses
    /// with a diagnostic when the stages yield no timeline.
    pub fn start(&mut self) -> Result<(), TimerError> {
        match self.phase {
            TimerPhase::Countdown | TimerPhase::Running => {
                trace!(phase = ?self.phase, "start ignored");
                Ok(())
            }
            TimerPhase::Paused if self.elapsed < self.timeline.total_secs() => {
                self.schedule_ticking();
                self.set_phase(TimerPhase::Running);
                Ok(())
            }
            TimerPhase::Idle | TimerPhase::Paused | TimerPhase::Completed => {
                self.ensure_startable()?;
                self.begin_countdown();
                Ok(())
            }
        }
    }

    /// Stop the clock. Only meaningful while running, and refused once a
    /// skip has committed the brew to completing.
    pub fn pause(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        if matches!(self.pending, Some(p) if p.kind == ScheduledKind::SkipGrace) {
            debug!("pause refused while skip grace is pending");
            return false;
        }
        self.cancel();
        self.set_phase(TimerPhase::Paused);
        true
    }

    /// Jump to the end of the final wait and complete after the grace
    /// delay.
    pub fn skip(&mut self) -> Result<(), TimerError> {
        if self.phase != TimerPhase::Running {
            return Err(TimerError::SkipNotAllowed);
        }
        if matches!(self.pending, Some(p) if p.kind == ScheduledKind::SkipGrace) {
            return Ok(());
        }
        let segments = self.timeline.segments();
        let in_final_wait = match self.current_stage_index() {
            Some(i) => i + 1 == segments.len() && segments[i].is_wait(),
            None => false,
        };
        if !in_final_wait {
            debug!(elapsed = self.elapsed, "skip refused outside final wait");
            return Err(TimerError::SkipNotAllowed);
        }

        self.elapsed = self.timeline.total_secs();
        let elapsed = self.elapsed;
        debug!(elapsed, "skipping to end of brew");
        self.emit(|l| l.on_tick(elapsed));
        self.notify_boundaries();

        if self.settings.skip_grace.is_zero() {
            self.complete();
        } else {
            self.schedule(ScheduledKind::SkipGrace, self.settings.skip_grace, false);
        }
        Ok(())
    }

    /// Back to `Idle` with a zeroed clock. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.cancel();
        let was_counting = self.countdown_remaining.is_some();
        self.elapsed = 0;
        self.countdown_remaining = None;
        self.last_notified = None;
        if was_counting {
            self.emit(|l| l.on_countdown_change(None));
        }
        self.set_phase(TimerPhase::Idle);
    }

    /// Replace the recipe stages.
    ///
    /// During a countdown the new timeline takes effect when running
    /// begins; a brew in any other phase is reset.
    pub fn set_stages(&mut self, stages: Vec<Stage>) {
        self.stages = stages;
        self.stages_revision += 1;
        if self.phase == TimerPhase::Countdown {
            return;
        }
        if self.phase != TimerPhase::Idle {
            debug!(phase = ?self.phase, "stages replaced mid-brew, resetting");
            self.reset();
        }
        self.refresh_timeline();
    }

    pub fn set_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        if self.phase == TimerPhase::Running
            && matches!(self.pending, Some(p) if p.kind == ScheduledKind::Tick)
        {
            self.schedule_ticking();
        }
    }

    /// Run the callback identified by `handle`.
    ///
    /// Returns `false` for a stale or unknown handle, which changes
    /// nothing.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        let Some(scheduled) = self.pending else {
            trace!(%handle, "fire with nothing pending");
            return false;
        };
        if scheduled.handle != handle {
            trace!(%handle, current = %scheduled.handle, "stale handle ignored");
            return false;
        }
        if !scheduled.repeating {
            self.pending = None;
        }
        match scheduled.kind {
            ScheduledKind::Countdown => self.countdown_tick(),
            ScheduledKind::Tick => self.tick(),
            ScheduledKind::SkipGrace => self.complete(),
        }
        true
    }

    /// Fire whatever is pending. Convenience for hosts that step manually.
    pub fn fire_pending(&mut self) -> bool {
        match self.pending {
            Some(scheduled) => self.fire(scheduled.handle),
            None => false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn countdown_tick(&mut self) {
        let remaining = self.countdown_remaining.unwrap_or(0).saturating_sub(1);
        if remaining > 0 {
            self.countdown_remaining = Some(remaining);
            self.emit(|l| l.on_countdown_change(Some(remaining)));
            self.cue(CueKind::Countdown);
            return;
        }
        self.countdown_remaining = None;
        self.emit(|l| l.on_countdown_change(None));
        self.enter_running();
    }

    fn enter_running(&mut self) {
        if let Err(err) = self.ensure_startable() {
            warn!(error = %err, "stages changed during countdown, brew not started");
            self.cancel();
            self.set_phase(TimerPhase::Idle);
            return;
        }
        self.last_notified = None;
        self.schedule_ticking();
        self.set_phase(TimerPhase::Running);
        self.cue(CueKind::Start);
        self.notify_boundaries();
    }

    fn tick(&mut self) {
        let total = self.timeline.total_secs();
        self.elapsed = self.elapsed.saturating_add(self.settings.tick_secs).min(total);
        trace!(elapsed = self.elapsed, "tick");
        let elapsed = self.elapsed;
        self.emit(|l| l.on_tick(elapsed));
        self.notify_boundaries();
        if self.elapsed >= total {
            self.complete();
        }
    }

    /// Emit one stage change per boundary crossed since the last
    /// notification, in timeline order.
    fn notify_boundaries(&mut self) {
        let timeline = Arc::clone(&self.timeline);
        let segments = timeline.segments();
        let t = f64::from(self.elapsed);
        let Some(current) = progress::current_stage_index(t, segments) else {
            return;
        };
        let first = self.last_notified.map_or(0, |i| i + 1);
        if first > current {
            return;
        }
        for (index, segment) in segments.iter().enumerate().take(current + 1).skip(first) {
            let change = StageChange {
                stage_index: index,
                original_index: segment.original_index,
                progress: progress::stage_progress(index, t, segments),
                is_waiting: segment.is_wait(),
            };
            trace!(stage = index, "stage boundary crossed");
            self.emit(|l| l.on_stage_change(change));
        }
        self.last_notified = Some(current);
        if first > 0 {
            self.cue(CueKind::Stage);
        }
    }

    fn complete(&mut self) {
        self.cancel();
        self.countdown_remaining = None;
        self.set_phase(TimerPhase::Completed);
        self.cue(CueKind::Complete);
        let total = self.elapsed;
        debug!(total, "brew completed");
        self.emit(|l| l.on_complete(total));
    }

    fn begin_countdown(&mut self) {
        self.elapsed = 0;
        self.last_notified = None;
        self.countdown_remaining = Some(COUNTDOWN_SECS);
        self.schedule(ScheduledKind::Countdown, COUNTDOWN_PERIOD, true);
        self.set_phase(TimerPhase::Countdown);
        self.emit(|l| l.on_countdown_change(Some(COUNTDOWN_SECS)));
        self.cue(CueKind::Countdown);
    }

    fn schedule_ticking(&mut self) {
        let period = Duration::from_secs(u64::from(self.settings.tick_secs.max(1)));
        self.schedule(ScheduledKind::Tick, period, true);
    }

    fn schedule(&mut self, kind: ScheduledKind, delay: Duration, repeating: bool) {
        self.cancel();
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        trace!(%handle, ?kind, ?delay, "scheduled");
        self.pending = Some(Scheduled {
            handle,
            kind,
            delay,
            repeating,
        });
    }

    fn cancel(&mut self) {
        if let Some(scheduled) = self.pending.take() {
            trace!(handle = %scheduled.handle, kind = ?scheduled.kind, "cancelled");
        }
    }

    fn ensure_startable(&mut self) -> Result<(), TimerError> {
        self.refresh_timeline();
        if let Some(err) = &self.timeline_error {
            warn!(error = %err, "refusing to start: malformed stages");
            return Err(TimerError::MalformedStages(err.clone()));
        }
        if self.timeline.is_empty() {
            warn!("refusing to start: no timed stages");
            return Err(TimerError::EmptyTimeline);
        }
        Ok(())
    }

    fn refresh_timeline(&mut self) {
        if self.timeline_revision == self.stages_revision {
            return;
        }
        match Timeline::try_build(&self.stages) {
            Ok(timeline) => {
                self.timeline = Arc::new(timeline);
                self.timeline_error = None;
            }
            Err(err) => {
                warn!(error = %err, "stages do not form a timeline");
                self.timeline = Arc::new(Timeline::empty());
                self.timeline_error = Some(err);
            }
        }
        self.timeline_revision = self.stages_revision;
        debug!(
            segments = self.timeline.len(),
            total_secs = self.timeline.total_secs(),
            "timeline rebuilt"
        );
    }

    fn set_phase(&mut self, to: TimerPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        debug!(?from, ?to, elapsed = self.elapsed, "phase changed");
        self.emit(|l| l.on_phase_change(from, to));
    }

    fn cue(&mut self, kind: CueKind) {
        if self.settings.haptics_enabled {
            self.each_listener("haptic", |l| l.on_haptic_request(kind));
        }
        if self.settings.audio_enabled {
            self.each_listener("audio", |l| l.on_audio_request(kind));
        }
    }

    fn emit(&mut self, mut f: impl FnMut(&mut dyn TimerListener)) {
        self.each_listener("notify", |l| {
            f(l);
            Ok(())
        });
    }

    /// Invoke `f` on every listener, isolating errors and panics so one
    /// bad listener cannot stop the clock.
    fn each_listener(
        &mut self,
        callback: &'static str,
        mut f: impl FnMut(&mut dyn TimerListener) -> Result<(), ListenerError>,
    ) {
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| f(listener.as_mut()))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(listener = index, callback, error = %err, "listener failed");
                }
                Err(_) => {
                    warn!(listener = index, callback, "listener panicked");
                }
            }
        }
    }
}
