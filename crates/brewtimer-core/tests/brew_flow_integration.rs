//! Integration tests for a full brew.
//!
//! Walks recipes from authored stages through expansion, point queries and
//! the timer state machine using only the public API.

use brewtimer_core::progress::{current_stage_index, interpolated_water, target_flow_rate};
use brewtimer_core::{
    expand, Event, EventLog, SegmentKind, Stage, TimerController, TimerError, TimerPhase,
    TimerSettings,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn two_pour() -> Vec<Stage> {
    vec![
        Stage::timed(30, "50g").with_pour_duration(10),
        Stage::timed(90, "150g").with_pour_duration(20),
    ]
}

fn start_and_count_down(c: &mut TimerController) {
    c.start().unwrap();
    while c.phase() == TimerPhase::Countdown {
        assert!(c.fire_pending());
    }
}

fn tick_until(c: &mut TimerController, elapsed: u32) {
    while c.elapsed() < elapsed && c.phase() == TimerPhase::Running {
        assert!(c.fire_pending());
    }
}

fn completions(log: &EventLog) -> Vec<u32> {
    log.events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Completed { total_elapsed_secs } => Some(total_elapsed_secs),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Expansion and point queries
// ============================================================================

#[test]
fn test_two_pour_recipe_queries() {
    let segments = expand(&two_pour());
    let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SegmentKind::Pour,
            SegmentKind::Wait,
            SegmentKind::Pour,
            SegmentKind::Wait
        ]
    );

    let index = current_stage_index(45.0, &segments).unwrap();
    assert_eq!(index, 2);
    assert_eq!(interpolated_water(45.0, index, &segments), 125.0);
    assert_eq!(target_flow_rate(&segments[index]), 5.0);
}

#[test]
fn test_single_open_pour() {
    let segments = expand(&[Stage::timed(25, "30g")]);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].pour_duration, 25);
    assert_eq!(interpolated_water(12.5, 0, &segments), 15.0);
}

#[test]
fn test_decreasing_times_refuse_to_brew() {
    let stages = vec![Stage::timed(30, "50g"), Stage::timed(20, "80g")];
    assert!(expand(&stages).is_empty());

    let mut c = TimerController::new(stages, TimerSettings::default());
    assert!(matches!(c.start(), Err(TimerError::MalformedStages(_))));
    assert_eq!(c.phase(), TimerPhase::Idle);
}

// ============================================================================
// Timer lifecycle
// ============================================================================

#[test]
fn test_full_brew_lifecycle() {
    let log = EventLog::new();
    let mut c = TimerController::new(two_pour(), TimerSettings::default());
    c.add_listener(log.listener());

    start_and_count_down(&mut c);
    assert_eq!(c.phase(), TimerPhase::Running);

    tick_until(&mut c, 20);
    assert!(c.pause());
    assert!(!c.fire_pending());
    assert_eq!(c.elapsed(), 20);

    c.start().unwrap();
    tick_until(&mut c, 90);
    assert_eq!(c.phase(), TimerPhase::Completed);
    assert_eq!(completions(&log), vec![90]);

    let ticks = log
        .events()
        .iter()
        .filter(|e| matches!(e, Event::Tick { .. }))
        .count();
    assert_eq!(ticks, 90);
}

#[test]
fn test_reset_mid_brew_then_restart() {
    let mut c = TimerController::new(two_pour(), TimerSettings::default());
    start_and_count_down(&mut c);
    tick_until(&mut c, 40);

    c.reset();
    assert_eq!(c.phase(), TimerPhase::Idle);
    assert_eq!(c.elapsed(), 0);

    c.start().unwrap();
    assert_eq!(c.phase(), TimerPhase::Countdown);
}

#[test]
fn test_skip_final_wait_matches_natural_completion() {
    let log = EventLog::new();
    let mut c = TimerController::new(two_pour(), TimerSettings::default());
    c.add_listener(log.listener());

    start_and_count_down(&mut c);
    tick_until(&mut c, 52);
    c.skip().unwrap();
    assert!(c.fire_pending());

    assert_eq!(c.phase(), TimerPhase::Completed);
    assert_eq!(completions(&log), vec![c.timeline().total_secs()]);
}

#[test]
fn test_espresso_flow_with_beverage_addition() {
    let stages = vec![
        Stage::timed(5, "0g").with_label("Preinfusion"),
        Stage::timed(30, "36g").with_label("Extraction"),
        Stage::untimed("100g").with_label("Hot water"),
    ];
    let log = EventLog::new();
    let mut c = TimerController::new(stages, TimerSettings::default());
    c.add_listener(log.listener());

    let timeline = c.timeline();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.total_water(), 136.0);
    assert_eq!(
        timeline.stage(2).map(|s| s.label.as_str()),
        Some("Hot water")
    );

    start_and_count_down(&mut c);
    tick_until(&mut c, 30);
    let originals: Vec<_> = log
        .stage_changes()
        .iter()
        .map(|s| s.original_index)
        .collect();
    assert_eq!(originals, vec![0, 1]);
    assert_eq!(completions(&log), vec![30]);
}
