//! Property tests for expansion, progress queries and notification order.

use brewtimer_core::progress::{stage_progress, target_flow_rate, water_at};
use brewtimer_core::{
    expand, EventLog, SegmentKind, Stage, TimerController, TimerPhase, TimerSettings,
};
use proptest::prelude::*;

/// Well-formed stage lists: non-decreasing times and water, occasional
/// untimed additions and zero-length stages.
fn valid_stages() -> impl Strategy<Value = Vec<Stage>> {
    prop::collection::vec(
        (
            0u32..60,
            prop::option::of(0u32..70),
            0u32..120,
            prop::bool::weighted(0.15),
        ),
        1..8,
    )
    .prop_map(|raw| {
        let mut time = 0;
        let mut water = 0;
        raw.into_iter()
            .map(|(dt, pour, dw, untimed)| {
                if untimed {
                    return Stage::untimed(format!("{dw}g"));
                }
                time += dt;
                water += dw;
                let stage = Stage::timed(time, format!("{water}g"));
                match pour {
                    Some(secs) => stage.with_pour_duration(secs),
                    None => stage,
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn segments_are_contiguous_from_zero(stages in valid_stages()) {
        let segments = expand(&stages);
        let timed: Vec<_> = stages.iter().filter(|s| s.is_timed()).collect();
        prop_assert_eq!(segments.is_empty(), timed.is_empty());
        if let Some(first) = segments.first() {
            prop_assert_eq!(first.start_time, 0);
        }
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        if let (Some(last), Some(last_timed)) = (segments.last(), timed.last()) {
            prop_assert_eq!(last.end_time, last_timed.cumulative_time);
        }
    }

    #[test]
    fn water_targets_and_continuity(stages in valid_stages()) {
        let segments = expand(&stages);
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].water_at_end, pair[1].water_at_start);
        }
        for (index, stage) in stages.iter().enumerate().filter(|(_, s)| s.is_timed()) {
            let last_pour = segments
                .iter()
                .filter(|s| s.original_index == index && s.kind == SegmentKind::Pour)
                .last();
            prop_assert!(last_pour.is_some());
            let expected = stage.water().unwrap().value();
            prop_assert_eq!(last_pour.unwrap().water_at_end, expected);
        }
    }

    #[test]
    fn water_never_decreases(stages in valid_stages(), a in 0.0f64..1.0, b in 0.0f64..1.0) {
        let segments = expand(&stages);
        let total = f64::from(segments.last().map(|s| s.end_time).unwrap_or(0));
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(water_at(lo * total, &segments) <= water_at(hi * total, &segments));
    }

    #[test]
    fn progress_stays_in_unit_range(
        stages in valid_stages(),
        index in 0usize..20,
        t in -50.0f64..500.0,
    ) {
        let segments = expand(&stages);
        let p = stage_progress(index, t, &segments);
        prop_assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn waits_have_zero_flow(stages in valid_stages()) {
        for segment in expand(&stages).iter().filter(|s| s.kind == SegmentKind::Wait) {
            prop_assert_eq!(target_flow_rate(segment), 0.0);
        }
    }

    #[test]
    fn every_boundary_is_notified_in_order(stages in valid_stages(), tick_secs in 1u32..45) {
        let segments = expand(&stages);
        prop_assume!(segments.last().map(|s| s.end_time).unwrap_or(0) > 0);

        let log = EventLog::new();
        let settings = TimerSettings { tick_secs, ..TimerSettings::default() };
        let mut c = TimerController::new(stages, settings);
        c.add_listener(log.listener());
        c.start().unwrap();
        while c.phase() != TimerPhase::Completed {
            prop_assert!(c.fire_pending());
        }

        let notified: Vec<_> = log.stage_changes().iter().map(|s| s.stage_index).collect();
        let expected: Vec<_> = (0..segments.len()).collect();
        prop_assert_eq!(notified, expected);
    }
}
