use mohero_core::ritual::{apply_delta, clamp_value, Exercise, ExerciseKind};
use mohero_core::progress::next_day;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn exercise(target: u32, value: u32) -> Exercise {
    Exercise {
        id: "e".to_string(),
        name: "Squats".to_string(),
        description: None,
        kind: ExerciseKind::Reps,
        target,
        completed_value: value,
        media_refs: Vec::new(),
        position: 0,
    }
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn clamped_value_stays_within_target(requested in any::<i64>(), target in 1_u32..10_000) {
        let value = clamp_value(requested, target);
        prop_assert!(value <= target);
        prop_assert_eq!(exercise(target, value).is_complete(), value == target);
    }

    #[test]
    fn delta_is_clamped(old in 0_u32..500, delta in -1_000_i64..1_000, target in 1_u32..500) {
        let old = old.min(target);
        let value = apply_delta(old, delta, target);
        prop_assert_eq!(i64::from(value), (i64::from(old) + delta).clamp(0, i64::from(target)));
    }

    #[test]
    fn next_day_stays_in_program(duration in 1_u32..365, offset in 0_u32..365) {
        let current = offset % duration + 1;
        let next = next_day(current, duration);
        prop_assert!((1..=duration).contains(&next));
        if current == duration {
            prop_assert_eq!(next, 1);
        } else {
            prop_assert_eq!(next, current + 1);
        }
    }
}
