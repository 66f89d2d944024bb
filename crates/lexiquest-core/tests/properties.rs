//! Property tests for tracker invariants.

use chrono::{Duration, TimeZone, Utc};
use lexiquest_core::{ComboTracker, ProtectionTemplate, StreakTracker};
use proptest::prelude::*;

proptest! {
    /// Rapid correct answers (spaced under the timeout) grow the combo by
    /// exactly one per call, and the high-water mark tracks it.
    #[test]
    fn combo_counts_answers_within_timeout(gaps in prop::collection::vec(0i64..=30, 1..60)) {
        let mut tracker = ComboTracker::new();
        let mut now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

        for (i, gap) in gaps.iter().enumerate() {
            now += Duration::seconds(*gap);
            let outcome = tracker.record_correct_answer(now);
            prop_assert_eq!(outcome.combo, i as u32 + 1);
            prop_assert_eq!(tracker.state().max_combo, i as u32 + 1);
        }
    }

    /// The tier multiplier never leaves [1.0, max_multiplier] and the
    /// bonus counter never decreases, whatever the answer sequence.
    #[test]
    fn combo_multiplier_stays_bounded(answers in prop::collection::vec(any::<bool>(), 1..120)) {
        let mut tracker = ComboTracker::new();
        let cap = tracker.config().max_multiplier;
        let mut now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let mut previous_bonus = 0u64;

        for correct in answers {
            now += Duration::seconds(5);
            if correct {
                tracker.record_correct_answer(now);
            } else {
                tracker.record_incorrect_answer(now);
            }
            let state = tracker.state();
            prop_assert!(state.multiplier >= 1.0 && state.multiplier <= cap);
            prop_assert!(state.total_bonus_xp >= previous_bonus);
            prop_assert!(state.max_combo >= state.current_combo);
            previous_bonus = state.total_bonus_xp;
        }
    }

    /// `longest_streak >= current_streak` after every operation, for any
    /// mix of day gaps and protection purchases.
    #[test]
    fn longest_streak_dominates_current(
        steps in prop::collection::vec((0i64..=4, any::<bool>()), 1..60)
    ) {
        let mut tracker = StreakTracker::new();
        let mut now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();

        for (day_gap, buy_freeze) in steps {
            now += Duration::days(day_gap);
            if buy_freeze {
                tracker.add_protection(&ProtectionTemplate::freeze("freeze"), now).unwrap();
            }
            tracker.record_activity(now);
            let state = tracker.state();
            prop_assert!(state.longest_streak >= state.current_streak);
            prop_assert!(state.current_streak >= 1);
        }
    }
}
