//! Combo tracking for consecutive correct answers.
//!
//! A combo is a run of correct answers within a session. Each correct
//! answer extends the run as long as it arrives within the inactivity
//! timeout; the run decays the moment a read or write observes that the
//! timeout has passed. Expiry is computed lazily from the stored
//! `last_answer_at` timestamp -- no background timer is ever assumed to
//! have fired, so the math is correct even after the process was
//! suspended for days.
//!
//! The tier table maps combo lengths to XP multipliers and celebration
//! labels. The multiplier is always the one of the highest tier whose
//! threshold is at or below the current combo, capped at a configured
//! ceiling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the combo progression table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComboTier {
    /// Combo length at which this tier activates.
    pub threshold: u32,
    /// XP multiplier granted at this tier.
    pub multiplier: f64,
    /// Celebration label shown by the UI.
    pub label: &'static str,
}

/// Static combo progression table.
///
/// Thresholds are strictly increasing and multipliers non-decreasing;
/// threshold 0 is the base tier. Combos past the last threshold clamp to
/// the last tier rather than extrapolating.
pub const COMBO_TIERS: &[ComboTier] = &[
    ComboTier { threshold: 0, multiplier: 1.0, label: "Base" },
    ComboTier { threshold: 3, multiplier: 1.2, label: "Good!" },
    ComboTier { threshold: 5, multiplier: 1.5, label: "Great!" },
    ComboTier { threshold: 8, multiplier: 2.0, label: "Amazing!" },
    ComboTier { threshold: 12, multiplier: 2.5, label: "Incredible!" },
    ComboTier { threshold: 20, multiplier: 3.0, label: "Unstoppable!" },
    ComboTier { threshold: 30, multiplier: 4.0, label: "On Fire!" },
    ComboTier { threshold: 50, multiplier: 5.0, label: "Legendary!" },
];

/// Configuration for combo behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// Inactivity timeout after which the combo expires (seconds).
    pub timeout_seconds: i64,
    /// Window before expiry in which the combo counts as "at risk" (seconds).
    pub risk_window_seconds: i64,
    /// Fixed per-answer XP unit used for combo bonus accounting.
    pub base_answer_xp: u32,
    /// Ceiling applied to the tier multiplier.
    pub max_multiplier: f64,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            risk_window_seconds: 10,
            base_answer_xp: 10,
            max_multiplier: 5.0,
        }
    }
}

/// Persisted combo state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboState {
    /// Consecutive correct answers since the last reset or expiry.
    pub current_combo: u32,
    /// High-water mark, monotonically non-decreasing.
    pub max_combo: u32,
    /// Wall-clock time of the last answer; `None` means never answered.
    pub last_answer_at: Option<DateTime<Utc>>,
    /// Multiplier derived from the tier table, capped.
    pub multiplier: f64,
    /// Cumulative bonus XP ever granted via combo, monotonically non-decreasing.
    pub total_bonus_xp: u64,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            current_combo: 0,
            max_combo: 0,
            last_answer_at: None,
            multiplier: 1.0,
            total_bonus_xp: 0,
        }
    }
}

/// Outcome of recording a correct answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    /// Combo length after this answer.
    pub combo: u32,
    /// Multiplier after this answer.
    pub multiplier: f64,
    /// Bonus XP accrued by this answer (awarded minus base unit).
    pub bonus_xp: u64,
    /// Whether the previous combo had already timed out when this answer arrived.
    pub combo_expired: bool,
    /// Whether a tier boundary was crossed (for celebration triggers).
    pub tier_changed: bool,
    pub previous_tier: ComboTier,
    pub current_tier: ComboTier,
}

/// Tracks a session's run of correct answers.
#[derive(Debug, Clone)]
pub struct ComboTracker {
    config: ComboConfig,
    state: ComboState,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::with_config(ComboConfig::default())
    }

    pub fn with_config(config: ComboConfig) -> Self {
        Self {
            config,
            state: ComboState::default(),
        }
    }

    /// Restore a tracker from a persisted snapshot.
    pub fn from_state(state: ComboState, config: ComboConfig) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &ComboState {
        &self.state
    }

    pub fn config(&self) -> &ComboConfig {
        &self.config
    }

    /// Record a correct answer at `now`.
    ///
    /// An already-expired combo is reset to zero before the increment, so
    /// the first answer after a long pause starts a fresh combo of 1.
    pub fn record_correct_answer(&mut self, now: DateTime<Utc>) -> AnswerOutcome {
        let previous_tier = self.current_tier();
        let combo_expired = self.state.current_combo > 0 && self.is_expired(now);
        if combo_expired {
            self.state.current_combo = 0;
        }

        self.state.current_combo += 1;
        self.state.last_answer_at = Some(now);
        self.state.max_combo = self.state.max_combo.max(self.state.current_combo);
        self.state.multiplier = self.multiplier_for(self.state.current_combo);

        let base = u64::from(self.config.base_answer_xp);
        let awarded = (base as f64 * self.state.multiplier).floor() as u64;
        let bonus_xp = awarded.saturating_sub(base);
        self.state.total_bonus_xp += bonus_xp;

        let current_tier = self.current_tier();
        AnswerOutcome {
            combo: self.state.current_combo,
            multiplier: self.state.multiplier,
            bonus_xp,
            combo_expired,
            tier_changed: previous_tier.threshold != current_tier.threshold,
            previous_tier,
            current_tier,
        }
    }

    /// Record an incorrect answer at `now`.
    ///
    /// Unconditionally breaks the combo. `max_combo` and `total_bonus_xp`
    /// are untouched. Returns the combo length that was broken.
    pub fn record_incorrect_answer(&mut self, now: DateTime<Utc>) -> u32 {
        let broken = self.state.current_combo;
        self.state.current_combo = 0;
        self.state.multiplier = 1.0;
        self.state.last_answer_at = Some(now);
        broken
    }

    /// Tier for the current combo length.
    pub fn current_tier(&self) -> ComboTier {
        Self::tier_for(self.state.current_combo)
    }

    /// Next tier above the current combo, or `None` at the top tier.
    pub fn next_tier(&self) -> Option<ComboTier> {
        COMBO_TIERS
            .iter()
            .find(|t| t.threshold > self.state.current_combo)
            .copied()
    }

    /// Multiplier that applies at `now`, accounting for lazy expiry.
    ///
    /// Read-only counterpart of the expiry check in
    /// [`record_correct_answer`](Self::record_correct_answer): an expired
    /// combo contributes 1.0 even before the next answer resets it.
    pub fn current_multiplier(&self, now: DateTime<Utc>) -> f64 {
        if self.state.current_combo == 0 || self.is_expired(now) {
            1.0
        } else {
            self.state.multiplier
        }
    }

    /// Time left before the combo expires, zero if no active combo.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.state.current_combo == 0 {
            return Duration::zero();
        }
        let Some(last) = self.state.last_answer_at else {
            return Duration::zero();
        };
        let elapsed = (now - last).max(Duration::zero());
        (Duration::seconds(self.config.timeout_seconds) - elapsed).max(Duration::zero())
    }

    /// True when the combo is alive but close to expiring.
    pub fn is_at_risk(&self, now: DateTime<Utc>) -> bool {
        if self.state.current_combo == 0 {
            return false;
        }
        let remaining = self.time_remaining(now);
        remaining > Duration::zero() && remaining <= Duration::seconds(self.config.risk_window_seconds)
    }

    /// Explicit user reset to the zero state.
    pub fn reset(&mut self) {
        self.state = ComboState::default();
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_answer_at {
            // Strict comparison: an answer at exactly the timeout boundary
            // still continues the combo. Negative elapsed (device clock
            // moved backwards) clamps to zero and never expires.
            Some(last) => (now - last).max(Duration::zero())
                > Duration::seconds(self.config.timeout_seconds),
            None => false,
        }
    }

    fn multiplier_for(&self, combo: u32) -> f64 {
        Self::tier_for(combo).multiplier.min(self.config.max_multiplier)
    }

    fn tier_for(combo: u32) -> ComboTier {
        let mut tier = COMBO_TIERS[0];
        for candidate in COMBO_TIERS {
            if candidate.threshold <= combo {
                tier = *candidate;
            } else {
                break;
            }
        }
        tier
    }
}

impl Default for ComboTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn combo_grows_within_timeout() {
        let mut tracker = ComboTracker::new();
        let mut now = t0();
        for i in 1..=6 {
            let outcome = tracker.record_correct_answer(now);
            assert_eq!(outcome.combo, i);
            assert_eq!(tracker.state().max_combo, i);
            now += Duration::seconds(5);
        }
        assert_eq!(tracker.state().current_combo, 6);
    }

    #[test]
    fn boundary_answer_is_not_expired() {
        let mut tracker = ComboTracker::new();
        tracker.record_correct_answer(t0());
        // Exactly at the timeout: strict comparison keeps the combo.
        let outcome = tracker.record_correct_answer(t0() + Duration::seconds(30));
        assert_eq!(outcome.combo, 2);
        assert!(!outcome.combo_expired);
    }

    #[test]
    fn expires_past_timeout() {
        let mut tracker = ComboTracker::new();
        tracker.record_correct_answer(t0());
        let outcome =
            tracker.record_correct_answer(t0() + Duration::seconds(30) + Duration::milliseconds(1));
        assert_eq!(outcome.combo, 1, "expired combo must restart at 1");
        assert!(outcome.combo_expired);
        // max_combo survives the expiry.
        assert_eq!(tracker.state().max_combo, 1);
    }

    #[test]
    fn incorrect_answer_breaks_combo() {
        let mut tracker = ComboTracker::new();
        let mut now = t0();
        for _ in 0..4 {
            tracker.record_correct_answer(now);
            now += Duration::seconds(2);
        }
        let broken = tracker.record_incorrect_answer(now);
        assert_eq!(broken, 4);
        assert_eq!(tracker.state().current_combo, 0);
        assert_eq!(tracker.state().multiplier, 1.0);
        assert_eq!(tracker.state().max_combo, 4);
    }

    #[test]
    fn tier_table_lookup() {
        let mut tracker = ComboTracker::new();
        let mut now = t0();
        let mut last = None;
        for _ in 0..8 {
            last = Some(tracker.record_correct_answer(now));
            now += Duration::seconds(1);
        }
        let outcome = last.unwrap();
        assert_eq!(outcome.current_tier.label, "Amazing!");
        assert_eq!(outcome.current_tier.multiplier, 2.0);
        assert!(outcome.tier_changed);
    }

    #[test]
    fn tier_clamps_past_last_threshold() {
        let mut tracker = ComboTracker::new();
        let mut now = t0();
        for _ in 0..75 {
            tracker.record_correct_answer(now);
            now += Duration::seconds(1);
        }
        assert_eq!(tracker.current_tier().label, "Legendary!");
        assert_eq!(tracker.state().multiplier, 5.0);
        assert!(tracker.next_tier().is_none());
    }

    #[test]
    fn bonus_accumulates_from_multiplier() {
        let mut tracker = ComboTracker::new();
        let mut now = t0();
        for _ in 0..3 {
            tracker.record_correct_answer(now);
            now += Duration::seconds(1);
        }
        // Third answer reaches the 1.2x tier: floor(10 * 1.2) - 10 = 2.
        assert_eq!(tracker.state().total_bonus_xp, 2);
    }

    #[test]
    fn time_remaining_and_risk_window() {
        let mut tracker = ComboTracker::new();
        tracker.record_correct_answer(t0());

        assert_eq!(
            tracker.time_remaining(t0() + Duration::seconds(10)),
            Duration::seconds(20)
        );
        assert!(!tracker.is_at_risk(t0() + Duration::seconds(10)));
        assert!(tracker.is_at_risk(t0() + Duration::seconds(25)));
        assert_eq!(
            tracker.time_remaining(t0() + Duration::seconds(40)),
            Duration::zero()
        );
        assert!(!tracker.is_at_risk(t0() + Duration::seconds(40)));
    }

    #[test]
    fn backwards_clock_never_expires() {
        let mut tracker = ComboTracker::new();
        tracker.record_correct_answer(t0());
        let outcome = tracker.record_correct_answer(t0() - Duration::seconds(120));
        assert_eq!(outcome.combo, 2);
        assert!(!outcome.combo_expired);
        assert!(tracker.time_remaining(t0() - Duration::seconds(120)) >= Duration::zero());
    }

    #[test]
    fn expired_combo_reads_as_base_multiplier() {
        let mut tracker = ComboTracker::new();
        let mut now = t0();
        for _ in 0..8 {
            tracker.record_correct_answer(now);
            now += Duration::seconds(1);
        }
        assert_eq!(tracker.current_multiplier(now), 2.0);
        assert_eq!(tracker.current_multiplier(now + Duration::minutes(5)), 1.0);
    }

    #[test]
    fn reset_returns_to_zero_state() {
        let mut tracker = ComboTracker::new();
        tracker.record_correct_answer(t0());
        tracker.reset();
        assert_eq!(tracker.state().current_combo, 0);
        assert_eq!(tracker.state().max_combo, 0);
        assert_eq!(tracker.state().total_bonus_xp, 0);
        assert!(tracker.state().last_answer_at.is_none());
    }

    #[test]
    fn tier_invariants_hold() {
        for pair in COMBO_TIERS.windows(2) {
            assert!(pair[0].threshold < pair[1].threshold);
            assert!(pair[0].multiplier <= pair[1].multiplier);
        }
        assert_eq!(COMBO_TIERS[0].threshold, 0);
        assert_eq!(COMBO_TIERS[0].multiplier, 1.0);
    }
}
