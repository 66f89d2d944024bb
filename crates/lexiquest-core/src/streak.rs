//! Daily streak continuity tracking.
//!
//! Streaks are counted over local calendar dates, never elapsed
//! milliseconds: a user active at 23:59 and again at 00:01 has been active
//! on two consecutive days. Missed days can be covered by protection
//! items; a protection only applies at the moment the gap is detected,
//! never retroactively.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Kinds of streak-saving items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionKind {
    /// Consumed atomically by one missed day.
    SingleUseFreeze,
    /// Covers any number of missed days until its own expiry.
    TimeboxedInsurance,
    /// Covers missed days that fall on Saturday or Sunday.
    WeekendPass,
}

/// An already-resolved catalog entry for a protection purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionTemplate {
    pub template_id: String,
    pub kind: ProtectionKind,
    /// Coverage window in days; required for `TimeboxedInsurance`.
    pub duration_days: Option<u32>,
}

impl ProtectionTemplate {
    pub fn freeze(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            kind: ProtectionKind::SingleUseFreeze,
            duration_days: None,
        }
    }

    pub fn insurance(template_id: impl Into<String>, duration_days: u32) -> Self {
        Self {
            template_id: template_id.into(),
            kind: ProtectionKind::TimeboxedInsurance,
            duration_days: Some(duration_days),
        }
    }

    pub fn weekend_pass(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            kind: ProtectionKind::WeekendPass,
            duration_days: None,
        }
    }
}

/// A streak-saving item. Kept in history after consumption for audit;
/// only the live subset participates in gap coverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protection {
    pub id: String,
    pub template_id: String,
    pub kind: ProtectionKind,
    pub purchased_at: DateTime<Utc>,
    /// Present iff `kind == TimeboxedInsurance`.
    pub expires_at: Option<DateTime<Utc>>,
    /// Single-use kinds flip to `false` once consumed.
    pub is_active: bool,
}

impl Protection {
    /// Whether this protection can cover a missed day detected at `now`.
    ///
    /// Weekend passes are additionally gated on the day of week by the
    /// selection logic, not here.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.kind {
            ProtectionKind::TimeboxedInsurance => {
                self.expires_at.map(|e| now < e).unwrap_or(false)
            }
            ProtectionKind::SingleUseFreeze | ProtectionKind::WeekendPass => true,
        }
    }
}

/// Configuration for streak behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// Local hour (0-23) after which an inactive day counts as "at risk".
    pub risk_hour: u32,
    /// Fixed offset from UTC for local calendar dates (hours).
    pub timezone_offset_hours: i32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            risk_hour: 18,
            timezone_offset_hours: 0,
        }
    }
}

/// Persisted streak state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    /// Invariant: `longest_streak >= current_streak` after every update.
    pub longest_streak: u32,
    /// Local calendar date of the most recent recorded activity.
    pub last_active_date: Option<NaiveDate>,
    /// Full protection history, consumed items included.
    pub protections: Vec<Protection>,
    pub protections_consumed_count: u32,
}

/// Outcome of recording a day's activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StreakUpdate {
    /// Activity already recorded today; nothing changed.
    AlreadyCountedToday,
    /// First ever activity.
    Started,
    /// Consecutive day; streak incremented.
    Extended { current_streak: u32 },
    /// A gap was covered by a protection; streak preserved unchanged.
    Protected {
        kind: ProtectionKind,
        protection_id: String,
    },
    /// A gap with no live protection; streak restarted at 1.
    Reset { previous_streak: u32 },
}

/// Tracks daily activity continuity.
#[derive(Debug, Clone)]
pub struct StreakTracker {
    config: StreakConfig,
    state: StreakState,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::with_config(StreakConfig::default())
    }

    pub fn with_config(config: StreakConfig) -> Self {
        Self {
            config,
            state: StreakState::default(),
        }
    }

    /// Restore a tracker from a persisted snapshot.
    pub fn from_state(state: StreakState, config: StreakConfig) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &StreakState {
        &self.state
    }

    /// Record learning activity at `now`.
    ///
    /// Idempotent within a calendar day. A gap of at least one full missed
    /// day consumes a protection when one is live; the streak is then
    /// preserved as-is (the protection fills in the missed day, it does not
    /// extend the streak).
    pub fn record_activity(&mut self, now: DateTime<Utc>) -> StreakUpdate {
        let today = self.local_date(now);

        let update = match self.state.last_active_date {
            Some(last) if last >= today => return StreakUpdate::AlreadyCountedToday,
            Some(last) if (today - last).num_days() == 1 => {
                self.state.current_streak += 1;
                StreakUpdate::Extended {
                    current_streak: self.state.current_streak,
                }
            }
            None => {
                self.state.current_streak = 1;
                StreakUpdate::Started
            }
            Some(_) => match self.use_protection(now, today) {
                Some(protection) => StreakUpdate::Protected {
                    kind: protection.kind,
                    protection_id: protection.id,
                },
                None => {
                    let previous_streak = self.state.current_streak;
                    self.state.current_streak = 1;
                    StreakUpdate::Reset { previous_streak }
                }
            },
        };

        self.state.longest_streak = self.state.longest_streak.max(self.state.current_streak);
        self.state.last_active_date = Some(today);
        update
    }

    /// Consume a protection to cover a missed day, if one is live.
    ///
    /// Selection priority: timeboxed insurance, then weekend pass (only
    /// when `today` is Saturday or Sunday), then the oldest single-use
    /// freeze. Insurance stays active until its own expiry; single-use
    /// kinds are marked inactive.
    pub fn use_protection(&mut self, now: DateTime<Utc>, today: NaiveDate) -> Option<Protection> {
        let is_weekend = matches!(today.weekday(), Weekday::Sat | Weekday::Sun);

        let index = self
            .position_of(now, ProtectionKind::TimeboxedInsurance)
            .or_else(|| {
                if is_weekend {
                    self.position_of(now, ProtectionKind::WeekendPass)
                } else {
                    None
                }
            })
            .or_else(|| self.oldest_freeze(now))?;

        let protection = &mut self.state.protections[index];
        if protection.kind != ProtectionKind::TimeboxedInsurance {
            protection.is_active = false;
        }
        self.state.protections_consumed_count += 1;
        Some(protection.clone())
    }

    /// Purchase/grant a protection from a catalog template.
    pub fn add_protection(
        &mut self,
        template: &ProtectionTemplate,
        now: DateTime<Utc>,
    ) -> Result<Protection, ValidationError> {
        let expires_at = match template.kind {
            ProtectionKind::TimeboxedInsurance => {
                let days = template.duration_days.unwrap_or(0);
                if days == 0 {
                    return Err(ValidationError::InvalidValue {
                        field: "duration_days".into(),
                        message: "timeboxed insurance requires a positive duration".into(),
                    });
                }
                Some(now + Duration::days(i64::from(days)))
            }
            ProtectionKind::SingleUseFreeze | ProtectionKind::WeekendPass => None,
        };

        let protection = Protection {
            id: Uuid::new_v4().to_string(),
            template_id: template.template_id.clone(),
            kind: template.kind,
            purchased_at: now,
            expires_at,
            is_active: true,
        };
        self.state.protections.push(protection.clone());
        Ok(protection)
    }

    /// Live protections for display. Consumed and expired items stay in
    /// the history but drop out of this view.
    pub fn active_protections(&self, now: DateTime<Utc>) -> Vec<&Protection> {
        self.state
            .protections
            .iter()
            .filter(|p| p.is_live(now))
            .collect()
    }

    /// True once today has no recorded activity and the local time is past
    /// the configured risk hour. Drives external reminder scheduling only.
    pub fn is_at_risk(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset());
        if self.state.last_active_date == Some(local.date_naive()) {
            return false;
        }
        local.hour() >= self.config.risk_hour
    }

    /// Whole hours (ceiling) until the local midnight that would turn
    /// today into a missed day. Consumed by the external notification
    /// scheduler.
    pub fn hours_until_loss(&self, now: DateTime<Utc>) -> i64 {
        let local = now.with_timezone(&self.offset()).naive_local();
        let midnight = match local.date().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)) {
            Some(m) => m,
            None => return 0,
        };
        let minutes = (midnight - local).num_minutes().max(0);
        (minutes + 59) / 60
    }

    /// Local calendar date of `now` under the configured offset.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset()).date_naive()
    }

    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.config.timezone_offset_hours * 3600)
            .unwrap_or(FixedOffset::east_opt(0).unwrap())
    }

    fn position_of(&self, now: DateTime<Utc>, kind: ProtectionKind) -> Option<usize> {
        self.state
            .protections
            .iter()
            .position(|p| p.kind == kind && p.is_live(now))
    }

    fn oldest_freeze(&self, now: DateTime<Utc>) -> Option<usize> {
        self.state
            .protections
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == ProtectionKind::SingleUseFreeze && p.is_live(now))
            .min_by_key(|(_, p)| p.purchased_at)
            .map(|(index, _)| index)
    }
}

impl Default for StreakTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2026-03-02 is a Monday.
    fn monday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    #[test]
    fn first_activity_starts_streak() {
        let mut tracker = StreakTracker::new();
        assert_eq!(tracker.record_activity(monday_noon()), StreakUpdate::Started);
        assert_eq!(tracker.state().current_streak, 1);
        assert_eq!(tracker.state().longest_streak, 1);
    }

    #[test]
    fn same_day_is_idempotent() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon());
        let update = tracker.record_activity(monday_noon() + Duration::hours(5));
        assert_eq!(update, StreakUpdate::AlreadyCountedToday);
        assert_eq!(tracker.state().current_streak, 1);
    }

    #[test]
    fn consecutive_days_extend() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon());
        let update = tracker.record_activity(monday_noon() + days(1));
        assert_eq!(update, StreakUpdate::Extended { current_streak: 2 });
        tracker.record_activity(monday_noon() + days(2));
        assert_eq!(tracker.state().current_streak, 3);
        assert_eq!(tracker.state().longest_streak, 3);
    }

    #[test]
    fn midnight_boundary_counts_as_two_days() {
        let mut tracker = StreakTracker::new();
        // 23:59 local, then 00:01 the next day: two consecutive days.
        tracker.record_activity(Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 0).unwrap());
        let update =
            tracker.record_activity(Utc.with_ymd_and_hms(2026, 3, 3, 0, 1, 0).unwrap());
        assert_eq!(update, StreakUpdate::Extended { current_streak: 2 });
    }

    #[test]
    fn gap_without_protection_resets() {
        let mut tracker = StreakTracker::new();
        for i in 0..5 {
            tracker.record_activity(monday_noon() + days(i));
        }
        assert_eq!(tracker.state().current_streak, 5);

        let update = tracker.record_activity(monday_noon() + days(6));
        assert_eq!(update, StreakUpdate::Reset { previous_streak: 5 });
        assert_eq!(tracker.state().current_streak, 1);
        assert_eq!(tracker.state().longest_streak, 5);
    }

    #[test]
    fn freeze_preserves_streak_unchanged() {
        let mut tracker = StreakTracker::new();
        for i in 0..5 {
            tracker.record_activity(monday_noon() + days(i));
        }
        tracker
            .add_protection(&ProtectionTemplate::freeze("freeze"), monday_noon() + days(4))
            .unwrap();

        // One missed day, then activity again.
        let update = tracker.record_activity(monday_noon() + days(6));
        match update {
            StreakUpdate::Protected { kind, .. } => {
                assert_eq!(kind, ProtectionKind::SingleUseFreeze)
            }
            other => panic!("expected Protected, got {other:?}"),
        }
        // Preserved: neither reset nor incremented.
        assert_eq!(tracker.state().current_streak, 5);
        assert_eq!(tracker.state().protections_consumed_count, 1);

        // The freeze is spent.
        assert!(tracker
            .active_protections(monday_noon() + days(6))
            .is_empty());
    }

    #[test]
    fn insurance_outranks_freeze_and_survives_use() {
        let mut tracker = StreakTracker::new();
        for i in 0..3 {
            tracker.record_activity(monday_noon() + days(i));
        }
        tracker
            .add_protection(&ProtectionTemplate::freeze("freeze"), monday_noon())
            .unwrap();
        tracker
            .add_protection(
                &ProtectionTemplate::insurance("insurance", 14),
                monday_noon() + days(2),
            )
            .unwrap();

        let update = tracker.record_activity(monday_noon() + days(4));
        match update {
            StreakUpdate::Protected { kind, .. } => {
                assert_eq!(kind, ProtectionKind::TimeboxedInsurance)
            }
            other => panic!("expected Protected, got {other:?}"),
        }
        // Insurance is reusable: both items are still live.
        assert_eq!(
            tracker.active_protections(monday_noon() + days(4)).len(),
            2
        );

        // A second gap within the coverage window is absorbed again.
        let update = tracker.record_activity(monday_noon() + days(6));
        assert!(matches!(update, StreakUpdate::Protected { .. }));
        assert_eq!(tracker.state().current_streak, 3);
        assert_eq!(tracker.state().protections_consumed_count, 2);
    }

    #[test]
    fn expired_insurance_falls_back_to_freeze() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon());
        tracker.record_activity(monday_noon() + days(1));
        tracker
            .add_protection(&ProtectionTemplate::insurance("insurance", 1), monday_noon())
            .unwrap();
        tracker
            .add_protection(&ProtectionTemplate::freeze("freeze"), monday_noon())
            .unwrap();

        // Gap detected well after the insurance expired.
        let update = tracker.record_activity(monday_noon() + days(3));
        match update {
            StreakUpdate::Protected { kind, .. } => {
                assert_eq!(kind, ProtectionKind::SingleUseFreeze)
            }
            other => panic!("expected Protected, got {other:?}"),
        }
    }

    #[test]
    fn weekend_pass_covers_weekend_gaps_only() {
        let mut tracker = StreakTracker::new();
        // Friday 2026-03-06.
        let friday = Utc.with_ymd_and_hms(2026, 3, 6, 12, 0, 0).unwrap();
        tracker.record_activity(friday - days(1));
        tracker.record_activity(friday);
        tracker
            .add_protection(&ProtectionTemplate::weekend_pass("weekend"), friday)
            .unwrap();

        // Missed Saturday, active on Sunday: pass applies.
        let update = tracker.record_activity(friday + days(2));
        match update {
            StreakUpdate::Protected { kind, .. } => assert_eq!(kind, ProtectionKind::WeekendPass),
            other => panic!("expected Protected, got {other:?}"),
        }
        assert_eq!(tracker.state().current_streak, 2);
    }

    #[test]
    fn weekend_pass_ignored_on_weekdays() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon());
        tracker.record_activity(monday_noon() + days(1));
        tracker
            .add_protection(&ProtectionTemplate::weekend_pass("weekend"), monday_noon())
            .unwrap();

        // Gap lands on Thursday: pass must not apply.
        let update = tracker.record_activity(monday_noon() + days(3));
        assert_eq!(update, StreakUpdate::Reset { previous_streak: 2 });
        // The pass is still unspent.
        assert_eq!(
            tracker.active_protections(monday_noon() + days(3)).len(),
            1
        );
    }

    #[test]
    fn oldest_freeze_spent_first() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon());
        tracker.record_activity(monday_noon() + days(1));
        let old = tracker
            .add_protection(&ProtectionTemplate::freeze("freeze"), monday_noon())
            .unwrap();
        tracker
            .add_protection(&ProtectionTemplate::freeze("freeze"), monday_noon() + days(1))
            .unwrap();

        let update = tracker.record_activity(monday_noon() + days(3));
        match update {
            StreakUpdate::Protected { protection_id, .. } => assert_eq!(protection_id, old.id),
            other => panic!("expected Protected, got {other:?}"),
        }
    }

    #[test]
    fn late_purchase_does_not_repair_lapse() {
        let mut tracker = StreakTracker::new();
        for i in 0..4 {
            tracker.record_activity(monday_noon() + days(i));
        }
        // Lapse first, then buy a freeze.
        let update = tracker.record_activity(monday_noon() + days(6));
        assert_eq!(update, StreakUpdate::Reset { previous_streak: 4 });
        tracker
            .add_protection(&ProtectionTemplate::freeze("freeze"), monday_noon() + days(6))
            .unwrap();
        assert_eq!(tracker.state().current_streak, 1);
    }

    #[test]
    fn invalid_insurance_duration_rejected() {
        let mut tracker = StreakTracker::new();
        let err = tracker
            .add_protection(&ProtectionTemplate::insurance("insurance", 0), monday_noon())
            .unwrap_err();
        assert!(err.to_string().contains("duration"));
        assert!(tracker.state().protections.is_empty());
    }

    #[test]
    fn risk_detection_after_risk_hour() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon());

        let tuesday_morning = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
        let tuesday_evening = Utc.with_ymd_and_hms(2026, 3, 3, 19, 0, 0).unwrap();
        assert!(!tracker.is_at_risk(tuesday_morning));
        assert!(tracker.is_at_risk(tuesday_evening));

        // Not at risk once today's activity is in.
        tracker.record_activity(tuesday_morning);
        assert!(!tracker.is_at_risk(tuesday_evening));
    }

    #[test]
    fn hours_until_loss_counts_to_midnight() {
        let tracker = StreakTracker::new();
        let at_2100 = Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap();
        assert_eq!(tracker.hours_until_loss(at_2100), 3);
        let at_2330 = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        assert_eq!(tracker.hours_until_loss(at_2330), 1);
    }

    #[test]
    fn timezone_offset_shifts_day_boundary() {
        let mut tracker = StreakTracker::with_config(StreakConfig {
            risk_hour: 18,
            timezone_offset_hours: 9,
        });
        // 16:00 UTC on March 2nd is already March 3rd 01:00 at UTC+9.
        let utc_afternoon = Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap();
        assert_eq!(
            tracker.local_date(utc_afternoon),
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
        );

        tracker.record_activity(Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap());
        let update = tracker.record_activity(utc_afternoon);
        assert_eq!(update, StreakUpdate::Extended { current_streak: 2 });
    }

    #[test]
    fn backwards_date_is_a_no_op() {
        let mut tracker = StreakTracker::new();
        tracker.record_activity(monday_noon() + days(1));
        // Device clock rolled back a day: no update, no rollback of state.
        let update = tracker.record_activity(monday_noon());
        assert_eq!(update, StreakUpdate::AlreadyCountedToday);
        assert_eq!(
            tracker.state().last_active_date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap())
        );
    }
}
