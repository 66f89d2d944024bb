//! Session reward engine.
//!
//! One [`RewardEngine`] instance exists per active user session. It owns
//! the three trackers, a [`Clock`], and a [`SnapshotStore`], and is the
//! single write path the app's lesson flow talks to. Snapshots are loaded
//! on construction (corrupt or missing data silently yields fresh state)
//! and the owning tracker's snapshot is saved after every mutation.
//!
//! A failed save is reported as a recoverable error; the in-memory state
//! has already been updated and stays correct for the rest of the
//! session. The next successful save reconciles.

use crate::boost::{Boost, BoostInventory, BoostState, BoostTemplate};
use crate::clock::Clock;
use crate::combo::{AnswerOutcome, ComboState, ComboTracker};
use crate::error::Result;
use crate::events::Event;
use crate::reward::{AwardBreakdown, RewardCalculator};
use crate::storage::{EngineConfig, SnapshotStore};
use crate::streak::{Protection, ProtectionTemplate, StreakState, StreakTracker, StreakUpdate};

use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Snapshot keys, one per tracker.
pub const COMBO_STATE_KEY: &str = "combo_state";
pub const BOOST_STATE_KEY: &str = "boost_state";
pub const STREAK_STATE_KEY: &str = "streak_state";

/// The gamification reward engine for one user session.
pub struct RewardEngine {
    combo: ComboTracker,
    boosts: BoostInventory,
    streak: StreakTracker,
    calculator: RewardCalculator,
    clock: Box<dyn Clock>,
    store: Box<dyn SnapshotStore>,
    pending_events: Vec<Event>,
}

impl RewardEngine {
    /// Build an engine over `store`, restoring each tracker from its
    /// persisted snapshot. Missing or corrupt snapshots default-initialize;
    /// a cold start is never an error.
    pub fn load(store: Box<dyn SnapshotStore>, clock: Box<dyn Clock>, config: EngineConfig) -> Self {
        let combo_state: ComboState = load_snapshot(store.as_ref(), COMBO_STATE_KEY);
        let boost_state: BoostState = load_snapshot(store.as_ref(), BOOST_STATE_KEY);
        let streak_state: StreakState = load_snapshot(store.as_ref(), STREAK_STATE_KEY);

        Self {
            combo: ComboTracker::from_state(combo_state, config.combo),
            boosts: BoostInventory::from_state(boost_state, config.boost),
            streak: StreakTracker::from_state(streak_state, config.streak),
            calculator: RewardCalculator::new(),
            clock,
            store,
            pending_events: Vec::new(),
        }
    }

    // ── Event intake ─────────────────────────────────────────────────

    /// Record a correct answer: extends (or restarts) the combo.
    pub fn record_correct_answer(&mut self) -> Result<AnswerOutcome> {
        let now = self.clock.now();
        let previous_combo = self.combo.state().current_combo;
        let outcome = self.combo.record_correct_answer(now);

        if outcome.combo_expired {
            self.pending_events.push(Event::ComboExpired {
                previous_combo,
                at: now,
            });
        }
        self.pending_events.push(Event::AnswerRecorded {
            correct: true,
            combo: outcome.combo,
            multiplier: outcome.multiplier,
            at: now,
        });
        if outcome.tier_changed
            && outcome.current_tier.threshold > outcome.previous_tier.threshold
        {
            self.pending_events.push(Event::TierReached {
                label: outcome.current_tier.label.to_string(),
                threshold: outcome.current_tier.threshold,
                multiplier: outcome.current_tier.multiplier,
                at: now,
            });
        }

        self.save_snapshot(COMBO_STATE_KEY, self.combo.state())?;
        Ok(outcome)
    }

    /// Record an incorrect answer: breaks the combo.
    pub fn record_incorrect_answer(&mut self) -> Result<()> {
        let now = self.clock.now();
        let broken = self.combo.record_incorrect_answer(now);

        if broken > 0 {
            self.pending_events.push(Event::ComboBroken {
                previous_combo: broken,
                at: now,
            });
        }
        self.pending_events.push(Event::AnswerRecorded {
            correct: false,
            combo: 0,
            multiplier: 1.0,
            at: now,
        });

        self.save_snapshot(COMBO_STATE_KEY, self.combo.state())
    }

    /// Record a day's learning activity for streak continuity.
    pub fn record_activity(&mut self) -> Result<StreakUpdate> {
        let now = self.clock.now();
        let update = self.streak.record_activity(now);

        match &update {
            StreakUpdate::Started => self.pending_events.push(Event::StreakStarted { at: now }),
            StreakUpdate::Extended { current_streak } => {
                self.pending_events.push(Event::StreakExtended {
                    current_streak: *current_streak,
                    at: now,
                })
            }
            StreakUpdate::Protected {
                kind,
                protection_id,
            } => self.pending_events.push(Event::StreakProtected {
                kind: *kind,
                protection_id: protection_id.clone(),
                at: now,
            }),
            StreakUpdate::Reset { previous_streak } => {
                self.pending_events.push(Event::StreakReset {
                    previous_streak: *previous_streak,
                    at: now,
                })
            }
            StreakUpdate::AlreadyCountedToday => {}
        }

        self.save_snapshot(STREAK_STATE_KEY, self.streak.state())?;
        Ok(update)
    }

    /// Activate a boost from an already-resolved catalog template.
    pub fn activate_boost(&mut self, template: &BoostTemplate) -> Result<Boost> {
        let now = self.clock.now();
        let boost = self.boosts.activate(template, now)?;

        self.pending_events.push(Event::BoostActivated {
            boost_id: boost.id.clone(),
            template_id: boost.template_id.clone(),
            kind: boost.kind,
            multiplier: boost.multiplier,
            at: now,
        });

        self.save_snapshot(BOOST_STATE_KEY, self.boosts.state())?;
        Ok(boost)
    }

    /// Consume one lesson worth of usage from usage-based boosts.
    /// Call exactly once per lesson completion.
    pub fn consume_one_lesson_usage(&mut self) -> Result<()> {
        self.boosts.consume_one_lesson_usage();
        self.save_snapshot(BOOST_STATE_KEY, self.boosts.state())
    }

    /// Grant a streak protection from an already-resolved catalog template.
    pub fn add_protection(&mut self, template: &ProtectionTemplate) -> Result<Protection> {
        let now = self.clock.now();
        let protection = self.streak.add_protection(template, now)?;
        self.save_snapshot(STREAK_STATE_KEY, self.streak.state())?;
        Ok(protection)
    }

    /// Explicit user reset of the combo to the zero state.
    pub fn reset_combo(&mut self) -> Result<()> {
        self.combo.reset();
        self.save_snapshot(COMBO_STATE_KEY, self.combo.state())
    }

    /// Compute the final XP for `base_xp`, combining the combo multiplier
    /// with all live boost multipliers.
    ///
    /// The single XP-computation entry point: combo and boost progression
    /// are not mutated here, but the boost share of the bonus is accounted
    /// into the inventory's audit counter.
    pub fn award_xp(&mut self, base_xp: u32) -> Result<AwardBreakdown> {
        let now = self.clock.now();

        for expired in self.boosts.evict_expired(now) {
            self.pending_events.push(Event::BoostExpired {
                boost_id: expired.id,
                template_id: expired.template_id,
                at: now,
            });
        }

        let breakdown = self
            .calculator
            .award(base_xp, now, &self.combo, &mut self.boosts);

        let combo_only = (f64::from(base_xp) * breakdown.combo_multiplier).floor() as u64;
        let boost_share = breakdown.final_xp.saturating_sub(combo_only);
        if boost_share > 0 {
            self.boosts.record_boosted_xp(boost_share);
        }

        self.pending_events.push(Event::XpAwarded {
            base_xp,
            final_xp: breakdown.final_xp,
            total_multiplier: breakdown.total_multiplier,
            at: now,
        });

        self.save_snapshot(BOOST_STATE_KEY, self.boosts.state())?;
        Ok(breakdown)
    }

    // ── Snapshot getters & derived queries ───────────────────────────

    pub fn combo_state(&self) -> &ComboState {
        self.combo.state()
    }

    pub fn boost_state(&self) -> &BoostState {
        self.boosts.state()
    }

    pub fn streak_state(&self) -> &StreakState {
        self.streak.state()
    }

    pub fn last_award(&self) -> Option<&AwardBreakdown> {
        self.calculator.last_award()
    }

    /// Live boosts at the current instant, evicting dead ones.
    pub fn active_boosts(&mut self) -> Vec<Boost> {
        let now = self.clock.now();
        self.boosts.list_active(now).to_vec()
    }

    /// Current combo tier (celebration label and multiplier).
    pub fn combo_tier(&self) -> crate::combo::ComboTier {
        self.combo.current_tier()
    }

    /// Next combo tier, or `None` at the top.
    pub fn next_combo_tier(&self) -> Option<crate::combo::ComboTier> {
        self.combo.next_tier()
    }

    /// Time left before the combo expires.
    pub fn combo_time_remaining(&self) -> Duration {
        self.combo.time_remaining(self.clock.now())
    }

    /// True when the combo is alive but close to expiring.
    pub fn combo_at_risk(&self) -> bool {
        self.combo.is_at_risk(self.clock.now())
    }

    /// True when today has no activity and the local risk hour has passed.
    pub fn streak_at_risk(&self) -> bool {
        self.streak.is_at_risk(self.clock.now())
    }

    /// Hours until the local midnight that would break the streak.
    pub fn hours_until_streak_loss(&self) -> i64 {
        self.streak.hours_until_loss(self.clock.now())
    }

    /// Drain events accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn save_snapshot<T: Serialize>(&self, key: &str, state: &T) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.store.save(key, &json)?;
        Ok(())
    }
}

fn load_snapshot<T: DeserializeOwned + Default>(store: &dyn SnapshotStore, key: &str) -> T {
    match store.load(key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_default(),
        _ => T::default(),
    }
}
