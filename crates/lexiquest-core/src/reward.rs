//! XP award composition.
//!
//! The single path by which combo and boosts affect XP. The calculator is
//! a pure function over the two trackers' current states plus a base
//! amount; it records nothing but the most recent breakdown and never
//! mutates combo or boost progression (boost eviction on read is the one
//! cleanup side effect).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::boost::BoostInventory;
use crate::combo::ComboTracker;

/// Full breakdown of one XP award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardBreakdown {
    pub base_xp: u32,
    /// `floor(base_xp * total_multiplier)`.
    pub final_xp: u64,
    pub combo_multiplier: f64,
    pub boost_multiplier: f64,
    pub total_multiplier: f64,
    /// `final_xp - base_xp`; zero when no multiplier applies, never negative.
    pub bonus_xp: u64,
    pub awarded_at: DateTime<Utc>,
}

/// Composes combo and boost multipliers into final XP awards.
#[derive(Debug, Clone, Default)]
pub struct RewardCalculator {
    last_award: Option<AwardBreakdown>,
}

impl RewardCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the final XP for `base_xp` at `now`.
    ///
    /// Deterministic given identical tracker state and `now`. Callers are
    /// responsible for separately recording answers, activity, and boost
    /// consumption as the corresponding events occur.
    pub fn award(
        &mut self,
        base_xp: u32,
        now: DateTime<Utc>,
        combo: &ComboTracker,
        boosts: &mut BoostInventory,
    ) -> AwardBreakdown {
        let combo_multiplier = combo.current_multiplier(now);
        let boost_multiplier = boosts.current_multiplier(now);
        let total_multiplier = combo_multiplier * boost_multiplier;
        let final_xp = (f64::from(base_xp) * total_multiplier).floor() as u64;
        let bonus_xp = final_xp.saturating_sub(u64::from(base_xp));

        let breakdown = AwardBreakdown {
            base_xp,
            final_xp,
            combo_multiplier,
            boost_multiplier,
            total_multiplier,
            bonus_xp,
            awarded_at: now,
        };
        self.last_award = Some(breakdown.clone());
        breakdown
    }

    /// The most recent breakdown, if any award happened this session.
    pub fn last_award(&self) -> Option<&AwardBreakdown> {
        self.last_award.as_ref()
    }
}
