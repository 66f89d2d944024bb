//! XP boost inventory.
//!
//! Boosts are time-boxed or usage-boxed multipliers activated from a
//! catalog of templates (the catalog itself lives outside the engine).
//! Active boosts compound by multiplication: a 2x and a 3x boost together
//! yield 6x. Non-live boosts are evicted lazily on every read -- the engine
//! has no background scheduler guarantee, so liveness is always recomputed
//! from stored timestamps and use counts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// How a boost is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostKind {
    /// Expires at a wall-clock instant.
    Timed,
    /// Expires after a number of lesson completions.
    UsageBased,
}

/// An already-resolved catalog entry. Pricing stays in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostTemplate {
    pub template_id: String,
    pub kind: BoostKind,
    pub multiplier: f64,
    /// Duration in minutes; required for `Timed`.
    pub duration_minutes: Option<u32>,
    /// Lesson uses; required for `UsageBased`.
    pub use_count: Option<u32>,
}

impl BoostTemplate {
    pub fn timed(template_id: impl Into<String>, multiplier: f64, duration_minutes: u32) -> Self {
        Self {
            template_id: template_id.into(),
            kind: BoostKind::Timed,
            multiplier,
            duration_minutes: Some(duration_minutes),
            use_count: None,
        }
    }

    pub fn usage_based(template_id: impl Into<String>, multiplier: f64, use_count: u32) -> Self {
        Self {
            template_id: template_id.into(),
            kind: BoostKind::UsageBased,
            multiplier,
            duration_minutes: None,
            use_count: Some(use_count),
        }
    }
}

/// One active multiplier grant. The id is unique per activation, not per
/// template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boost {
    pub id: String,
    pub template_id: String,
    pub kind: BoostKind,
    pub multiplier: f64,
    pub activated_at: DateTime<Utc>,
    /// Present iff `kind == Timed`.
    pub expires_at: Option<DateTime<Utc>>,
    /// Present iff `kind == UsageBased`.
    pub uses_remaining: Option<u32>,
}

impl Boost {
    /// Whether this boost still contributes to the multiplier at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.kind {
            BoostKind::Timed => self.expires_at.map(|e| now < e).unwrap_or(false),
            BoostKind::UsageBased => self.uses_remaining.unwrap_or(0) > 0,
        }
    }

    /// Remaining lifetime for timed boosts, clamped at zero.
    ///
    /// Usage-based boosts are not time-denominated; display
    /// `uses_remaining` for those instead.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|e| (e - now).max(Duration::zero()))
    }
}

/// Persisted boost inventory state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoostState {
    /// Active boosts in insertion order.
    pub active_boosts: Vec<Boost>,
    /// Cumulative bonus XP ever granted via boosts.
    pub total_xp_boosted: u64,
    pub boosts_activated_count: u32,
}

/// Configuration for boost stacking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Optional ceiling on the combined (multiplied) boost product.
    /// `None` leaves stacking unbounded.
    pub combined_multiplier_cap: Option<f64>,
}

/// Manages the set of active XP boosts.
#[derive(Debug, Clone)]
pub struct BoostInventory {
    config: BoostConfig,
    state: BoostState,
}

impl BoostInventory {
    pub fn new() -> Self {
        Self::with_config(BoostConfig::default())
    }

    pub fn with_config(config: BoostConfig) -> Self {
        Self {
            config,
            state: BoostState::default(),
        }
    }

    /// Restore an inventory from a persisted snapshot.
    pub fn from_state(state: BoostState, config: BoostConfig) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &BoostState {
        &self.state
    }

    /// Instantiate a boost from a template and add it to the active set.
    ///
    /// Rejects invalid templates before touching any state.
    pub fn activate(
        &mut self,
        template: &BoostTemplate,
        now: DateTime<Utc>,
    ) -> Result<Boost, ValidationError> {
        if template.multiplier <= 1.0 {
            return Err(ValidationError::InvalidValue {
                field: "multiplier".into(),
                message: format!("must be greater than 1, got {}", template.multiplier),
            });
        }
        let (expires_at, uses_remaining) = match template.kind {
            BoostKind::Timed => {
                let minutes = template.duration_minutes.unwrap_or(0);
                if minutes == 0 {
                    return Err(ValidationError::InvalidValue {
                        field: "duration_minutes".into(),
                        message: "timed boost requires a positive duration".into(),
                    });
                }
                (Some(now + Duration::minutes(i64::from(minutes))), None)
            }
            BoostKind::UsageBased => {
                let uses = template.use_count.unwrap_or(0);
                if uses == 0 {
                    return Err(ValidationError::InvalidValue {
                        field: "use_count".into(),
                        message: "usage-based boost requires a positive use count".into(),
                    });
                }
                (None, Some(uses))
            }
        };

        let boost = Boost {
            id: Uuid::new_v4().to_string(),
            template_id: template.template_id.clone(),
            kind: template.kind,
            multiplier: template.multiplier,
            activated_at: now,
            expires_at,
            uses_remaining,
        };
        self.state.active_boosts.push(boost.clone());
        self.state.boosts_activated_count += 1;
        Ok(boost)
    }

    /// Consume one lesson worth of usage from every live usage-based boost.
    ///
    /// Called exactly once per lesson completion, not per answer.
    pub fn consume_one_lesson_usage(&mut self) {
        for boost in &mut self.state.active_boosts {
            if boost.kind == BoostKind::UsageBased {
                if let Some(uses) = boost.uses_remaining.as_mut() {
                    *uses = uses.saturating_sub(1);
                }
            }
        }
    }

    /// Remove non-live boosts from the active set, returning the evicted
    /// ones so callers can report their expiry.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> Vec<Boost> {
        let mut expired = Vec::new();
        self.state.active_boosts.retain(|boost| {
            if boost.is_live(now) {
                true
            } else {
                expired.push(boost.clone());
                false
            }
        });
        expired
    }

    /// Combined multiplier of all live boosts at `now`.
    ///
    /// Boosts compound multiplicatively; returns 1.0 when none are live.
    pub fn current_multiplier(&mut self, now: DateTime<Utc>) -> f64 {
        self.evict_expired(now);
        let product = self
            .state
            .active_boosts
            .iter()
            .fold(1.0, |acc, boost| acc * boost.multiplier);
        match self.config.combined_multiplier_cap {
            Some(cap) => product.min(cap),
            None => product,
        }
    }

    /// Live boosts for display, after eviction.
    pub fn list_active(&mut self, now: DateTime<Utc>) -> &[Boost] {
        self.evict_expired(now);
        &self.state.active_boosts
    }

    /// Account bonus XP attributed to boosts (audit trail).
    pub fn record_boosted_xp(&mut self, amount: u64) {
        self.state.total_xp_boosted += amount;
    }
}

impl Default for BoostInventory {
    fn default() -> Self {
        Self::new()
    }
}
