//! Engine events.
//!
//! Every state change in the reward engine produces an [`Event`]. The UI
//! drains them for celebrations and toasts; analytics can subscribe to the
//! same stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::boost::BoostKind;
use crate::streak::ProtectionKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AnswerRecorded {
        correct: bool,
        combo: u32,
        multiplier: f64,
        at: DateTime<Utc>,
    },
    /// The combo crossed into a higher tier (celebration trigger).
    TierReached {
        label: String,
        threshold: u32,
        multiplier: f64,
        at: DateTime<Utc>,
    },
    /// The previous combo had timed out when the answer arrived.
    ComboExpired {
        previous_combo: u32,
        at: DateTime<Utc>,
    },
    /// An incorrect answer broke an active combo.
    ComboBroken {
        previous_combo: u32,
        at: DateTime<Utc>,
    },
    BoostActivated {
        boost_id: String,
        template_id: String,
        kind: BoostKind,
        multiplier: f64,
        at: DateTime<Utc>,
    },
    /// A boost dropped out of the active set during lazy eviction.
    BoostExpired {
        boost_id: String,
        template_id: String,
        at: DateTime<Utc>,
    },
    StreakStarted {
        at: DateTime<Utc>,
    },
    StreakExtended {
        current_streak: u32,
        at: DateTime<Utc>,
    },
    /// A missed day was covered by a protection.
    StreakProtected {
        kind: ProtectionKind,
        protection_id: String,
        at: DateTime<Utc>,
    },
    StreakReset {
        previous_streak: u32,
        at: DateTime<Utc>,
    },
    XpAwarded {
        base_xp: u32,
        final_xp: u64,
        total_multiplier: f64,
        at: DateTime<Utc>,
    },
}
