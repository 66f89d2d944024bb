//! # LexiQuest Core Library
//!
//! This library provides the gamification reward engine for LexiQuest,
//! a language-learning app. The surrounding app (screens, navigation,
//! notification delivery, backend sync) is a thin layer over this core;
//! everything with state-machine or time-based correctness requirements
//! lives here.
//!
//! ## Architecture
//!
//! - **Trackers**: three independent wall-clock state machines -- the
//!   combo tracker, the boost inventory, and the streak tracker. Every
//!   expiry is computed lazily from stored timestamps at read time; no
//!   operation assumes a background timer fired, so the math is correct
//!   even after the process was suspended for days.
//! - **Reward calculation**: a pure composition of the combo and boost
//!   multipliers over a base XP amount.
//! - **Storage**: SQLite-backed key-value snapshots (one key per tracker)
//!   plus an XP award audit trail, and TOML-based configuration.
//!
//! ## Key Components
//!
//! - [`RewardEngine`]: session facade, the single write path for the app
//! - [`ComboTracker`], [`BoostInventory`], [`StreakTracker`]: the trackers
//! - [`RewardCalculator`]: XP award composition
//! - [`Database`], [`EngineConfig`]: persistence and configuration

pub mod boost;
pub mod clock;
pub mod combo;
pub mod engine;
pub mod error;
pub mod events;
pub mod reward;
pub mod storage;
pub mod streak;

pub use boost::{Boost, BoostInventory, BoostKind, BoostState, BoostTemplate};
pub use clock::{Clock, ManualClock, SystemClock};
pub use combo::{AnswerOutcome, ComboState, ComboTier, ComboTracker, COMBO_TIERS};
pub use engine::{RewardEngine, BOOST_STATE_KEY, COMBO_STATE_KEY, STREAK_STATE_KEY};
pub use error::{ConfigError, EngineError, StorageError, ValidationError};
pub use events::Event;
pub use reward::{AwardBreakdown, RewardCalculator};
pub use storage::{Database, EngineConfig, MemoryStore, SnapshotStore, XpStats};
pub use streak::{
    Protection, ProtectionKind, ProtectionTemplate, StreakState, StreakTracker, StreakUpdate,
};
