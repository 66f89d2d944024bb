pub mod answer;
pub mod boost;
pub mod config;
pub mod lesson;
pub mod stats;
pub mod status;
pub mod streak;

use lexiquest_core::{Database, EngineConfig, Event, RewardEngine, SystemClock};

/// Open the engine over the on-disk database and config.
pub fn open_engine() -> Result<RewardEngine, Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    let db = Database::open()?;
    Ok(RewardEngine::load(
        Box::new(db),
        Box::new(SystemClock),
        config,
    ))
}

/// Print engine events to stderr, one JSON object per line.
pub fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        eprintln!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
