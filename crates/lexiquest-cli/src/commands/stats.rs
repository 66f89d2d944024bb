use clap::Subcommand;
use lexiquest_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time and today's XP totals
    Totals,
    /// Recent award history, newest first
    Recent {
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Totals => {
            let stats = db.stats_all()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let awards = db.recent_awards(limit)?;
            println!("{}", serde_json::to_string_pretty(&awards)?);
        }
    }
    Ok(())
}
