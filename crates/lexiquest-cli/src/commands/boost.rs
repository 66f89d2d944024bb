use clap::Subcommand;
use lexiquest_core::BoostTemplate;

use super::{open_engine, print_events};

#[derive(Subcommand)]
pub enum BoostAction {
    /// Activate a boost from resolved catalog parameters
    Activate {
        /// Catalog template id
        #[arg(long)]
        template_id: String,
        /// XP multiplier (must be greater than 1)
        #[arg(long)]
        multiplier: f64,
        /// Duration in minutes (timed boost)
        #[arg(long, conflicts_with = "uses")]
        minutes: Option<u32>,
        /// Lesson uses (usage-based boost)
        #[arg(long)]
        uses: Option<u32>,
    },
    /// List live boosts
    List,
}

pub fn run(action: BoostAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        BoostAction::Activate {
            template_id,
            multiplier,
            minutes,
            uses,
        } => {
            let template = match (minutes, uses) {
                (Some(minutes), None) => BoostTemplate::timed(template_id, multiplier, minutes),
                (None, Some(uses)) => BoostTemplate::usage_based(template_id, multiplier, uses),
                _ => return Err("specify exactly one of --minutes or --uses".into()),
            };
            let boost = engine.activate_boost(&template)?;
            println!("{}", serde_json::to_string_pretty(&boost)?);
        }
        BoostAction::List => {
            let active = engine.active_boosts();
            println!("{}", serde_json::to_string_pretty(&active)?);
        }
    }
    print_events(&engine.drain_events())
}
