use clap::Subcommand;
use lexiquest_core::ProtectionTemplate;

use super::{open_engine, print_events};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Record today's learning activity
    Activity,
    /// Print the streak snapshot and risk queries
    Status,
    /// Grant a streak protection item
    Protect {
        /// Protection kind: freeze | insurance | weekend
        #[arg(long)]
        kind: String,
        /// Coverage window in days (insurance only)
        #[arg(long)]
        days: Option<u32>,
        /// Catalog template id
        #[arg(long, default_value = "cli-grant")]
        template_id: String,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        StreakAction::Activity => {
            let update = engine.record_activity()?;
            println!("{}", serde_json::to_string_pretty(&update)?);
        }
        StreakAction::Status => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "streak": engine.streak_state(),
                    "at_risk": engine.streak_at_risk(),
                    "hours_until_loss": engine.hours_until_streak_loss(),
                }))?
            );
        }
        StreakAction::Protect {
            kind,
            days,
            template_id,
        } => {
            let template = match kind.as_str() {
                "freeze" => ProtectionTemplate::freeze(template_id),
                "insurance" => {
                    let days = days.ok_or("--days is required for insurance")?;
                    ProtectionTemplate::insurance(template_id, days)
                }
                "weekend" => ProtectionTemplate::weekend_pass(template_id),
                other => return Err(format!("unknown protection kind: {other}").into()),
            };
            let protection = engine.add_protection(&template)?;
            println!("{}", serde_json::to_string_pretty(&protection)?);
        }
    }
    print_events(&engine.drain_events())
}
