use clap::Subcommand;
use lexiquest_core::Database;

use super::{open_engine, print_events};

#[derive(Subcommand)]
pub enum LessonAction {
    /// Complete a lesson: records streak activity, awards XP, and
    /// consumes one use from usage-based boosts
    Complete {
        /// Base XP for the lesson
        #[arg(long, default_value = "10")]
        xp: u32,
    },
}

pub fn run(action: LessonAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        LessonAction::Complete { xp } => {
            let update = engine.record_activity()?;
            let breakdown = engine.award_xp(xp)?;
            engine.consume_one_lesson_usage()?;

            // Append to the on-disk audit trail.
            let history = Database::open()?;
            history.record_award(&breakdown)?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "streak": update,
                    "award": breakdown,
                }))?
            );
        }
    }
    print_events(&engine.drain_events())
}
