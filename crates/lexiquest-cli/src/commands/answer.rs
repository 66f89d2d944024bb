use clap::Subcommand;

use super::{open_engine, print_events};

#[derive(Subcommand)]
pub enum AnswerAction {
    /// Record a correct answer (extends the combo)
    Correct,
    /// Record an incorrect answer (breaks the combo)
    Incorrect,
    /// Reset the combo to the zero state
    Reset,
}

pub fn run(action: AnswerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        AnswerAction::Correct => {
            let outcome = engine.record_correct_answer()?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        AnswerAction::Incorrect => {
            engine.record_incorrect_answer()?;
            println!("{}", serde_json::to_string_pretty(engine.combo_state())?);
        }
        AnswerAction::Reset => {
            engine.reset_combo()?;
            println!("{}", serde_json::to_string_pretty(engine.combo_state())?);
        }
    }
    print_events(&engine.drain_events())
}
