use super::open_engine;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    let active_boosts = engine.active_boosts();

    let status = serde_json::json!({
        "combo": engine.combo_state(),
        "boosts": engine.boost_state(),
        "streak": engine.streak_state(),
        "active_boosts": active_boosts,
        "combo_tier": engine.combo_tier(),
        "next_combo_tier": engine.next_combo_tier(),
        "combo_time_remaining_secs": engine.combo_time_remaining().num_seconds(),
        "combo_at_risk": engine.combo_at_risk(),
        "streak_at_risk": engine.streak_at_risk(),
        "hours_until_streak_loss": engine.hours_until_streak_loss(),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
