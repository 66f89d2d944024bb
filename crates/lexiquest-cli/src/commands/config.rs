use clap::Subcommand;
use lexiquest_core::EngineConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Write the active configuration (with defaults filled in) to disk
    Init,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = EngineConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", EngineConfig::path()?.display());
        }
        ConfigAction::Init => {
            let config = EngineConfig::load()?;
            config.save()?;
            println!("{}", EngineConfig::path()?.display());
        }
    }
    Ok(())
}
