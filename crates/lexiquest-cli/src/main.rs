use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lexiquest-cli", version, about = "LexiQuest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an answer result
    Answer {
        #[command(subcommand)]
        action: commands::answer::AnswerAction,
    },
    /// Lesson lifecycle
    Lesson {
        #[command(subcommand)]
        action: commands::lesson::LessonAction,
    },
    /// XP boost management
    Boost {
        #[command(subcommand)]
        action: commands::boost::BoostAction,
    },
    /// Streak management
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// XP award statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print all tracker snapshots as JSON
    Status,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Answer { action } => commands::answer::run(action),
        Commands::Lesson { action } => commands::lesson::run(action),
        Commands::Boost { action } => commands::boost::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Status => commands::status::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
