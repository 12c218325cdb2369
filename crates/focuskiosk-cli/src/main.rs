use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod console;
mod detector;
mod output;

#[derive(Parser)]
#[command(name = "focuskiosk", version, about = "Presence-aware Pomodoro kiosk")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kiosk
    Run(commands::run::RunArgs),
    /// Settings management
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Break task management
    Tasks {
        #[command(subcommand)]
        action: commands::tasks::TasksAction,
    },
    /// Play or inspect the alarm, chime and preview sounds
    Sound(commands::sound::SoundArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focuskiosk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::run::run(args).map_err(Into::into),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Tasks { action } => commands::tasks::run(action),
        Commands::Sound(args) => commands::sound::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
