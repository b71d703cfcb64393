use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "brewtimer-cli", version, about = "Brewtimer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a recipe's expanded pour/wait timeline
    Timeline(commands::timeline::TimelineArgs),
    /// Show stage, progress, water and flow rate at an elapsed time
    At(commands::timeline::AtArgs),
    /// Brew a recipe live
    Run(commands::timer::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("brewtimer_core=info,brewtimer_cli=info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timeline(args) => commands::timeline::run_timeline(args),
        Commands::At(args) => commands::timeline::run_at(args),
        Commands::Run(args) => commands::timer::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
