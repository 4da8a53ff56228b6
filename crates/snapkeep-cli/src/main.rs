//! snapkeep CLI
//!
//! Command-line interface for snapkeep

use clap::{Parser, Subcommand, ValueEnum};
use snapkeep_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "snapkeep")]
#[command(about = "snapkeep - Snapshot retention and replication", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one snapshot, retention and replication pass
    Run(commands::run::RunArgs),
    /// Validate a configuration file without touching any dataset
    CheckConfig(commands::check_config::CheckConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    init(match cli.log_format {
        LogFormat::Pretty => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::CheckConfig(args) => commands::check_config::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
