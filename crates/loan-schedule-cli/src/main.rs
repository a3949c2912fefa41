mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::loans::{InspectArgs, RecordArgs, ScheduleArgs, ValidateArgs};

/// Employee loan repayment schedules
#[derive(Parser)]
#[command(
    name = "loansched",
    version,
    about = "Employee loan repayment schedules",
    long_about = "Calculates flat-interest employee loan repayment schedules with decimal \
                  precision. Supports fixed installment amounts or fixed installment counts, \
                  per-installment breakdowns, and loan records for storage."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log validation and calculation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a repayment schedule
    Schedule(ScheduleArgs),
    /// Check raw loan form input and list every problem
    Validate(ValidateArgs),
    /// Show the breakdown of one installment
    Inspect(InspectArgs),
    /// Build the loan record handed to storage
    Record(RecordArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::loans::run_schedule(args),
        Commands::Validate(args) => commands::loans::run_validate(args),
        Commands::Inspect(args) => commands::loans::run_inspect(args),
        Commands::Record(args) => commands::loans::run_record(args),
        Commands::Version => {
            println!("loansched {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
