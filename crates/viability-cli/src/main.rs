mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::grade::GradeArgs;
use commands::schedule::ScheduleArgs;
use commands::InputArgs;

/// Investment financial viability analysis
#[derive(Parser)]
#[command(
    name = "viability",
    version,
    about = "Investment financial viability analysis",
    long_about = "Projects an investment's cash flows and debt service with decimal \
                  precision, then reports NPV, IRR, payback, ROI, PI, MIRR, DSCR, \
                  scenario and sensitivity analyses, and an investment grade."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (YAML or JSON); defaults apply when absent
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: cash flows, metrics, DSCR, scenarios and sensitivity
    Analyze(InputArgs),
    /// Grade an investment with the additive and/or scale-weighted grader
    Grade(GradeArgs),
    /// Compare pessimistic, base and optimistic scenarios
    Scenarios(InputArgs),
    /// One-at-a-time sensitivity of NPV, IRR and DSCR
    Sensitivity(InputArgs),
    /// Amortization schedule for a single loan tranche
    Schedule(ScheduleArgs),
    /// Year-by-year free cash flow projection only
    Cashflows(InputArgs),
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
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match input::config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analysis::run_analyze(args, &config),
        Commands::Grade(args) => commands::grade::run_grade(args, &config),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args, &config),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args, &config),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Cashflows(args) => commands::analysis::run_cashflows(args, &config),
        Commands::Version => {
            println!("viability {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
