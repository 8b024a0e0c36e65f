mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::portfolio_optimization::{AllocateArgs, CovarianceArgs, MetricsArgs, OptimizeArgs};

/// Sharpe-maximising portfolio weight optimizer
#[derive(Parser)]
#[command(
    name = "qpo",
    version,
    about = "Sharpe-maximising portfolio weight optimizer",
    long_about = "Computes long-only portfolio weights that maximise the Sharpe ratio under \
                  per-asset weight bounds, using constrained gradient descent with a decaying \
                  step size and a constant-correlation covariance model. All arithmetic is \
                  decimal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log optimizer progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize weights for maximum Sharpe ratio
    Optimize(OptimizeArgs),
    /// Expected return, volatility and Sharpe ratio of given weights
    Metrics(MetricsArgs),
    /// Constant-correlation covariance matrix of the assets
    Covariance(CovarianceArgs),
    /// Allocation breakdown (contributions, values, units) for given weights
    Allocate(AllocateArgs),
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

fn main() {
    let cli = Cli::parse();
    let timing = matches!(&cli.command, Commands::Optimize(args) if args.timing);
    logging::init(cli.verbose, timing);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Optimize(args) => commands::portfolio_optimization::run_optimize(args),
        Commands::Metrics(args) => commands::portfolio_optimization::run_metrics(args),
        Commands::Covariance(args) => commands::portfolio_optimization::run_covariance(args),
        Commands::Allocate(args) => commands::portfolio_optimization::run_allocate(args),
        Commands::Version => {
            println!("qpo {}", env!("CARGO_PKG_VERSION"));
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
