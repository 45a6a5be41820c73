mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use env_logger::Env;
use std::process;

use commands::forecast::ForecastArgs;
use commands::seed::SeedArgs;
use commands::session::RunArgs;
use commands::valuation::ValuateArgs;
use commands::wacc::WaccArgs;

/// FCFF forecasting, WACC and exit-multiple DCF valuation
#[derive(Parser)]
#[command(
    name = "dcf",
    version,
    about = "FCFF forecasting, WACC and exit-multiple DCF valuation",
    long_about = "A CLI for discounted cash flow valuation with decimal precision. \
                  Forecasts free cash flow to the firm, derives WACC from market capital \
                  structure (optionally pinning the equity weight), and values the \
                  enterprise with an exit-multiple terminal value."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Project revenue through FCFF year by year
    Forecast(ForecastArgs),
    /// Calculate WACC from market capital structure (CAPM cost of equity)
    Wacc(WaccArgs),
    /// Value a forecast with an exit-multiple terminal value
    Valuate(ValuateArgs),
    /// Derive assumptions and capital inputs from reported financials
    Seed(SeedArgs),
    /// Recompute a full session: WACC, forecast and valuation
    Run(RunArgs),
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

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::Wacc(args) => commands::wacc::run_wacc(args),
        Commands::Valuate(args) => commands::valuation::run_valuate(args),
        Commands::Seed(args) => commands::seed::run_seed(args),
        Commands::Run(args) => commands::session::run_session(args),
        Commands::Version => {
            println!("dcf {}", env!("CARGO_PKG_VERSION"));
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
