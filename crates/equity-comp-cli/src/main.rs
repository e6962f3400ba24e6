mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::captable::{CaptableArgs, OptionsCaptableArgs};
use commands::expense::{CompanyExpenseArgs, GrantExpenseArgs};
use commands::price::BsPriceArgs;
use commands::vesting::{GrantDetailArgs, VestingScheduleArgs};

/// Equity compensation reporting
#[derive(Parser)]
#[command(
    name = "eqc",
    version,
    about = "Equity compensation reporting with decimal precision",
    long_about = "A CLI for equity compensation reporting over a company snapshot file \
                  (JSON or YAML). Supports ownership and Black-Scholes cap tables, \
                  per-grant vesting schedules and detail records, straight-line expense \
                  amortization, and standalone option pricing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Ownership cap table with per-class allocation
    Captable(CaptableArgs),
    /// Cap table with per-grant Black-Scholes expense columns
    OptionsCaptable(OptionsCaptableArgs),
    /// Tranche-by-tranche vesting schedule for one grant
    VestingSchedule(VestingScheduleArgs),
    /// Full detail record for one grant
    GrantDetail(GrantDetailArgs),
    /// Company-wide monthly expense roll-up
    CompanyExpense(CompanyExpenseArgs),
    /// Monthly expense schedule for one grant
    GrantExpense(GrantExpenseArgs),
    /// Price a European call (Black-Scholes)
    BsPrice(BsPriceArgs),
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

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Captable(args) => commands::captable::run_captable(args),
        Commands::OptionsCaptable(args) => commands::captable::run_options_captable(args),
        Commands::VestingSchedule(args) => commands::vesting::run_vesting_schedule(args),
        Commands::GrantDetail(args) => commands::vesting::run_grant_detail(args),
        Commands::CompanyExpense(args) => commands::expense::run_company_expense(args),
        Commands::GrantExpense(args) => commands::expense::run_grant_expense(args),
        Commands::BsPrice(args) => commands::price::run_bs_price(args),
        Commands::Version => {
            println!("eqc {}", env!("CARGO_PKG_VERSION"));
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
