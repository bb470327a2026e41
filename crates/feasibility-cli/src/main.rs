mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::production::ProductionRatesArgs;
use commands::projection::ProjectArgs;

/// Financial projections for investment-project feasibility reports
#[derive(Parser)]
#[command(
    name = "fpe",
    version,
    about = "Financial projections for investment-project feasibility reports",
    long_about = "Derives the annual tables of a feasibility study (revenue, cost, VAT, \
                  profit and distribution, loan repayment, project cash flow) and the \
                  summary indicators from a single JSON or YAML project file, with \
                  decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculator progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Production rate per operation year (default ramp-up or from a project)
    ProductionRates(ProductionRatesArgs),
    /// 营业收入估算表
    Revenue(ProjectArgs),
    /// Operating cost, total cost and the purchase and wage detail tables
    Cost(ProjectArgs),
    /// 增值税及附加
    Tax(ProjectArgs),
    /// 利润与利润分配表
    Profit(ProjectArgs),
    /// Loan schedule and 借款还本付息计划表
    Loan(ProjectArgs),
    /// 项目投资现金流量表
    CashFlow(ProjectArgs),
    /// IRR, NPV, payback and summary ratios
    Indicators(ProjectArgs),
    /// Run the full projection
    Project(ProjectArgs),
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
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ProductionRates(args) => commands::production::run_production_rates(args),
        Commands::Revenue(args) => commands::projection::run_revenue(args),
        Commands::Cost(args) => commands::projection::run_cost(args),
        Commands::Tax(args) => commands::projection::run_tax(args),
        Commands::Profit(args) => commands::projection::run_profit(args),
        Commands::Loan(args) => commands::projection::run_loan(args),
        Commands::CashFlow(args) => commands::projection::run_cash_flow(args),
        Commands::Indicators(args) => commands::projection::run_indicators(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Version => {
            println!("fpe {}", env!("CARGO_PKG_VERSION"));
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
