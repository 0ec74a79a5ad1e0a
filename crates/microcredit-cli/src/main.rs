mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::lending::{AmortizeArgs, ProductQuoteArgs, ValidateLoanArgs};
use commands::underwriting::UnderwriteArgs;

/// Loan quotes and automated underwriting for small-business micro-credit
#[derive(Parser)]
#[command(
    name = "mcl",
    version,
    about = "Loan quotes and automated underwriting for small-business micro-credit",
    long_about = "A CLI for level-payment loan schedules, product-bound quotes and \
                  banded underwriting scores with decimal precision. Inputs come from \
                  flags, a JSON file (--input) or piped stdin; policy tables can be \
                  replaced with a YAML or JSON file (--policy)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Policy file (YAML or JSON) overriding limits, products and scoring tables
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Log computation details to stderr (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the payment and amortization schedule for a loan
    Amortize(AmortizeArgs),
    /// Quote a loan under one of the catalog products
    ProductQuote(ProductQuoteArgs),
    /// List the loan products on offer
    Products,
    /// Check loan terms against the lending limits and list every problem
    ValidateLoan(ValidateLoanArgs),
    /// Score a loan application and recommend a decision
    Underwrite(UnderwriteArgs),
    /// Print the published underwriting guidelines
    Guidelines,
    /// Print the effective policy (defaults merged with --policy)
    Policy,
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
    logging::init_tracing(cli.verbose);

    if let Commands::Version = cli.command {
        println!("mcl {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let policy = match input::policy::load_policy(cli.policy.as_deref()) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::lending::run_amortize(args, &policy),
        Commands::ProductQuote(args) => commands::lending::run_product_quote(args, &policy),
        Commands::Products => commands::lending::run_products(&policy),
        Commands::ValidateLoan(args) => commands::lending::run_validate_loan(args, &policy),
        Commands::Underwrite(args) => commands::underwriting::run_underwrite(args, &policy),
        Commands::Guidelines => commands::underwriting::run_guidelines(&policy),
        Commands::Policy => serde_json::to_value(&policy).map_err(Into::into),
        Commands::Version => unreachable!("handled before policy load"),
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
