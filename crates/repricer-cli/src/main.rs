mod extract;
mod reconcile;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "repricer")]
#[command(about = "Reconcile catalog prices against live marketplace listings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reprice a CSV or XLSX catalog and write the updated ledger plus a
    /// comparison report
    Reconcile(ReconcileArgs),
    /// Fetch one product page and print the extracted title and price
    Extract {
        /// Marketplace identifier, e.g. an ASIN
        identifier: String,
    },
}

#[derive(Debug, Args)]
struct ReconcileArgs {
    /// Catalog file (.csv or .xlsx)
    input: PathBuf,

    /// Where to write the updated ledger [default: updated_<input name>
    /// next to the input]
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Where to write the comparison report; format follows the extension
    #[arg(long, default_value = "price_comparison_report.xlsx")]
    report: PathBuf,

    /// Amount subtracted from the observed price [env: REPRICER_MARKDOWN]
    #[arg(long, value_parser = repricer_core::parse_markdown)]
    markdown: Option<Decimal>,

    /// Maximum concurrent page fetches [env: REPRICER_MAX_CONCURRENT_FETCHES]
    #[arg(long)]
    concurrency: Option<usize>,

    /// Header of the identifier column
    #[arg(long)]
    identifier_column: Option<String>,

    /// Header of the price column
    #[arg(long)]
    price_column: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = repricer_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Reconcile(args) => reconcile::run_reconcile(&config, args).await,
        Commands::Extract { identifier } => extract::run_extract(&config, &identifier).await,
    }
}
