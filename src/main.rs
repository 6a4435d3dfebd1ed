use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use sales_pipeline::config::{Config, LookupSource};
use sales_pipeline::logging;
use sales_pipeline::pipeline::processing::filter::TransactionFilter;
use sales_pipeline::pipeline::Pipeline;
use sales_pipeline::summary;

#[derive(Parser)]
#[command(name = "sales_pipeline")]
#[command(about = "Cleans, enriches and reports on pipe-delimited sales transactions")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file (default: ./config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: clean, filter, enrich, aggregate, report
    Run(RunArgs),
    /// Run only the cleaning stage and write the validation artifacts
    Clean(IoArgs),
}

#[derive(Args)]
struct IoArgs {
    /// Input sales file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for all output artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Use the local product catalogue instead of the HTTP API
    #[arg(long)]
    offline: bool,

    /// Keep only transactions from this region (case-insensitive)
    #[arg(long)]
    region: Option<String>,

    /// Minimum line amount (quantity × unit price), inclusive
    #[arg(long)]
    min_amount: Option<Decimal>,

    /// Maximum line amount, inclusive
    #[arg(long)]
    max_amount: Option<Decimal>,
}

impl IoArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
    }
}

impl RunArgs {
    fn filter(&self) -> Result<TransactionFilter> {
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount) {
            if min > max {
                bail!("--min-amount {} is greater than --max-amount {}", min, max);
            }
        }
        Ok(TransactionFilter {
            region: self.region.clone(),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    match &cli.command {
        Commands::Run(args) => {
            args.io.apply(&mut config);
            if args.offline {
                config.enrichment.source = LookupSource::Offline;
            }
        }
        Commands::Clean(args) => args.apply(&mut config),
    }

    let log_dir = config.logging.file.then(|| config.logging.dir.clone());
    let _guard = logging::init_logging(log_dir.as_deref(), cli.verbose);
    config.log_source();

    match cli.command {
        Commands::Clean(_) => {
            let pipeline = Pipeline::new(config);
            let outcome = pipeline.clean().await.context("Cleaning stage failed")?;
            summary::print_counts(&outcome.counts);
            info!(
                "Validation artifacts written to {}",
                pipeline.config().output.dir.display()
            );
        }
        Commands::Run(args) => {
            let filter = args.filter()?;
            let lookup = Pipeline::lookup_from_config(&config.enrichment)
                .context("Failed to set up product lookup")?;
            let pipeline = Pipeline::new(config);
            let result = pipeline.run(filter, lookup).await.context("Pipeline run failed")?;
            summary::print_run_summary(&result);
        }
    }

    Ok(())
}
