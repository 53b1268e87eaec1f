//! Falcon IOC Blocker CLI.

use anyhow::Result;
use clap::Parser;
use falcon_ioc_blocker::{loader, Config, FalconClient, IndicatorBlocker};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "falcon-ioc-blocker")]
#[command(about = "Block hashes and detect IPs/domains from an IOC spreadsheet via the Falcon indicator API")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ioc-blocker.yaml")]
    config: PathBuf,

    /// Indicator workbook (overrides input.path)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Load and print indicators without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    info!(config = %args.config.display(), "Loading configuration");
    let mut config = Config::load(&args.config)?;

    if let Some(input) = args.input {
        config.input.path = input;
    }

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    // Load indicators before touching the network
    let batch = loader::load_batch(&config.input)?;

    if args.dry_run {
        info!(indicators = batch.len(), "Dry run, skipping submission");
        return Ok(());
    }

    // Authenticate and submit
    let client = FalconClient::new(config.api.clone())?;
    let blocker = IndicatorBlocker::new(client);

    let summary = blocker.run(&batch).await;
    println!("{}", summary);

    Ok(())
}
