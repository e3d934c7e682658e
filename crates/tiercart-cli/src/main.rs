use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tiercart_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod cart;
mod catalog;

#[derive(Debug, Parser)]
#[command(name = "tiercart")]
#[command(about = "Volume-tier cart sync for a Shopify storefront")]
struct Cli {
    /// Catalog file with tier thresholds and per-tier variants
    /// [default: TIERCART_CATALOG_PATH or ./config/catalog.yaml]
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Print cart state as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the current cart
    Show,
    /// Add a variant to the cart
    Add {
        variant_id: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
        /// Selling plan for a subscription purchase
        #[arg(long)]
        selling_plan: Option<String>,
        /// Attribution source (e.g. newsletter)
        #[arg(long)]
        source: Option<String>,
        /// Attribution campaign
        #[arg(long)]
        campaign: Option<String>,
    },
    /// Set a line's quantity (0 removes it)
    Update { line_id: String, qty: u32 },
    /// Remove a line
    Remove { line_id: String },
    /// Forget the current cart locally
    Clear,
    /// Print the tier a total volume earns
    Tier { volume: u32 },
    /// Validate the catalog file and print a summary
    Catalog,
}

const DEFAULT_CATALOG_PATH: &str = "./config/catalog.yaml";

/// The `--catalog` flag wins over the configured path.
fn resolve_catalog(flag: Option<PathBuf>, config: Option<&AppConfig>) -> PathBuf {
    flag.or_else(|| config.map(|c| c.catalog_path.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // `tier` and `catalog` work without storefront credentials, so a
    // configuration error only surfaces once a cart command needs it.
    let config = tiercart_core::load_app_config_from_env();
    let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = resolve_catalog(cli.catalog, config.as_ref().ok());
    if let Err(e) = &config {
        tracing::debug!(error = %e, "configuration unavailable");
    }

    match cli.command {
        Commands::Tier { volume } => catalog::run_tier(&catalog, volume),
        Commands::Catalog => catalog::run_catalog(&catalog),
        Commands::Clear => {
            let mut store = cart::build_store(config, &catalog)?;
            store.clear_cart();
            println!("cart cleared");
            Ok(())
        }
        Commands::Show => {
            let mut store = cart::build_store(config, &catalog)?;
            store.hydrate().await;
            cart::print_state(&store.snapshot(), cli.json)
        }
        Commands::Add {
            variant_id,
            qty,
            selling_plan,
            source,
            campaign,
        } => {
            let mut store = cart::build_store(config, &catalog)?;
            store.hydrate().await;
            let attribution = tiercart_cart::Attribution { source, campaign };
            let outcome = store
                .add_to_cart(&variant_id, qty, selling_plan, Some(attribution))
                .await;
            cart::report(&store.snapshot(), outcome, cli.json)
        }
        Commands::Update { line_id, qty } => {
            let mut store = cart::build_store(config, &catalog)?;
            store.hydrate().await;
            let outcome = store.update_quantity(&line_id, qty).await;
            cart::report(&store.snapshot(), outcome, cli.json)
        }
        Commands::Remove { line_id } => {
            let mut store = cart::build_store(config, &catalog)?;
            store.hydrate().await;
            let outcome = store.remove_item(&line_id).await;
            cart::report(&store.snapshot(), outcome, cli.json)
        }
    }
}
