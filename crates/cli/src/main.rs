//! RocketShoes CLI - Terminal front-end for the cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rocketshoes list
//!
//! # Add one unit of product 1
//! rocketshoes add 1
//!
//! # Set product 1 to three units
//! rocketshoes update 1 3
//!
//! # Remove product 1
//! rocketshoes remove 1
//!
//! # Show totals
//! rocketshoes summary
//! ```
//!
//! Configuration comes from the environment (see `rocketshoes_cart::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_cart::CartConfig;
use rocketshoes_core::ProductId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cart entries
    List,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New quantity (values of zero or less are ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Show cart totals
    Summary,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        match &e {
            commands::CommandError::Cart(err) => match err.product_id() {
                Some(product_id) => tracing::error!(%product_id, "Command failed: {e}"),
                None => tracing::error!("Command failed: {e}"),
            },
            commands::CommandError::Api(_) => tracing::error!("Command failed: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), commands::CommandError> {
    let mut store = commands::open_store(config)?;

    match cli.command {
        Commands::List => commands::cart::list(&store),
        Commands::Add { product_id } => commands::cart::add(&mut store, product_id).await?,
        Commands::Remove { product_id } => commands::cart::remove(&mut store, product_id)?,
        Commands::Update { product_id, amount } => {
            commands::cart::update(&mut store, product_id, amount).await?;
        }
        Commands::Summary => commands::cart::summary(&store),
    }
    Ok(())
}
