//! Till CLI - Drive the point-of-sale cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart and its totals
//! till cart show
//!
//! # Add two units of a catalog product
//! till cart add 3f1c9b2e-0000-4000-8000-000000000001 -q 2
//!
//! # Set a line's quantity, remove it, or empty the cart
//! till cart update 3f1c9b2e-0000-4000-8000-000000000001 3
//! till cart remove 3f1c9b2e-0000-4000-8000-000000000001
//! till cart clear
//!
//! # Re-check cart lines against the catalog, then build an order draft
//! till cart refresh
//! till cart checkout
//!
//! # List catalog products
//! till catalog list
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and mutate the persisted cart
//! - `catalog` - Inspect the product catalog
//!
//! Configuration comes from `TILL_*` environment variables (see
//! [`till_cart::CartConfig`]).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "till")]
#[command(author, version, about = "Till point-of-sale cart tools")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Inspect the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print cart lines and totals
    Show,
    /// Add a catalog product to the cart
    Add {
        /// Product ID
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a product already in the cart
    Update {
        /// Product ID
        product_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Remove every line
    Clear,
    /// Refresh line snapshots from the catalog and report stock conflicts
    Refresh,
    /// Print an order draft for the current cart
    Checkout,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List all products
    List,
}

fn main() {
    let cli = Cli::parse();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "till_cart=info,till_cli=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if let Err(e) = run(cli.command) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), commands::CommandError> {
    let ctx = commands::Context::from_env()?;

    match command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&ctx, &product_id, quantity),
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&ctx, &product_id, quantity),
            CartAction::Remove { product_id } => commands::cart::remove(&ctx, &product_id),
            CartAction::Clear => commands::cart::clear(&ctx),
            CartAction::Refresh => commands::cart::refresh(&ctx),
            CartAction::Checkout => commands::cart::checkout(&ctx),
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list(&ctx),
        },
    }
}
