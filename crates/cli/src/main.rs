//! Ecomify CLI - coupon, search and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Check what a coupon does to a subtotal
//! ecomify coupon apply --code BEMVINDO10 --subtotal 350.00
//!
//! # List the coupon book
//! ecomify coupon list
//!
//! # Search the built-in catalog
//! ecomify search "fone bluetooth" --limit 5
//!
//! # Push the built-in catalog to the backend `products` table
//! ecomify catalog seed
//! ```
//!
//! # Commands
//!
//! - `coupon apply` / `coupon list` - Offline coupon evaluation
//! - `search` - Offline catalog search
//! - `catalog seed` - Upsert the built-in catalog (needs backend env vars)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use ecomify_storefront::catalog::search::SearchSort;
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "ecomify")]
#[command(author, version, about = "Ecomify CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Search the built-in catalog
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Result ordering (relevance, `price_asc`, `price_desc`, rating, newest, `best_selling`)
        #[arg(short, long, default_value_t = SearchSort::Relevance)]
        sort: SearchSort,
    },
    /// Manage the backend catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Apply a coupon to a subtotal
    Apply {
        /// Coupon code (case-insensitive)
        #[arg(short, long)]
        code: String,

        /// Cart subtotal in BRL, e.g. 350.00
        #[arg(short, long)]
        subtotal: Decimal,
    },
    /// List every coupon and whether it is usable today
    List,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Upsert the built-in catalog into the backend `products` table
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Coupon { action } => match action {
            CouponAction::Apply { code, subtotal } => {
                commands::coupon::apply(&code, subtotal)?;
            }
            CouponAction::List => commands::coupon::list(),
        },
        Commands::Search { query, limit, sort } => commands::search::run(&query, limit, sort),
        Commands::Catalog { action } => match action {
            CatalogAction::Seed => commands::catalog::seed().await?,
        },
    }
    Ok(())
}
