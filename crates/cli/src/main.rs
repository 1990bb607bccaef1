//! SnapList CLI - Database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! snaplist-cli migrate
//!
//! # Insert or refresh the FREE / STANDARD / PRO tiers
//! snaplist-cli seed tiers
//!
//! # Move an order along and email the customer
//! snaplist-cli order set-status --order-number SL-7KQ2M9XA --status shipped
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use snaplist_core::OrderStatus;

mod commands;

#[derive(Parser)]
#[command(name = "snaplist-cli")]
#[command(author, version, about = "SnapList CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert or update the membership tiers
    Tiers,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Change an order's status and notify the customer
    SetStatus {
        /// Order number, e.g. SL-7KQ2M9XA
        #[arg(short, long)]
        order_number: String,

        /// New status (pending, processing, shipped, delivered, cancelled)
        #[arg(short, long)]
        status: OrderStatus,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Tiers => commands::seed::tiers().await?,
        },
        Commands::Order { action } => match action {
            OrderAction::SetStatus {
                order_number,
                status,
            } => commands::order::set_status(&order_number, status).await?,
        },
    }
    Ok(())
}
