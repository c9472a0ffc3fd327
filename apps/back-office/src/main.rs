//! # Atelier Back-Office
//!
//! `atelier-admin`: the operator's entry point to the marketplace back-end.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        atelier-admin                                    │
//! │                                                                         │
//! │  argv ──► clap ──► commands::* ──► atelier-db ──► SQLite               │
//! │                        │                                                │
//! │                        ├── Ok(value)   → pretty JSON on stdout, exit 0  │
//! │                        └── Err(ApiError) → JSON on stdout, exit 1       │
//! │                                                                         │
//! │  tracing ──► stderr  (RUST_LOG, default info,atelier=debug,sqlx=warn)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//! ```bash
//! atelier-admin reconcile-stock
//! atelier-admin bulk-price --markup-type percentage --markup-value 40 --field reseller
//! atelier-admin record-payment --bill <id> --amount 1250.00 --mode bank_transfer
//! atelier-admin approve --partner-type reseller --id <id>
//! ```

mod commands;
mod config;
mod error;

use std::process::ExitCode;

use atelier_db::Database;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AdminConfig;
use crate::error::ApiError;

/// Atelier marketplace back-office.
#[derive(Debug, Parser)]
#[command(name = "atelier-admin", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Recompute every product's stock from the live purchase bills
    ReconcileStock,

    /// Set one price of one product from its cost and a markup
    ApplyPrice {
        #[arg(long = "product")]
        product_id: String,
        /// `percentage` or `fixed`
        #[arg(long)]
        markup_type: String,
        /// e.g. `20` (percent) or `150.00` (amount)
        #[arg(long, allow_hyphen_values = true)]
        markup_value: String,
        /// `wholesale`, `reseller` or `retail`
        #[arg(long)]
        field: String,
    },

    /// Apply a markup to every product, all or nothing
    BulkPrice {
        #[arg(long)]
        markup_type: String,
        #[arg(long, allow_hyphen_values = true)]
        markup_value: String,
        #[arg(long)]
        field: String,
    },

    /// Record a payment against a purchase bill
    RecordPayment {
        #[arg(long = "bill")]
        bill_id: String,
        #[arg(long)]
        amount: String,
        /// cash, bank_transfer, cheque, upi or card
        #[arg(long)]
        mode: String,
        /// Reference number, cheque number, ...
        #[arg(long)]
        details: Option<String>,
    },

    /// Cancel a purchase bill
    CancelBill {
        #[arg(long = "bill")]
        bill_id: String,
        /// Reconcile stock right after cancelling
        #[arg(long)]
        reconcile: bool,
    },

    /// Approve a pending partner registration
    Approve {
        #[arg(long)]
        partner_type: String,
        #[arg(long)]
        id: String,
    },

    /// Reject a pending partner registration
    Reject {
        #[arg(long)]
        partner_type: String,
        #[arg(long)]
        id: String,
    },

    /// List partners awaiting approval
    Pending {
        #[arg(long)]
        partner_type: Option<String>,
    },

    /// Show a reseller's public storefront
    Storefront {
        #[arg(long = "reseller")]
        reseller_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    // Load configuration
    let config = AdminConfig::load()?;
    info!(db_path = %config.db_path, "Configuration loaded");

    let outcome = match Database::new(config.db_config()).await {
        Ok(db) => {
            let outcome = run(&db, cli.command, &config).await;
            db.close().await;
            outcome
        }
        Err(e) => Err(ApiError::from(e)),
    };

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(db: &Database, command: Command, config: &AdminConfig) -> commands::CommandResult {
    match command {
        Command::Migrate => commands::migrate(db).await,
        Command::ReconcileStock => commands::reconcile_stock(db).await,
        Command::ApplyPrice {
            product_id,
            markup_type,
            markup_value,
            field,
        } => commands::apply_price(db, &product_id, &markup_type, &markup_value, &field).await,
        Command::BulkPrice {
            markup_type,
            markup_value,
            field,
        } => commands::bulk_price(db, &markup_type, &markup_value, &field).await,
        Command::RecordPayment {
            bill_id,
            amount,
            mode,
            details,
        } => {
            commands::record_payment(db, &bill_id, &amount, &mode, details, &config.currency_symbol)
                .await
        }
        Command::CancelBill { bill_id, reconcile } => {
            commands::cancel_bill(db, &bill_id, reconcile).await
        }
        Command::Approve { partner_type, id } => commands::approve(db, &partner_type, &id).await,
        Command::Reject { partner_type, id } => commands::reject(db, &partner_type, &id).await,
        Command::Pending { partner_type } => commands::pending(db, partner_type.as_deref()).await,
        Command::Storefront { reseller_id } => commands::storefront(db, &reseller_id).await,
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atelier=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
