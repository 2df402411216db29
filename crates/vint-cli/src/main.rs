//! Vint CLI - Personal finance client
//!
//! Usage:
//!   vint login --google-token TOKEN    Sign in
//!   vint transactions                  List manual and bank transactions
//!   vint dashboard --days 30           Spending by category
//!   vint plaid link-token              Start linking a bank account

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.api_url, cli.data_dir)?;
    tracing::debug!("Using backend {}", config.api_url);

    match cli.command {
        Commands::Login { google_token } => commands::cmd_login(&config, &google_token).await,
        Commands::Logout => commands::cmd_logout(&config),
        Commands::Transactions { action } => match action {
            None => commands::cmd_transactions_list(&config, false).await,
            Some(TransactionsAction::List { all }) => {
                commands::cmd_transactions_list(&config, all).await
            }
            Some(TransactionsAction::Add {
                amount,
                category,
                description,
            }) => {
                commands::cmd_transactions_add(&config, amount, &category, description.as_deref())
                    .await
            }
            Some(TransactionsAction::Edit {
                id,
                amount,
                category,
                description,
            }) => {
                commands::cmd_transactions_edit(
                    &config,
                    id,
                    amount,
                    category.as_deref(),
                    description.as_deref(),
                )
                .await
            }
            Some(TransactionsAction::Delete { id, plaid }) => {
                commands::cmd_transactions_delete(&config, &id, plaid).await
            }
            Some(TransactionsAction::Restore { id }) => {
                commands::cmd_transactions_restore(&config, &id).await
            }
            Some(TransactionsAction::RestoreAll) => {
                commands::cmd_transactions_restore_all(&config).await
            }
            Some(TransactionsAction::Toggle) => commands::cmd_transactions_toggle(&config).await,
        },
        Commands::Dashboard { days } => commands::cmd_dashboard(&config, days.as_deref()).await,
        Commands::Plaid { action } => match action {
            PlaidAction::LinkToken => commands::cmd_plaid_link_token(&config).await,
            PlaidAction::Link { public_token } => {
                commands::cmd_plaid_link(&config, &public_token).await
            }
        },
        Commands::Status => commands::cmd_status(&config),
    }
}
