//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vint - Track manual and bank-linked spending
#[derive(Parser)]
#[command(name = "vint")]
#[command(about = "Personal finance client for the Vint backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides config and VINT_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory for local state (overrides config and VINT_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with a Google ID token
    Login {
        /// ID token from Google sign-in
        #[arg(long)]
        google_token: String,
    },

    /// Forget the stored session
    Logout,

    /// Manual and bank-linked transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Spending by category
    Dashboard {
        /// Summary window: 7, 30 or 90 days (defaults to config)
        #[arg(short, long)]
        days: Option<String>,
    },

    /// Bank account linking
    Plaid {
        #[command(subcommand)]
        action: PlaidAction,
    },

    /// Show configuration, session and view state
    Status,
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List transactions from both sources
    List {
        /// Include soft-deleted bank transactions for this listing only
        #[arg(short, long)]
        all: bool,
    },

    /// Add a manual transaction
    Add {
        /// Amount spent
        #[arg(short, long)]
        amount: f64,

        /// Category name
        #[arg(short, long)]
        category: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Edit a manual transaction (unset fields keep their current value)
    Edit {
        /// Manual transaction ID
        id: i64,

        /// Amount spent
        #[arg(short, long)]
        amount: Option<f64>,

        /// Category name
        #[arg(short, long)]
        category: Option<String>,

        /// Description (pass "" to clear it)
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a transaction (manual: permanent, bank: hidden)
    Delete {
        /// Transaction ID
        id: String,

        /// Treat the ID as a bank transaction ID
        #[arg(long)]
        plaid: bool,
    },

    /// Restore a hidden bank transaction
    Restore {
        /// Bank transaction ID
        id: String,
    },

    /// Restore every hidden bank transaction
    RestoreAll,

    /// Flip the persisted "show all" toggle and list again
    Toggle,
}

#[derive(Subcommand)]
pub enum PlaidAction {
    /// Request a link token to start Plaid Link
    LinkToken,

    /// Finish linking with the public token from Plaid Link
    Link {
        /// Public token returned by Plaid Link
        #[arg(long)]
        public_token: String,
    },
}
