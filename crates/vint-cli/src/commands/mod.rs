//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, session, authenticated client)
//! - `auth` - Login/logout
//! - `transactions` - Transaction commands (list, add, edit, delete, restore, toggle)
//! - `dashboard` - Spending by category
//! - `plaid` - Bank linking
//! - `status` - Configuration and session overview

pub mod auth;
pub mod core;
pub mod dashboard;
pub mod plaid;
pub mod status;
pub mod transactions;

// Re-export command functions for main.rs
pub use auth::*;
pub use core::*;
pub use dashboard::*;
pub use plaid::*;
pub use status::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
