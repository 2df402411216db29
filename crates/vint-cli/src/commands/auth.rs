//! Login and logout

use anyhow::{Context, Result};
use vint_core::{ApiClient, ClientConfig};

use super::{form_error, open_session};

pub async fn cmd_login(config: &ClientConfig, google_token: &str) -> Result<()> {
    println!("🔑 Logging in to {}...", config.api_url);

    let credential = ApiClient::new(&config.api_url)
        .exchange_google_token(google_token)
        .await
        .map_err(|e| form_error(e, "Login failed"))?;

    open_session(config)
        .store(&credential)
        .context("Failed to save session")?;

    println!("✅ Logged in");
    println!();
    println!("Next steps:");
    println!("  1. List transactions: vint transactions");
    println!("  2. Link a bank: vint plaid link-token");

    Ok(())
}

pub fn cmd_logout(config: &ClientConfig) -> Result<()> {
    let session = open_session(config);
    // An unreadable store is still cleared below
    if let Ok(None) = session.credential() {
        println!("Not logged in.");
        return Ok(());
    }

    session.clear().context("Failed to clear session")?;
    println!("👋 Logged out");

    Ok(())
}
