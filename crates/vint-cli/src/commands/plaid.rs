//! Bank linking commands

use anyhow::Result;
use vint_core::ClientConfig;

use super::{connect, form_error};

pub async fn cmd_plaid_link_token(config: &ClientConfig) -> Result<()> {
    let token = connect(config)?
        .create_link_token()
        .await
        .map_err(|e| form_error(e, "Failed to create link token"))?;

    println!("🔗 Link token: {}", token);
    println!();
    println!("   Open Plaid Link with this token, then finish with:");
    println!("   vint plaid link --public-token <PUBLIC_TOKEN>");
    Ok(())
}

pub async fn cmd_plaid_link(config: &ClientConfig, public_token: &str) -> Result<()> {
    connect(config)?
        .set_access_token(public_token)
        .await
        .map_err(|e| form_error(e, "Failed to link bank account"))?;

    println!("✅ Bank account linked");
    println!("   Run 'vint transactions' to see its transactions.");
    Ok(())
}
