//! Status command

use anyhow::Result;
use vint_core::{ClientConfig, ViewStateStore};

use super::{open_session, open_store};

pub fn cmd_status(config: &ClientConfig) -> Result<()> {
    let store = open_store(config);
    let logged_in = open_session(config).credential()?.is_some();
    let view = store.load_view_state();

    println!();
    println!("📋 Vint Status");
    println!("   ─────────────────────────────");
    println!("   Backend:        {}", config.api_url);
    println!("   Data file:      {}", store.path().display());
    println!(
        "   Session:        {}",
        if logged_in { "logged in" } else { "not logged in" }
    );
    println!(
        "   Transactions:   {}",
        if view.show_all {
            "showing all"
        } else {
            "showing active only"
        }
    );
    println!("   Dashboard:      {}", config.default_window);

    if !logged_in {
        println!();
        println!("💡 Tip: Run 'vint login --google-token <TOKEN>' to sign in");
    }

    Ok(())
}
