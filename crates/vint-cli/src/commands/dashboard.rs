//! Spending dashboard command

use anyhow::{anyhow, Result};
use vint_core::{CategoryTotal, ClientConfig, Dashboard, Invalidator, SummaryWindow};

use super::{connect, login_error, truncate};

const BAR_WIDTH: usize = 30;

/// ANSI true-color escape for a `#rrggbb` palette entry
fn ansi_color(hex: &str) -> Option<String> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some(format!(
        "\x1b[38;2;{};{};{}m",
        channel(0..2)?,
        channel(2..4)?,
        channel(4..6)?
    ))
}

pub fn render_bar(row: &CategoryTotal, max: f64) -> String {
    let len = if max > 0.0 {
        ((row.total / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    let bar = "█".repeat(len.max(1));
    match ansi_color(row.color) {
        Some(code) => format!("{}{}\x1b[0m", code, bar),
        None => bar,
    }
}

pub async fn cmd_dashboard(config: &ClientConfig, days: Option<&str>) -> Result<()> {
    let window = match days {
        Some(days) => days.parse::<SummaryWindow>().map_err(|e| anyhow!(e))?,
        None => config.default_window,
    };

    let client = connect(config)?;
    let mut dashboard = Dashboard::new(client, window, Invalidator::new().subscribe());
    let rows = dashboard.load().await.map_err(login_error)?;

    println!();
    println!("📊 Spending - Last {}", window);
    println!("   ─────────────────────────────────────────────────────────────");

    if rows.is_empty() {
        println!("   No spending in this window.");
        return Ok(());
    }

    let max = rows.iter().map(|r| r.total).fold(0.0, f64::max);
    for row in rows {
        println!(
            "   {:<20} {:>10} {}",
            truncate(&row.category, 20),
            format!("${:.2}", row.total),
            render_bar(row, max)
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:<20} {:>10}", "Total", format!("${:.2}", dashboard.total()));

    Ok(())
}
