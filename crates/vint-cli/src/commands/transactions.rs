//! Transaction command implementations

use anyhow::{bail, Context, Result};
use vint_core::{
    find_manual, ActionOutcome, ClientConfig, FinanceApi, NormalizedTransaction, TransactionDraft,
    TransactionKey, TransactionReconciler, TransactionSource,
};

use super::{connect, form_error, login_error, open_reconciler, truncate};

/// Parse a command-line ID into the key space it belongs to
pub fn transaction_key(id: &str, plaid: bool) -> Result<TransactionKey> {
    if plaid {
        return Ok(TransactionKey::Linked(id.to_string()));
    }
    id.parse::<i64>().map(TransactionKey::Manual).with_context(|| {
        format!(
            "Manual transaction IDs are numbers; use --plaid for bank transaction '{}'",
            id
        )
    })
}

fn find<'a>(list: &'a [NormalizedTransaction], key: &TransactionKey) -> Result<&'a NormalizedTransaction> {
    match list.iter().find(|tx| &tx.id == key) {
        Some(tx) => Ok(tx),
        None => bail!("Transaction {} not found", key),
    }
}

fn print_transactions<A: FinanceApi>(
    reconciler: &TransactionReconciler<A>,
    list: &[NormalizedTransaction],
    show_deleted: bool,
) {
    if let Some(banner) = reconciler.failure_banner() {
        println!("⚠️  {}", banner);
        return;
    }
    for source in reconciler.failed_sources() {
        println!("⚠️  {} transactions unavailable", source);
    }

    if list.is_empty() {
        println!("No transactions found. Add one with:");
        println!("  vint transactions add --amount 12.50 --category Food");
        return;
    }

    println!();
    if show_deleted {
        println!("📝 All Transactions (including hidden)");
    } else {
        println!("📝 Transactions");
    }
    println!("   ─────────────────────────────────────────────────────────────");

    let id_width = id_column_width(list);
    for tx in list {
        println!("{}", format_row(tx, id_width));
    }
}

/// Width that fits the longest ID, so every ID prints in full
pub fn id_column_width(list: &[NormalizedTransaction]) -> usize {
    list.iter()
        .map(|tx| tx.id.to_string().chars().count())
        .max()
        .unwrap_or(0)
}

/// One list line; the ID is never shortened since delete/restore need it verbatim
pub fn format_row(tx: &NormalizedTransaction, id_width: usize) -> String {
    let marker = if tx.is_deleted { " (hidden)" } else { "" };
    format!(
        "   [{:>width$}] {} │ {:>10} │ {:<20} │ {}{}",
        tx.id.to_string(),
        tx.parsed_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| tx.date.clone()),
        format!("${:.2}", tx.amount),
        truncate(&tx.category, 20),
        truncate(&tx.name, 30),
        marker,
        width = id_width
    )
}

pub async fn cmd_transactions_list(config: &ClientConfig, all: bool) -> Result<()> {
    let reconciler = open_reconciler(config)?;
    let list = if all {
        reconciler.fetch_and_merge(true).await
    } else {
        reconciler.mount().await
    }
    .map_err(login_error)?;

    let show_deleted = all || reconciler.view_state().show_all;
    print_transactions(&reconciler, &list, show_deleted);
    Ok(())
}

pub async fn cmd_transactions_toggle(config: &ClientConfig) -> Result<()> {
    let reconciler = open_reconciler(config)?;
    reconciler.mount().await.map_err(login_error)?;
    let list = reconciler.toggle_show_all().await.map_err(login_error)?;

    let show_all = reconciler.view_state().show_all;
    println!(
        "👁  Showing {}",
        if show_all {
            "all transactions"
        } else {
            "active transactions only"
        }
    );
    print_transactions(&reconciler, &list, show_all);
    Ok(())
}

pub async fn cmd_transactions_add(
    config: &ClientConfig,
    amount: f64,
    category: &str,
    description: Option<&str>,
) -> Result<()> {
    let draft = TransactionDraft::new(amount, category, description)
        .map_err(|e| form_error(e, "Invalid transaction"))?;
    let created = connect(config)?
        .create_manual(&draft)
        .await
        .map_err(|e| form_error(e, "Failed to add transaction"))?;

    println!("✅ Added transaction {}:", created.id);
    println!("   ${:.2} │ {}", created.amount, created.category);
    Ok(())
}

pub async fn cmd_transactions_edit(
    config: &ClientConfig,
    id: i64,
    amount: Option<f64>,
    category: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let client = connect(config)?;
    let current = find_manual(client.as_ref(), id)
        .await
        .map_err(|e| form_error(e, &format!("Transaction {} not found", id)))?;

    let draft = TransactionDraft::new(
        amount.unwrap_or(current.amount),
        category.unwrap_or(&current.category),
        description.or(current.description.as_deref()),
    )
    .map_err(|e| form_error(e, "Invalid transaction"))?;
    let updated = client
        .update_manual(id, &draft)
        .await
        .map_err(|e| form_error(e, "Failed to update transaction"))?;

    println!("✅ Updated transaction {}:", updated.id);
    println!("   ${:.2} │ {}", updated.amount, updated.category);
    Ok(())
}

pub async fn cmd_transactions_delete(config: &ClientConfig, id: &str, plaid: bool) -> Result<()> {
    let key = transaction_key(id, plaid)?;
    let reconciler = open_reconciler(config)?;
    let list = reconciler.mount().await.map_err(login_error)?;
    let tx = find(&list, &key)?;

    match reconciler.delete(tx).await {
        ActionOutcome::Applied => {
            println!("✅ Deleted transaction {}:", key);
            println!("   ${:.2} │ {}", tx.amount, truncate(&tx.name, 40));
            if tx.source == TransactionSource::Plaid {
                println!();
                println!("   Use 'vint transactions restore {}' to bring it back.", key);
            }
        }
        _ => println!("⚠️  Could not delete transaction {}; nothing changed.", key),
    }
    Ok(())
}

pub async fn cmd_transactions_restore(config: &ClientConfig, id: &str) -> Result<()> {
    let key = TransactionKey::Linked(id.to_string());
    let reconciler = open_reconciler(config)?;
    let list = reconciler.fetch_and_merge(true).await.map_err(login_error)?;
    let tx = find(&list, &key)?;

    if !tx.is_deleted {
        println!("Transaction {} is not hidden.", key);
        return Ok(());
    }

    match reconciler.restore(tx).await {
        ActionOutcome::Applied => println!("✅ Restored transaction {}", key),
        _ => println!("⚠️  Could not restore transaction {}; nothing changed.", key),
    }
    Ok(())
}

pub async fn cmd_transactions_restore_all(config: &ClientConfig) -> Result<()> {
    let reconciler = open_reconciler(config)?;
    match reconciler.restore_all().await {
        ActionOutcome::Applied => println!("✅ Restored all bank transactions"),
        _ => println!("⚠️  Could not restore transactions; nothing changed."),
    }
    Ok(())
}
