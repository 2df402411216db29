//! Backend abstraction used by the reconciler and dashboard
//!
//! - `FinanceApi` trait: every call the views make against the backend
//! - `AuthenticatedClient`: the HTTP implementation (see `client`)
//! - `MockApi`: in-process implementation for tests and offline development

mod mock;

pub use mock::{MockApi, MockCall};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{
    RawLinkedTransaction, RawManualTransaction, SpendingSummary, TransactionDraft,
};

/// Calls a signed-in view can make
///
/// Implementations must be Send + Sync so one client can be shared by the
/// reconciler and the dashboard.
#[async_trait]
pub trait FinanceApi: Send + Sync {
    /// GET /transactions
    async fn list_manual(&self) -> Result<Vec<RawManualTransaction>>;

    /// GET /plaid/transactions, or /plaid/all_transactions when `include_deleted`
    async fn list_linked(&self, include_deleted: bool) -> Result<Vec<RawLinkedTransaction>>;

    /// POST /transactions
    async fn create_manual(&self, draft: &TransactionDraft) -> Result<RawManualTransaction>;

    /// PUT /transactions/{id}
    async fn update_manual(&self, id: i64, draft: &TransactionDraft)
        -> Result<RawManualTransaction>;

    /// DELETE /transactions/{id}
    async fn delete_manual(&self, id: i64) -> Result<()>;

    /// DELETE /plaid/delete_transaction/{id}
    async fn soft_delete_linked(&self, transaction_id: &str) -> Result<()>;

    /// POST /plaid/restore_transaction/{id}
    async fn restore_linked(&self, transaction_id: &str) -> Result<()>;

    /// POST /plaid/restore_all_transactions
    async fn restore_all_linked(&self) -> Result<()>;

    /// GET /transactions/summary?days=N
    async fn spending_summary(&self, days: u32) -> Result<SpendingSummary>;
}

/// Load one manual transaction for editing
pub async fn find_manual<A: FinanceApi + ?Sized>(api: &A, id: i64) -> Result<RawManualTransaction> {
    api.list_manual()
        .await?
        .into_iter()
        .find(|tx| tx.id == id)
        .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
}
