//! Transaction reconciler
//!
//! Merges manual and linked (Plaid) transactions into the single list a
//! transaction view renders, and routes delete/restore actions to the
//! source each row came from.
//!
//! # Fetching
//!
//! Both sources are requested concurrently and settle independently: a
//! failed source contributes nothing and the other source is still shown.
//! Only a rejected credential aborts a fetch ([`Error::LoginRequired`]).
//!
//! # Ordering
//!
//! Manual rows come first, then linked rows, each in the order the backend
//! returned them. Every fetch takes a sequence number when it starts; a
//! fetch that finishes after a later-started one has already been applied
//! is discarded, so the held list always reflects the newest request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::api::FinanceApi;
use crate::error::{Error, Result};
use crate::invalidation::{Invalidation, Invalidator};
use crate::models::{
    NormalizedTransaction, RawLinkedTransaction, RawManualTransaction, TransactionKey,
    TransactionSource,
};
use crate::storage::{ViewState, ViewStateStore};

/// Result of a delete/restore action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend accepted the change and the held list reflects it
    Applied,
    /// The request failed; it was logged and the list is unchanged
    Failed,
    /// The action does not apply to this transaction (restoring a manual row)
    NotApplicable,
}

/// Normalize and filter both sources into one ordered list
///
/// Drops rows with an unparseable date or a non-positive amount, and
/// deleted rows unless `show_deleted`.
pub fn merge(
    manual: Vec<RawManualTransaction>,
    linked: Vec<RawLinkedTransaction>,
    show_deleted: bool,
) -> Vec<NormalizedTransaction> {
    manual
        .into_iter()
        .map(NormalizedTransaction::from)
        .chain(linked.into_iter().map(NormalizedTransaction::from))
        .filter(|tx| tx.is_displayable())
        .filter(|tx| show_deleted || !tx.is_deleted)
        .collect()
}

#[derive(Debug, Default)]
struct HeldState {
    transactions: Vec<NormalizedTransaction>,
    failed_sources: Vec<TransactionSource>,
    /// Sequence number of the fetch currently shown (0 = none yet)
    applied_seq: u64,
}

pub struct TransactionReconciler<A: FinanceApi> {
    api: Arc<A>,
    view_store: Arc<dyn ViewStateStore>,
    view: RwLock<ViewState>,
    held: RwLock<HeldState>,
    next_seq: AtomicU64,
    invalidator: Invalidator,
}

impl<A: FinanceApi> TransactionReconciler<A> {
    pub fn new(api: Arc<A>, view_store: Arc<dyn ViewStateStore>, invalidator: Invalidator) -> Self {
        Self {
            api,
            view_store,
            view: RwLock::new(ViewState::default()),
            held: RwLock::new(HeldState::default()),
            next_seq: AtomicU64::new(0),
            invalidator,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    /// Read the persisted view toggle and load the list in that mode
    pub async fn mount(&self) -> Result<Vec<NormalizedTransaction>> {
        let state = self.view_store.load_view_state();
        self.set_view(state);
        debug!("Mounted with show_all={}", state.show_all);
        self.fetch_and_merge(state.show_all).await
    }

    /// Current view toggle
    pub fn view_state(&self) -> ViewState {
        self.view.read().map(|v| *v).unwrap_or_default()
    }

    /// Flip the toggle, persist it, and reload in the new mode
    pub async fn toggle_show_all(&self) -> Result<Vec<NormalizedTransaction>> {
        let next = self.view_state().toggled();
        self.set_view(next);
        if let Err(e) = self.view_store.save_view_state(next) {
            warn!("Failed to persist view state: {}", e);
        }
        self.fetch_and_merge(next.show_all).await
    }

    fn set_view(&self, state: ViewState) {
        if let Ok(mut view) = self.view.write() {
            *view = state;
        }
    }

    /// The list currently held for rendering
    pub fn transactions(&self) -> Vec<NormalizedTransaction> {
        self.held
            .read()
            .map(|h| h.transactions.clone())
            .unwrap_or_default()
    }

    /// Sources that failed during the last applied fetch
    pub fn failed_sources(&self) -> Vec<TransactionSource> {
        self.held
            .read()
            .map(|h| h.failed_sources.clone())
            .unwrap_or_default()
    }

    /// Banner text when nothing could be loaded at all
    pub fn failure_banner(&self) -> Option<String> {
        let failed = self.failed_sources();
        let both = failed.contains(&TransactionSource::Manual)
            && failed.contains(&TransactionSource::Plaid);
        both.then(|| "Failed to load transactions".to_string())
    }

    /// Fetch both sources concurrently, merge, and hold the result
    ///
    /// Returns the held list after this fetch completes. If a newer fetch
    /// was applied first, that newer list is returned unchanged.
    pub async fn fetch_and_merge(&self, show_deleted: bool) -> Result<Vec<NormalizedTransaction>> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Fetch #{} (show_deleted={})", seq, show_deleted);

        let (manual, linked) = tokio::join!(
            self.api.list_manual(),
            self.api.list_linked(show_deleted)
        );

        if matches!(manual, Err(Error::LoginRequired)) || matches!(linked, Err(Error::LoginRequired))
        {
            return Err(Error::LoginRequired);
        }

        let mut failed_sources = Vec::new();
        let manual = manual.unwrap_or_else(|e| {
            warn!("Failed to fetch manual transactions: {}", e);
            failed_sources.push(TransactionSource::Manual);
            Vec::new()
        });
        let linked = linked.unwrap_or_else(|e| {
            warn!("Failed to fetch linked transactions: {}", e);
            failed_sources.push(TransactionSource::Plaid);
            Vec::new()
        });

        let merged = merge(manual, linked, show_deleted);

        let mut held = self
            .held
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire transaction list lock".into()))?;
        if seq < held.applied_seq {
            debug!(
                "Discarding fetch #{}, superseded by #{}",
                seq, held.applied_seq
            );
            return Ok(held.transactions.clone());
        }
        held.applied_seq = seq;
        held.transactions = merged;
        held.failed_sources = failed_sources;
        Ok(held.transactions.clone())
    }

    /// Delete a row at its source
    ///
    /// Manual rows are hard-deleted and dropped from the held list directly.
    /// Linked rows are soft-deleted, then the list is re-fetched so the
    /// deleted flag is picked up.
    pub async fn delete(&self, transaction: &NormalizedTransaction) -> ActionOutcome {
        let result = match &transaction.id {
            TransactionKey::Manual(id) => self.api.delete_manual(*id).await,
            TransactionKey::Linked(id) => self.api.soft_delete_linked(id).await,
        };

        if let Err(e) = result {
            warn!("Failed to delete transaction {}: {}", transaction.id, e);
            return ActionOutcome::Failed;
        }
        info!(
            "Deleted {} transaction {}",
            transaction.source, transaction.id
        );

        match transaction.id {
            TransactionKey::Manual(_) => self.remove_held(&transaction.id),
            TransactionKey::Linked(_) => self.refresh().await,
        }
        self.invalidator.publish(Invalidation::DashboardStale);
        ActionOutcome::Applied
    }

    /// Restore a soft-deleted linked row
    pub async fn restore(&self, transaction: &NormalizedTransaction) -> ActionOutcome {
        let TransactionKey::Linked(id) = &transaction.id else {
            debug!(
                "Restore requested for manual transaction {}; nothing to do",
                transaction.id
            );
            return ActionOutcome::NotApplicable;
        };

        if let Err(e) = self.api.restore_linked(id).await {
            warn!("Failed to restore transaction {}: {}", id, e);
            return ActionOutcome::Failed;
        }
        info!("Restored transaction {}", id);

        self.refresh().await;
        self.invalidator.publish(Invalidation::DashboardStale);
        ActionOutcome::Applied
    }

    /// Restore every soft-deleted linked row
    pub async fn restore_all(&self) -> ActionOutcome {
        if let Err(e) = self.api.restore_all_linked().await {
            warn!("Failed to restore all transactions: {}", e);
            return ActionOutcome::Failed;
        }
        info!("Restored all linked transactions");

        self.refresh().await;
        self.invalidator.publish(Invalidation::DashboardStale);
        ActionOutcome::Applied
    }

    /// Re-fetch in the current mode; failures are logged only
    async fn refresh(&self) {
        let show_all = self.view_state().show_all;
        if let Err(e) = self.fetch_and_merge(show_all).await {
            warn!("Re-fetch after action failed: {}", e);
        }
    }

    fn remove_held(&self, key: &TransactionKey) {
        if let Ok(mut held) = self.held.write() {
            held.transactions.retain(|tx| &tx.id != key);
        }
    }
}
