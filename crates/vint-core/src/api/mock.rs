//! Mock finance API for testing
//!
//! Keeps manual and linked transactions in memory and applies writes to
//! them the way the backend does. Individual calls can be made to fail or
//! to respond slowly, and every call is recorded.

use std::collections::{HashSet, VecDeque};
use std::mem::Discriminant;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{
    RawLinkedTransaction, RawManualTransaction, SpendingSummary, TransactionDraft,
};

use super::FinanceApi;

/// A call made against the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ListManual,
    ListLinked { include_deleted: bool },
    CreateManual,
    UpdateManual(i64),
    DeleteManual(i64),
    SoftDeleteLinked(String),
    RestoreLinked(String),
    RestoreAllLinked,
    Summary(u32),
}

#[derive(Default)]
struct MockState {
    manual: Vec<RawManualTransaction>,
    linked: Vec<RawLinkedTransaction>,
    calls: Vec<MockCall>,
    next_id: i64,
}

/// In-memory [`FinanceApi`]
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
    failing: Mutex<HashSet<Discriminant<MockCall>>>,
    unauthorized: Mutex<bool>,
    manual_list_delays: Mutex<VecDeque<Duration>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock seeded with both sources
    pub fn with_data(manual: Vec<RawManualTransaction>, linked: Vec<RawLinkedTransaction>) -> Self {
        let next_id = manual.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mock = Self::new();
        if let Ok(mut state) = mock.state.lock() {
            state.manual = manual;
            state.linked = linked;
            state.next_id = next_id;
        }
        mock
    }

    /// Make every call of this kind fail with a 500 (the payload is ignored)
    pub fn fail(&self, kind: MockCall) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(std::mem::discriminant(&kind));
        }
    }

    /// Stop failing calls of this kind
    pub fn recover(&self, kind: MockCall) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(&std::mem::discriminant(&kind));
        }
    }

    /// Answer every call as if the credential were rejected
    pub fn reject_credential(&self) {
        if let Ok(mut flag) = self.unauthorized.lock() {
            *flag = true;
        }
    }

    /// Delay the next manual list response (one entry per call, in order)
    pub fn delay_next_manual_list(&self, delay: Duration) {
        if let Ok(mut delays) = self.manual_list_delays.lock() {
            delays.push_back(delay);
        }
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// Number of recorded calls matching `kind`
    pub fn call_count(&self, kind: &MockCall) -> usize {
        let wanted = std::mem::discriminant(kind);
        self.calls()
            .iter()
            .filter(|c| std::mem::discriminant(*c) == wanted)
            .count()
    }

    pub fn linked(&self) -> Vec<RawLinkedTransaction> {
        self.state
            .lock()
            .map(|s| s.linked.clone())
            .unwrap_or_default()
    }

    pub fn manual(&self) -> Vec<RawManualTransaction> {
        self.state
            .lock()
            .map(|s| s.manual.clone())
            .unwrap_or_default()
    }

    /// Record the call, then apply `f` to the state unless the call should fail
    fn record<T>(&self, call: MockCall, f: impl FnOnce(&mut MockState) -> Result<T>) -> Result<T> {
        let kind = std::mem::discriminant(&call);
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::InvalidData("Mock state lock poisoned".into()))?;
        state.calls.push(call);

        if self.unauthorized.lock().map(|flag| *flag).unwrap_or(false) {
            return Err(Error::LoginRequired);
        }
        if self
            .failing
            .lock()
            .map(|failing| failing.contains(&kind))
            .unwrap_or(false)
        {
            return Err(Error::Api {
                status: 500,
                detail: "mock failure".into(),
            });
        }
        f(&mut *state)
    }
}

#[async_trait]
impl FinanceApi for MockApi {
    async fn list_manual(&self) -> Result<Vec<RawManualTransaction>> {
        let delay = self
            .manual_list_delays
            .lock()
            .ok()
            .and_then(|mut d| d.pop_front());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(MockCall::ListManual, |s| Ok(s.manual.clone()))
    }

    async fn list_linked(&self, include_deleted: bool) -> Result<Vec<RawLinkedTransaction>> {
        self.record(MockCall::ListLinked { include_deleted }, |s| {
            Ok(s.linked
                .iter()
                .filter(|t| include_deleted || !t.is_deleted)
                .cloned()
                .collect())
        })
    }

    async fn create_manual(&self, draft: &TransactionDraft) -> Result<RawManualTransaction> {
        self.record(MockCall::CreateManual, |s| {
            s.next_id = s.next_id.max(1);
            let tx = RawManualTransaction {
                id: s.next_id,
                amount: draft.amount,
                category: draft.category.clone(),
                description: draft.description.clone(),
                timestamp: "2024-01-01T00:00:00".to_string(),
            };
            s.next_id += 1;
            s.manual.push(tx.clone());
            Ok(tx)
        })
    }

    async fn update_manual(
        &self,
        id: i64,
        draft: &TransactionDraft,
    ) -> Result<RawManualTransaction> {
        self.record(MockCall::UpdateManual(id), |s| {
            let tx = s
                .manual
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))?;
            tx.amount = draft.amount;
            tx.category = draft.category.clone();
            tx.description = draft.description.clone();
            Ok(tx.clone())
        })
    }

    async fn delete_manual(&self, id: i64) -> Result<()> {
        self.record(MockCall::DeleteManual(id), |s| {
            let before = s.manual.len();
            s.manual.retain(|t| t.id != id);
            if s.manual.len() == before {
                return Err(Error::NotFound(format!("Transaction {}", id)));
            }
            Ok(())
        })
    }

    async fn soft_delete_linked(&self, transaction_id: &str) -> Result<()> {
        self.record(MockCall::SoftDeleteLinked(transaction_id.to_string()), |s| {
            set_deleted(s, transaction_id, true)
        })
    }

    async fn restore_linked(&self, transaction_id: &str) -> Result<()> {
        self.record(MockCall::RestoreLinked(transaction_id.to_string()), |s| {
            set_deleted(s, transaction_id, false)
        })
    }

    async fn restore_all_linked(&self) -> Result<()> {
        self.record(MockCall::RestoreAllLinked, |s| {
            for tx in &mut s.linked {
                tx.is_deleted = false;
            }
            Ok(())
        })
    }

    async fn spending_summary(&self, days: u32) -> Result<SpendingSummary> {
        self.record(MockCall::Summary(days), |s| {
            let mut summary = SpendingSummary::new();
            for tx in &s.manual {
                *summary.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
            }
            Ok(summary)
        })
    }
}

fn set_deleted(state: &mut MockState, transaction_id: &str, deleted: bool) -> Result<()> {
    let tx = state
        .linked
        .iter_mut()
        .find(|t| t.transaction_id == transaction_id)
        .ok_or_else(|| Error::NotFound(format!("Plaid transaction {}", transaction_id)))?;
    tx.is_deleted = deleted;
    Ok(())
}
