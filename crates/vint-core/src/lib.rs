//! Vint Core Library
//!
//! Shared functionality for the Vint personal finance client:
//! - Authenticated HTTP client for the finance backend
//! - Transaction reconciler merging manual and Plaid transactions
//! - Spending dashboard aggregation with deterministic category colors
//! - In-process staleness notifications between views
//! - Local persisted state (session credential, view toggle)
//! - Layered client configuration

pub mod api;
pub mod client;
pub mod colors;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod invalidation;
pub mod models;
pub mod reconciler;
pub mod storage;

/// Test utilities including mock finance server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::{find_manual, FinanceApi, MockApi, MockCall};
pub use client::{ApiClient, AuthenticatedClient};
pub use colors::color_for_category;
pub use config::ClientConfig;
pub use dashboard::{chart_rows, sum_by_category, Dashboard, SummaryWindow};
pub use error::{Error, Result};
pub use invalidation::{Invalidation, Invalidator, Subscription};
pub use models::{
    CategoryTotal, NormalizedTransaction, RawLinkedTransaction, RawManualTransaction,
    SpendingSummary, TransactionDraft, TransactionKey, TransactionSource,
};
pub use reconciler::{merge, ActionOutcome, TransactionReconciler};
pub use storage::{Credential, LocalStore, MemoryViewState, Session, ViewState, ViewStateStore};
