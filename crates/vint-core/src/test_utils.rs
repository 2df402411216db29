//! Test utilities for vint-core
//!
//! This module provides a mock finance backend speaking the same HTTP
//! contract as the real one, so the reqwest client can be exercised end to
//! end in integration tests and development.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::models::{
    LinkedTransactionList, RawLinkedTransaction, RawManualTransaction, SpendingSummary,
    TransactionDraft,
};

/// Google ID token the mock accepts at /auth/google
pub const VALID_GOOGLE_TOKEN: &str = "valid-google-id-token";

/// Bearer credential the mock issues and expects
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// Link token returned by /plaid/link_token
pub const MOCK_LINK_TOKEN: &str = "link-sandbox-mock";

#[derive(Debug, Default)]
struct ServerState {
    manual: Vec<RawManualTransaction>,
    linked: Vec<RawLinkedTransaction>,
    next_id: i64,
    fail_linked: bool,
    linked_public_token: Option<String>,
    last_summary_days: Option<u32>,
}

type SharedState = Arc<Mutex<ServerState>>;

type HandlerResult<T> = std::result::Result<T, (StatusCode, Json<Value>)>;

/// Mock finance backend for testing and development
pub struct MockFinanceServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockFinanceServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(Vec::new(), Vec::new()).await
    }

    /// Start with seeded manual and linked transactions
    pub async fn start_with(
        manual: Vec<RawManualTransaction>,
        linked: Vec<RawLinkedTransaction>,
    ) -> Self {
        let next_id = manual.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let state = Arc::new(Mutex::new(ServerState {
            manual,
            linked,
            next_id,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/auth/google", post(handle_google_login))
            .route(
                "/transactions",
                get(handle_list_manual).post(handle_create_manual),
            )
            .route("/transactions/summary", get(handle_summary))
            .route(
                "/transactions/:id",
                put(handle_update_manual).delete(handle_delete_manual),
            )
            .route("/plaid/link_token", post(handle_link_token))
            .route("/plaid/set_access_token", post(handle_set_access_token))
            .route("/plaid/transactions", get(handle_list_active_linked))
            .route("/plaid/all_transactions", get(handle_list_all_linked))
            .route(
                "/plaid/delete_transaction/:id",
                delete(handle_soft_delete_linked),
            )
            .route(
                "/plaid/restore_transaction/:id",
                post(handle_restore_linked),
            )
            .route(
                "/plaid/restore_all_transactions",
                post(handle_restore_all_linked),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make both linked-transaction list endpoints answer 500
    pub fn fail_linked(&self, fail: bool) {
        self.state.lock().unwrap().fail_linked = fail;
    }

    pub fn manual(&self) -> Vec<RawManualTransaction> {
        self.state.lock().unwrap().manual.clone()
    }

    pub fn linked(&self) -> Vec<RawLinkedTransaction> {
        self.state.lock().unwrap().linked.clone()
    }

    /// Public token received by /plaid/set_access_token
    pub fn linked_public_token(&self) -> Option<String> {
        self.state.lock().unwrap().linked_public_token.clone()
    }

    /// `days` of the last summary request
    pub fn last_summary_days(&self) -> Option<u32> {
        self.state.lock().unwrap().last_summary_days
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockFinanceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn error(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

fn authorize(headers: &HeaderMap) -> HandlerResult<()> {
    let expected = format!("Bearer {}", MOCK_ACCESS_TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Could not validate credentials")),
    }
}

#[derive(Debug, Deserialize)]
struct GoogleLogin {
    token: String,
}

async fn handle_google_login(Json(body): Json<GoogleLogin>) -> HandlerResult<Json<Value>> {
    if body.token != VALID_GOOGLE_TOKEN {
        return Err(error(StatusCode::FORBIDDEN, "Invalid token"));
    }
    Ok(Json(json!({ "access_token": MOCK_ACCESS_TOKEN, "token_type": "bearer" })))
}

async fn handle_list_manual(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> HandlerResult<Json<Vec<RawManualTransaction>>> {
    authorize(&headers)?;
    Ok(Json(state.lock().unwrap().manual.clone()))
}

async fn handle_create_manual(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(draft): Json<TransactionDraft>,
) -> HandlerResult<(StatusCode, Json<RawManualTransaction>)> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let tx = RawManualTransaction {
        id: state.next_id,
        amount: draft.amount,
        category: draft.category,
        description: draft.description,
        timestamp: "2024-06-01T12:00:00.000000".to_string(),
    };
    state.next_id += 1;
    state.manual.push(tx.clone());
    Ok((StatusCode::CREATED, Json(tx)))
}

async fn handle_update_manual(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<TransactionDraft>,
) -> HandlerResult<Json<RawManualTransaction>> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let tx = state
        .manual
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Transaction not found"))?;
    tx.amount = draft.amount;
    tx.category = draft.category;
    tx.description = draft.description;
    Ok(Json(tx.clone()))
}

async fn handle_delete_manual(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> HandlerResult<StatusCode> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let before = state.manual.len();
    state.manual.retain(|t| t.id != id);
    if state.manual.len() == before {
        return Err(error(StatusCode::NOT_FOUND, "Transaction not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    days: Option<u32>,
}

async fn handle_summary(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<SummaryQuery>,
) -> HandlerResult<Json<SpendingSummary>> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    state.last_summary_days = query.days;
    let mut summary = SpendingSummary::new();
    for tx in &state.manual {
        *summary.entry(tx.category.clone()).or_insert(0.0) += tx.amount;
    }
    Ok(Json(summary))
}

async fn handle_link_token(headers: HeaderMap) -> HandlerResult<Json<Value>> {
    authorize(&headers)?;
    Ok(Json(json!({ "link_token": MOCK_LINK_TOKEN, "expiration": "2099-01-01T00:00:00Z" })))
}

#[derive(Debug, Deserialize)]
struct SetAccessToken {
    #[serde(default)]
    public_token: String,
}

async fn handle_set_access_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<SetAccessToken>,
) -> HandlerResult<Json<Value>> {
    authorize(&headers)?;
    if body.public_token.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Missing public_token"));
    }
    state.lock().unwrap().linked_public_token = Some(body.public_token);
    Ok(Json(json!({ "message": "Plaid access token saved successfully" })))
}

fn linked_list(state: &SharedState, include_deleted: bool) -> HandlerResult<Json<LinkedTransactionList>> {
    let state = state.lock().unwrap();
    if state.fail_linked {
        return Err(error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Plaid fetch failed: mock outage",
        ));
    }
    Ok(Json(LinkedTransactionList {
        transactions: state
            .linked
            .iter()
            .filter(|t| include_deleted || !t.is_deleted)
            .cloned()
            .collect(),
    }))
}

async fn handle_list_active_linked(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> HandlerResult<Json<LinkedTransactionList>> {
    authorize(&headers)?;
    linked_list(&state, false)
}

async fn handle_list_all_linked(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> HandlerResult<Json<LinkedTransactionList>> {
    authorize(&headers)?;
    linked_list(&state, true)
}

fn set_linked_deleted(state: &SharedState, id: &str, deleted: bool) -> HandlerResult<Json<Value>> {
    let mut state = state.lock().unwrap();
    let tx = state
        .linked
        .iter_mut()
        .find(|t| t.transaction_id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Plaid transaction not found"))?;
    tx.is_deleted = deleted;
    Ok(Json(json!({ "transaction_id": id, "is_deleted": deleted })))
}

async fn handle_soft_delete_linked(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    authorize(&headers)?;
    set_linked_deleted(&state, &id, true)
}

async fn handle_restore_linked(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    authorize(&headers)?;
    set_linked_deleted(&state, &id, false)
}

async fn handle_restore_all_linked(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> HandlerResult<Json<Value>> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let mut restored = 0;
    for tx in state.linked.iter_mut().filter(|t| t.is_deleted) {
        tx.is_deleted = false;
        restored += 1;
    }
    Ok(Json(json!({ "restored": restored })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FinanceApi;
    use crate::client::ApiClient;
    use crate::error::Error;
    use crate::storage::Credential;

    #[tokio::test]
    async fn test_mock_server_login() {
        let server = MockFinanceServer::start().await;
        let client = ApiClient::new(&server.url());

        let credential = client
            .exchange_google_token(VALID_GOOGLE_TOKEN)
            .await
            .unwrap();
        assert_eq!(credential.token(), MOCK_ACCESS_TOKEN);
    }

    #[tokio::test]
    async fn test_mock_server_rejects_bad_google_token() {
        let server = MockFinanceServer::start().await;
        let client = ApiClient::new(&server.url());

        match client.exchange_google_token("forged").await {
            Err(Error::Api { status, detail }) => {
                assert_eq!(status, 403);
                assert_eq!(detail, "Invalid token");
            }
            other => panic!("expected 403, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_server_requires_bearer() {
        let server = MockFinanceServer::start().await;
        let client = ApiClient::new(&server.url()).authenticated(Credential::new("wrong"));

        assert!(matches!(client.list_manual().await, Err(Error::LoginRequired)));
    }

    #[tokio::test]
    async fn test_mock_server_not_found_detail() {
        let server = MockFinanceServer::start().await;
        let client = ApiClient::new(&server.url()).authenticated(Credential::new(MOCK_ACCESS_TOKEN));

        match client.delete_manual(42).await {
            Err(Error::Api { status, detail }) => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Transaction not found");
            }
            other => panic!("expected 404, got {:?}", other),
        }
    }
}
