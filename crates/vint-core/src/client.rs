//! HTTP client for the finance backend
//!
//! `ApiClient` covers the unauthenticated login exchange. Everything else
//! goes through `AuthenticatedClient`, which is built once per session from
//! an explicit [`Credential`] and attaches it to every request.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::FinanceApi;
use crate::error::{Error, Result};
use crate::models::{
    AccessTokenResponse, ErrorBody, GoogleTokenRequest, LinkTokenResponse, LinkedTransactionList,
    PublicTokenRequest, RawLinkedTransaction, RawManualTransaction, SpendingSummary,
    TransactionDraft,
};
use crate::storage::Credential;

/// Client for endpoints that need no credential
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange a Google ID token for a session credential (POST /auth/google)
    pub async fn exchange_google_token(&self, id_token: &str) -> Result<Credential> {
        let response = self
            .http_client
            .post(format!("{}/auth/google", self.base_url))
            .json(&GoogleTokenRequest {
                token: id_token.to_string(),
            })
            .send()
            .await?;

        let body: AccessTokenResponse = parse_json(check_status(response).await?).await?;
        if body.access_token.is_empty() {
            return Err(Error::InvalidData("Backend returned an empty access token".into()));
        }
        Ok(Credential::new(body.access_token))
    }

    /// Client that sends `credential` with every request
    pub fn authenticated(&self, credential: Credential) -> AuthenticatedClient {
        AuthenticatedClient {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            credential,
        }
    }
}

/// Client for a signed-in session
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    http_client: Client,
    base_url: String,
    credential: Credential,
}

impl AuthenticatedClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(self.credential.token())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.credential.token())
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.http_client
            .put(format!("{}{}", self.base_url, path))
            .bearer_auth(self.credential.token())
    }

    /// `{base}{prefix}/{id}` with the provider ID encoded as a single path segment
    fn linked_url(&self, prefix: &str, transaction_id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, prefix))
            .map_err(|e| Error::Config(format!("Invalid API URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("API URL cannot take a path: {}", self.base_url)))?
            .push(transaction_id);
        Ok(url)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        self.http_client
            .delete(format!("{}{}", self.base_url, path))
            .bearer_auth(self.credential.token())
    }

    /// Start a bank-link session (POST /plaid/link_token)
    pub async fn create_link_token(&self) -> Result<String> {
        let response = self.post("/plaid/link_token").send().await?;
        let body: LinkTokenResponse = parse_json(check_status(response).await?).await?;
        debug!("Received link token");
        Ok(body.link_token)
    }

    /// Finish a bank link with the public token from Plaid Link
    pub async fn set_access_token(&self, public_token: &str) -> Result<()> {
        let response = self
            .post("/plaid/set_access_token")
            .json(&PublicTokenRequest {
                public_token: public_token.to_string(),
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl FinanceApi for AuthenticatedClient {
    async fn list_manual(&self) -> Result<Vec<RawManualTransaction>> {
        let response = self.get("/transactions").send().await?;
        parse_json(check_status(response).await?).await
    }

    async fn list_linked(&self, include_deleted: bool) -> Result<Vec<RawLinkedTransaction>> {
        let path = if include_deleted {
            "/plaid/all_transactions"
        } else {
            "/plaid/transactions"
        };
        let response = self.get(path).send().await?;
        let list: LinkedTransactionList = parse_json(check_status(response).await?).await?;
        Ok(list.transactions)
    }

    async fn create_manual(&self, draft: &TransactionDraft) -> Result<RawManualTransaction> {
        let response = self.post("/transactions").json(draft).send().await?;
        parse_json(check_status(response).await?).await
    }

    async fn update_manual(
        &self,
        id: i64,
        draft: &TransactionDraft,
    ) -> Result<RawManualTransaction> {
        let response = self
            .put(&format!("/transactions/{}", id))
            .json(draft)
            .send()
            .await?;
        parse_json(check_status(response).await?).await
    }

    async fn delete_manual(&self, id: i64) -> Result<()> {
        let response = self.delete(&format!("/transactions/{}", id)).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn soft_delete_linked(&self, transaction_id: &str) -> Result<()> {
        let url = self.linked_url("/plaid/delete_transaction", transaction_id)?;
        let response = self
            .http_client
            .delete(url)
            .bearer_auth(self.credential.token())
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn restore_linked(&self, transaction_id: &str) -> Result<()> {
        let url = self.linked_url("/plaid/restore_transaction", transaction_id)?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(self.credential.token())
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn restore_all_linked(&self) -> Result<()> {
        let response = self.post("/plaid/restore_all_transactions").send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn spending_summary(&self, days: u32) -> Result<SpendingSummary> {
        let response = self
            .get("/transactions/summary")
            .query(&[("days", days)])
            .send()
            .await?;
        parse_json(check_status(response).await?).await
    }
}

/// Map 401 to [`Error::LoginRequired`] and other failures to [`Error::Api`]
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    debug!("{} {}", status.as_u16(), response.url().path());

    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::LoginRequired);
    }

    let text = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        detail: error_detail(&text, status),
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// `detail` from a FastAPI error body, or the status reason
fn error_detail(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        let authed = client.authenticated(Credential::new("t"));
        assert_eq!(authed.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_linked_url_encodes_provider_id() {
        let client = ApiClient::new("http://localhost:8000").authenticated(Credential::new("t"));
        let url = client
            .linked_url("/plaid/delete_transaction", "acct/tx?1#x")
            .unwrap();
        assert_eq!(url.path(), "/plaid/delete_transaction/acct%2Ftx%3F1%23x");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let plain = client.linked_url("/plaid/restore_transaction", "p1").unwrap();
        assert_eq!(plain.as_str(), "http://localhost:8000/plaid/restore_transaction/p1");
    }

    #[test]
    fn test_error_detail_string() {
        let detail = error_detail(
            r#"{"detail": "Transaction not found"}"#,
            StatusCode::NOT_FOUND,
        );
        assert_eq!(detail, "Transaction not found");
    }

    #[test]
    fn test_error_detail_structured() {
        let detail = error_detail(
            r#"{"detail": [{"loc": ["body", "amount"], "msg": "field required"}]}"#,
            StatusCode::UNPROCESSABLE_ENTITY,
        );
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_error_detail_falls_back_to_reason() {
        let detail = error_detail("<html>oops</html>", StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, "Internal Server Error");
    }
}
