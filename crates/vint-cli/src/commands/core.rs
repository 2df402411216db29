//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve config from file, environment and flags
//! - `open_session` / `connect` - Stored credential and the client built on it
//! - `open_reconciler` - Transaction reconciler over the backend
//! - `login_error` / `form_error` - Map library errors to CLI messages

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use vint_core::{
    ApiClient, AuthenticatedClient, ClientConfig, Error, Invalidator, LocalStore, Session,
    TransactionReconciler,
};

/// Config layers: embedded default < override file < environment < flags
pub fn load_config(api_url: Option<String>, data_dir: Option<PathBuf>) -> Result<ClientConfig> {
    let config = ClientConfig::load().context("Failed to load config")?;
    Ok(config.with_overrides(api_url, data_dir))
}

pub fn open_store(config: &ClientConfig) -> LocalStore {
    LocalStore::open(&config.data_dir)
}

pub fn open_session(config: &ClientConfig) -> Session {
    Session::new(open_store(config))
}

/// Authenticated client for the stored session
pub fn connect(config: &ClientConfig) -> Result<Arc<AuthenticatedClient>> {
    let credential = open_session(config)
        .require()
        .map_err(login_error)?;
    Ok(Arc::new(
        ApiClient::new(&config.api_url).authenticated(credential),
    ))
}

pub fn open_reconciler(config: &ClientConfig) -> Result<TransactionReconciler<AuthenticatedClient>> {
    let client = connect(config)?;
    Ok(TransactionReconciler::new(
        client,
        Arc::new(open_store(config)),
        Invalidator::new(),
    ))
}

/// Turn a missing or rejected credential into login instructions
pub fn login_error(err: Error) -> anyhow::Error {
    match err {
        Error::LoginRequired => {
            anyhow!("Not logged in. Run 'vint login --google-token <TOKEN>' first.")
        }
        other => other.into(),
    }
}

/// Error for a failed form submission, using the backend's detail when present
pub fn form_error(err: Error, fallback: &str) -> anyhow::Error {
    match err {
        Error::LoginRequired => login_error(err),
        other => anyhow!(other.user_message(fallback)),
    }
}
