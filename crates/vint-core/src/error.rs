//! Error types for Vint

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// No credential, or the backend rejected it. Callers send the user to log in.
    #[error("Not logged in")]
    LoginRequired,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Message suitable for showing on a form after a failed write
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Api { detail, .. } if !detail.is_empty() => detail.clone(),
            Error::InvalidData(msg) => msg.clone(),
            Error::LoginRequired => "Please log in again".to_string(),
            _ => fallback.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
