//! Domain models for Vint

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator used when a provider category path is flattened for display
pub const CATEGORY_SEPARATOR: &str = " > ";

/// Display category for linked transactions the provider did not categorize
pub const DEFAULT_LINKED_CATEGORY: &str = "Bank";

/// A manually entered transaction, as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawManualTransaction {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO datetime, with or without an offset
    pub timestamp: String,
}

/// Category as the provider reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkedCategory {
    Single(String),
    /// Hierarchy from most general to most specific
    Path(Vec<String>),
}

/// A transaction imported from a linked bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLinkedTransaction {
    pub transaction_id: String,
    pub name: String,
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub category: Option<LinkedCategory>,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Envelope for the linked-transaction list endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedTransactionList {
    #[serde(default)]
    pub transactions: Vec<RawLinkedTransaction>,
}

/// Where a normalized transaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionSource {
    /// Entered by the user; hard-deleted, no soft-delete state
    Manual,
    /// Imported through Plaid; soft-deleted and restorable
    Plaid,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Plaid => "Plaid",
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Row identity within a merged list
///
/// Manual ids and provider ids live in separate variants, so `Manual(1)`
/// and `Linked("1")` never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionKey {
    Manual(i64),
    Linked(String),
}

impl TransactionKey {
    pub fn source(&self) -> TransactionSource {
        match self {
            Self::Manual(_) => TransactionSource::Manual,
            Self::Linked(_) => TransactionSource::Plaid,
        }
    }
}

impl std::fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual(id) => write!(f, "{}", id),
            Self::Linked(id) => write!(f, "{}", id),
        }
    }
}

/// A transaction in the single shape every view renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub id: TransactionKey,
    pub name: String,
    pub amount: f64,
    pub date: String,
    pub category: String,
    pub description: String,
    pub source: TransactionSource,
    pub is_deleted: bool,
}

impl NormalizedTransaction {
    /// Calendar date of the transaction, if the date string is valid
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_transaction_date(&self.date)
    }

    /// Whether the record can be shown at all (positive amount, valid date)
    pub fn is_displayable(&self) -> bool {
        self.amount.is_finite() && self.amount > 0.0 && self.parsed_date().is_some()
    }
}

impl From<RawManualTransaction> for NormalizedTransaction {
    fn from(raw: RawManualTransaction) -> Self {
        let description = raw.description.unwrap_or_default();
        let name = if description.trim().is_empty() {
            raw.category.clone()
        } else {
            description.clone()
        };
        Self {
            id: TransactionKey::Manual(raw.id),
            name,
            amount: raw.amount,
            date: raw.timestamp,
            category: raw.category,
            description,
            source: TransactionSource::Manual,
            is_deleted: false,
        }
    }
}

impl From<RawLinkedTransaction> for NormalizedTransaction {
    fn from(raw: RawLinkedTransaction) -> Self {
        Self {
            id: TransactionKey::Linked(raw.transaction_id),
            name: raw.name,
            amount: raw.amount,
            date: raw.date,
            category: display_category(raw.category.as_ref()),
            description: String::new(),
            source: TransactionSource::Plaid,
            is_deleted: raw.is_deleted,
        }
    }
}

/// Flatten a provider category into one display string
pub fn display_category(category: Option<&LinkedCategory>) -> String {
    match category {
        Some(LinkedCategory::Single(name)) if !name.trim().is_empty() => name.clone(),
        Some(LinkedCategory::Path(parts)) if !parts.is_empty() => parts.join(CATEGORY_SEPARATOR),
        _ => DEFAULT_LINKED_CATEGORY.to_string(),
    }
}

/// Parse any of the date shapes the backend and provider emit
///
/// Accepts RFC 3339 timestamps, naive ISO datetimes (with `T` or a space)
/// and plain `YYYY-MM-DD` dates.
pub fn parse_transaction_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Body for creating or updating a manual transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub amount: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionDraft {
    pub fn new(amount: f64, category: &str, description: Option<&str>) -> Result<Self> {
        if !amount.is_finite() {
            return Err(Error::InvalidData(format!("Invalid amount: {}", amount)));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::InvalidData("Category is required".into()));
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            amount,
            category: category.to_string(),
            description,
        })
    }
}

/// Category totals as returned by the summary endpoint
pub type SpendingSummary = BTreeMap<String, f64>;

/// One bar of the spending chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTokenResponse {
    pub link_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicTokenRequest {
    pub public_token: String,
}

/// FastAPI-style error body
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(category: Option<LinkedCategory>) -> RawLinkedTransaction {
        RawLinkedTransaction {
            transaction_id: "p1".to_string(),
            name: "Coffee".to_string(),
            amount: 4.0,
            date: "2024-01-02".to_string(),
            category,
            is_deleted: false,
        }
    }

    #[test]
    fn test_category_path_is_joined() {
        let tx: NormalizedTransaction = linked(Some(LinkedCategory::Path(vec![
            "Food".to_string(),
            "Coffee".to_string(),
        ])))
        .into();
        assert_eq!(tx.category, "Food > Coffee");
        assert_eq!(tx.source, TransactionSource::Plaid);
        assert_eq!(tx.id, TransactionKey::Linked("p1".to_string()));
    }

    #[test]
    fn test_missing_category_defaults_to_bank() {
        let tx: NormalizedTransaction = linked(None).into();
        assert_eq!(tx.category, "Bank");

        let tx: NormalizedTransaction = linked(Some(LinkedCategory::Path(vec![]))).into();
        assert_eq!(tx.category, "Bank");
    }

    #[test]
    fn test_single_category_passes_through() {
        let tx: NormalizedTransaction =
            linked(Some(LinkedCategory::Single("Travel".to_string()))).into();
        assert_eq!(tx.category, "Travel");
    }

    #[test]
    fn test_manual_name_falls_back_to_category() {
        let raw = RawManualTransaction {
            id: 7,
            amount: 12.5,
            category: "Food".to_string(),
            description: None,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };
        let tx: NormalizedTransaction = raw.into();
        assert_eq!(tx.id, TransactionKey::Manual(7));
        assert_eq!(tx.name, "Food");
        assert_eq!(tx.description, "");
        assert!(!tx.is_deleted);
    }

    #[test]
    fn test_linked_json_with_string_or_list_category() {
        let json = r#"{"transactions": [
            {"transaction_id": "a", "name": "Uber", "amount": 9.5, "date": "2024-03-01", "category": "Travel"},
            {"transaction_id": "b", "name": "Cafe", "amount": 3.0, "date": "2024-03-02", "category": ["Food", "Coffee"], "is_deleted": true},
            {"transaction_id": "c", "name": "ATM", "amount": 20.0, "date": "2024-03-03", "category": null}
        ]}"#;
        let list: LinkedTransactionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.transactions.len(), 3);
        assert!(!list.transactions[0].is_deleted);
        assert!(list.transactions[1].is_deleted);
        assert_eq!(display_category(list.transactions[2].category.as_ref()), "Bank");
    }

    #[test]
    fn test_keys_from_different_sources_never_collide() {
        assert_ne!(
            TransactionKey::Manual(1),
            TransactionKey::Linked("1".to_string())
        );
    }

    #[test]
    fn test_key_serializes_untagged() {
        assert_eq!(serde_json::to_string(&TransactionKey::Manual(1)).unwrap(), "1");
        assert_eq!(
            serde_json::to_string(&TransactionKey::Linked("p1".into())).unwrap(),
            r#""p1""#
        );
    }

    #[test]
    fn test_parse_transaction_date_formats() {
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert_eq!(parse_transaction_date("2024-01-01T00:00:00Z"), jan1);
        assert_eq!(parse_transaction_date("2024-01-01T10:30:00+02:00"), jan1);
        assert_eq!(parse_transaction_date("2024-01-01T00:00:00.123456"), jan1);
        assert_eq!(parse_transaction_date("2024-01-01 08:15:00"), jan1);
        assert_eq!(parse_transaction_date("2024-01-01"), jan1);
    }

    #[test]
    fn test_parse_transaction_date_rejects_invalid() {
        assert!(parse_transaction_date("").is_none());
        assert!(parse_transaction_date("not a date").is_none());
        assert!(parse_transaction_date("2024-02-30").is_none());
        assert!(parse_transaction_date("01/02/2024").is_none());
    }

    #[test]
    fn test_draft_validation() {
        let draft = TransactionDraft::new(12.5, " Food ", Some("  ")).unwrap();
        assert_eq!(draft.category, "Food");
        assert!(draft.description.is_none());

        assert!(TransactionDraft::new(f64::NAN, "Food", None).is_err());
        assert!(TransactionDraft::new(1.0, "   ", None).is_err());
    }

    #[test]
    fn test_draft_omits_missing_description() {
        let draft = TransactionDraft::new(5.0, "Food", None).unwrap();
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("description").is_none());
    }
}
