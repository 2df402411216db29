//! Spending dashboard: category totals for the chart

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::api::FinanceApi;
use crate::colors::color_for_category;
use crate::error::Result;
use crate::invalidation::Subscription;
use crate::models::{CategoryTotal, NormalizedTransaction, SpendingSummary};

/// How far back the summary reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryWindow {
    Days7,
    #[default]
    Days30,
    Days90,
}

impl SummaryWindow {
    pub fn days(&self) -> u32 {
        match self {
            Self::Days7 => 7,
            Self::Days30 => 30,
            Self::Days90 => 90,
        }
    }

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Days7),
            30 => Some(Self::Days30),
            90 => Some(Self::Days90),
            _ => None,
        }
    }

    pub fn all() -> &'static [SummaryWindow] {
        &[Self::Days7, Self::Days30, Self::Days90]
    }
}

impl std::str::FromStr for SummaryWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .strip_suffix('d')
            .unwrap_or(trimmed)
            .parse::<u32>()
            .ok()
            .and_then(Self::from_days)
            .ok_or_else(|| format!("Unsupported window: {} (use 7, 30 or 90)", s))
    }
}

impl std::fmt::Display for SummaryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Days", self.days())
    }
}

/// Chart rows from a server summary, largest total first
pub fn chart_rows(summary: &SpendingSummary) -> Vec<CategoryTotal> {
    let mut rows: Vec<CategoryTotal> = summary
        .iter()
        .map(|(category, total)| CategoryTotal {
            category: category.clone(),
            total: *total,
            color: color_for_category(category),
        })
        .collect();
    sort_rows(&mut rows);
    rows
}

/// Client-side totals over an already merged list
pub fn sum_by_category(transactions: &[NormalizedTransaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for tx in transactions {
        *totals.entry(tx.category.as_str()).or_insert(0.0) += tx.amount;
    }
    let mut rows: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
            color: color_for_category(category),
        })
        .collect();
    sort_rows(&mut rows);
    rows
}

fn sort_rows(rows: &mut [CategoryTotal]) {
    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
}

/// Cached summary that reloads when told its data went stale
pub struct Dashboard<A: FinanceApi> {
    api: Arc<A>,
    window: SummaryWindow,
    rows: Vec<CategoryTotal>,
    subscription: Subscription,
}

impl<A: FinanceApi> Dashboard<A> {
    pub fn new(api: Arc<A>, window: SummaryWindow, subscription: Subscription) -> Self {
        Self {
            api,
            window,
            rows: Vec::new(),
            subscription,
        }
    }

    pub fn window(&self) -> SummaryWindow {
        self.window
    }

    pub fn rows(&self) -> &[CategoryTotal] {
        &self.rows
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.total).sum()
    }

    pub async fn load(&mut self) -> Result<&[CategoryTotal]> {
        let summary = self.api.spending_summary(self.window.days()).await?;
        self.rows = chart_rows(&summary);
        debug!(
            "Loaded {} categories for {}",
            self.rows.len(),
            self.window
        );
        Ok(&self.rows)
    }

    /// Switch window and reload
    pub async fn set_window(&mut self, window: SummaryWindow) -> Result<&[CategoryTotal]> {
        self.window = window;
        self.load().await
    }

    /// Reload if a staleness signal arrived since the last check
    pub async fn refresh_if_stale(&mut self) -> Result<bool> {
        if !self.subscription.take_stale() {
            return Ok(false);
        }
        debug!("Dashboard stale, reloading");
        self.load().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockCall};
    use crate::invalidation::{Invalidation, Invalidator};
    use crate::models::{RawManualTransaction, TransactionKey, TransactionSource};

    fn manual(id: i64, amount: f64, category: &str) -> RawManualTransaction {
        RawManualTransaction {
            id,
            amount,
            category: category.to_string(),
            description: None,
            timestamp: "2024-01-01T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_window_parse() {
        assert_eq!("7".parse::<SummaryWindow>().unwrap(), SummaryWindow::Days7);
        assert_eq!("90d".parse::<SummaryWindow>().unwrap(), SummaryWindow::Days90);
        assert!("14".parse::<SummaryWindow>().is_err());
        assert!("7ddd".parse::<SummaryWindow>().is_err());
        assert!("30dd".parse::<SummaryWindow>().is_err());
        assert!("d".parse::<SummaryWindow>().is_err());
        assert_eq!(SummaryWindow::default().days(), 30);
        assert_eq!(SummaryWindow::all().len(), 3);
    }

    #[test]
    fn test_chart_rows_sorted_descending() {
        let mut summary = SpendingSummary::new();
        summary.insert("Food".to_string(), 20.0);
        summary.insert("Rent".to_string(), 900.0);
        summary.insert("Coffee".to_string(), 20.0);

        let rows = chart_rows(&summary);
        let order: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(order, vec!["Rent", "Coffee", "Food"]);
        assert_eq!(rows[0].color, color_for_category("Rent"));
    }

    #[test]
    fn test_sum_by_category() {
        let tx = |id: i64, amount: f64, category: &str| NormalizedTransaction {
            id: TransactionKey::Manual(id),
            name: category.to_string(),
            amount,
            date: "2024-01-01".to_string(),
            category: category.to_string(),
            description: String::new(),
            source: TransactionSource::Manual,
            is_deleted: false,
        };
        let rows = sum_by_category(&[tx(1, 5.0, "Food"), tx(2, 7.5, "Food"), tx(3, 3.0, "Bank")]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "Food");
        assert_eq!(rows[0].total, 12.5);
    }

    #[tokio::test]
    async fn test_load_uses_window() {
        let api = Arc::new(MockApi::with_data(
            vec![manual(1, 5.0, "Food"), manual(2, 10.0, "Rent")],
            vec![],
        ));
        let invalidator = Invalidator::new();
        let mut dashboard = Dashboard::new(api.clone(), SummaryWindow::Days7, invalidator.subscribe());

        let rows = dashboard.load().await.unwrap();
        assert_eq!(rows[0].category, "Rent");
        assert!(api.calls().contains(&MockCall::Summary(7)));

        dashboard.set_window(SummaryWindow::Days90).await.unwrap();
        assert!(api.calls().contains(&MockCall::Summary(90)));
        assert_eq!(dashboard.total(), 15.0);
    }

    #[tokio::test]
    async fn test_refresh_only_when_stale() {
        let api = Arc::new(MockApi::with_data(vec![manual(1, 5.0, "Food")], vec![]));
        let invalidator = Invalidator::new();
        let mut dashboard =
            Dashboard::new(api.clone(), SummaryWindow::default(), invalidator.subscribe());
        dashboard.load().await.unwrap();

        assert!(!dashboard.refresh_if_stale().await.unwrap());
        assert_eq!(api.call_count(&MockCall::Summary(0)), 1);

        invalidator.publish(Invalidation::DashboardStale);
        assert!(dashboard.refresh_if_stale().await.unwrap());
        assert_eq!(api.call_count(&MockCall::Summary(0)), 2);
    }

    #[tokio::test]
    async fn test_load_failure_is_returned() {
        let api = Arc::new(MockApi::new());
        api.fail(MockCall::Summary(0));
        let mut dashboard =
            Dashboard::new(api, SummaryWindow::default(), Invalidator::new().subscribe());
        assert!(dashboard.load().await.is_err());
    }
}
