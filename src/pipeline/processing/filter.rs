use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::domain::Transaction;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::normalize_region;

/// Optional filters applied to validated transactions before enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionFilter {
    /// Region match after the same normalization as the region column
    pub region: Option<String>,
    /// Inclusive bounds on line amount (quantity × unit price)
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

/// How many transactions each filter removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub input: usize,
    pub filtered_by_region: usize,
    pub filtered_by_amount: usize,
    pub retained: usize,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    /// Region filter first, then amount, as separate passes so each removal is attributable
    pub fn apply(&self, transactions: Vec<Transaction>) -> (Vec<Transaction>, FilterSummary) {
        let input = transactions.len();

        let retained: Vec<Transaction> = match &self.region {
            Some(region) => {
                let wanted = normalize_region(region);
                transactions
                    .into_iter()
                    .filter(|tx| tx.region.eq_ignore_ascii_case(&wanted))
                    .collect()
            }
            None => transactions,
        };
        let filtered_by_region = input - retained.len();
        if let Some(region) = &self.region {
            info!("Filtered by region '{}': {} removed", region, filtered_by_region);
            metrics::filter::records_removed("region", filtered_by_region);
        }

        let after_region = retained.len();
        let retained: Vec<Transaction> = retained
            .into_iter()
            .filter(|tx| {
                let amount = tx.revenue();
                self.min_amount.map_or(true, |min| amount >= min)
                    && self.max_amount.map_or(true, |max| amount <= max)
            })
            .collect();
        let filtered_by_amount = after_region - retained.len();
        if self.min_amount.is_some() || self.max_amount.is_some() {
            info!("Filtered by amount: {} removed", filtered_by_amount);
            metrics::filter::records_removed("amount", filtered_by_amount);
        }

        let summary = FilterSummary {
            input,
            filtered_by_region,
            filtered_by_amount,
            retained: retained.len(),
        };
        (retained, summary)
    }
}
