use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::app::ports::ProductLookupPort;
use crate::config::EnrichmentConfig;
use crate::domain::{EnrichedTransaction, EnrichmentSource, ProductInfo, Transaction};
use crate::error::LookupError;
use crate::observability::metrics;

/// Attaches product metadata to validated transactions.
///
/// Each distinct product name is looked up once per batch. A failed or
/// timed-out lookup falls back to the default category and the
/// transaction's own unit price, so enrichment never fails a run.
pub struct Enricher {
    lookup: Box<dyn ProductLookupPort>,
    timeout: Duration,
    default_category: String,
}

impl Enricher {
    pub fn new(lookup: Box<dyn ProductLookupPort>, config: &EnrichmentConfig) -> Self {
        Self {
            lookup,
            timeout: Duration::from_millis(config.timeout_ms),
            default_category: config.default_category.clone(),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.lookup.name()
    }

    #[instrument(skip_all, fields(source = self.lookup.name(), transactions = transactions.len()))]
    pub async fn enrich_all(&self, transactions: Vec<Transaction>) -> Vec<EnrichedTransaction> {
        let mut outcomes: HashMap<String, Result<ProductInfo, LookupError>> = HashMap::new();
        let mut enriched = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let outcome = match outcomes.entry(transaction.product.clone()) {
                Entry::Occupied(entry) => &*entry.into_mut(),
                Entry::Vacant(entry) => {
                    let outcome = self.lookup_with_timeout(&transaction.product).await;
                    &*entry.insert(outcome)
                }
            };
            enriched.push(match outcome {
                Ok(info) => {
                    metrics::enrich::matched();
                    attach(transaction, info.clone())
                }
                Err(error) => {
                    metrics::enrich::fallback(error.kind());
                    self.fallback(transaction, error)
                }
            });
        }
        info!("Looked up {} distinct products", outcomes.len());

        let matched = enriched.iter().filter(|e| e.is_matched()).count();
        info!(
            matched,
            fallback = enriched.len() - matched,
            "Enrichment complete"
        );
        enriched
    }

    async fn lookup_with_timeout(&self, product: &str) -> Result<ProductInfo, LookupError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.lookup.lookup(product))
            .await
            .unwrap_or(Err(LookupError::Timeout(self.timeout)));
        metrics::enrich::lookup(self.lookup.name(), started.elapsed().as_secs_f64());

        match &outcome {
            Ok(info) => debug!(product, category = %info.category, "Product matched"),
            Err(error) => warn!(product, error = %error, "Lookup failed; using fallback"),
        }
        outcome
    }

    /// Default enrichment for a transaction whose lookup failed
    pub fn fallback(&self, transaction: Transaction, error: &LookupError) -> EnrichedTransaction {
        EnrichedTransaction {
            category: self.default_category.clone(),
            current_price: transaction.unit_price,
            brand: None,
            rating: None,
            source: EnrichmentSource::Fallback {
                reason: error.to_string(),
            },
            transaction,
        }
    }
}

fn attach(transaction: Transaction, info: ProductInfo) -> EnrichedTransaction {
    EnrichedTransaction {
        transaction,
        category: info.category,
        current_price: info.price,
        brand: info.brand,
        rating: info.rating,
        source: EnrichmentSource::Catalog,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubLookup {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProductLookupPort for StubLookup {
        async fn lookup(&self, product: &str) -> Result<ProductInfo, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match product {
                "Laptop" => Ok(ProductInfo {
                    category: "laptops".to_string(),
                    price: dec!(1299.00),
                    brand: Some("Apple".to_string()),
                    rating: Some(4.5),
                }),
                "Widget, Deluxe" => Err(LookupError::Unavailable("connection refused".to_string())),
                other => Err(LookupError::UnknownProduct(other.to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct HangingLookup;

    #[async_trait]
    impl ProductLookupPort for HangingLookup {
        async fn lookup(&self, _product: &str) -> Result<ProductInfo, LookupError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(LookupError::Unavailable("unreachable".to_string()))
        }

        fn name(&self) -> &'static str {
            "hanging"
        }
    }

    fn create_test_transaction(product: &str, price: Decimal) -> Transaction {
        Transaction {
            line: 2,
            transaction_id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            customer: "C001".to_string(),
            product_id: None,
            product: product.to_string(),
            quantity: 3,
            unit_price: price,
            region: "East".to_string(),
        }
    }

    fn enricher(lookup: Box<dyn ProductLookupPort>, timeout_ms: u64) -> Enricher {
        let config = EnrichmentConfig {
            timeout_ms,
            ..EnrichmentConfig::default()
        };
        Enricher::new(lookup, &config)
    }

    #[tokio::test]
    async fn test_unreachable_source_falls_back_to_unit_price() {
        let calls = Arc::new(AtomicUsize::new(0));
        let enricher = enricher(Box::new(StubLookup { calls }), 1_000);

        let enriched = enricher
            .enrich_all(vec![create_test_transaction("Widget, Deluxe", dec!(19.99))])
            .await;

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].category, "Uncategorized");
        assert_eq!(enriched[0].current_price, dec!(19.99));
        assert!(!enriched[0].is_matched());
        assert!(matches!(
            &enriched[0].source,
            EnrichmentSource::Fallback { reason } if reason.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn test_each_product_looked_up_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let enricher = enricher(Box::new(StubLookup { calls: calls.clone() }), 1_000);

        let enriched = enricher
            .enrich_all(vec![
                create_test_transaction("Laptop", dec!(1200)),
                create_test_transaction("Mystery Box", dec!(5)),
                create_test_transaction("Laptop", dec!(1250)),
                create_test_transaction("Mystery Box", dec!(6)),
            ])
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(enriched.len(), 4);
        assert!(enriched[0].is_matched());
        assert_eq!(enriched[0].current_price, dec!(1299.00));
        assert_eq!(enriched[0].brand.as_deref(), Some("Apple"));
        // One failing product leaves the others untouched
        assert!(!enriched[1].is_matched());
        assert!(enriched[2].is_matched());
        assert_eq!(enriched[2].transaction.unit_price, dec!(1250));
        // A repeated failure reuses the first outcome and keeps its own price
        assert!(matches!(
            &enriched[3].source,
            EnrichmentSource::Fallback { reason } if reason.contains("Mystery Box")
        ));
        assert_eq!(enriched[3].current_price, dec!(6));
    }

    #[tokio::test]
    async fn test_hanging_lookup_times_out() {
        let enricher = enricher(Box::new(HangingLookup), 50);
        let started = Instant::now();

        let enriched = enricher
            .enrich_all(vec![create_test_transaction("Laptop", dec!(10))])
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(enriched[0].current_price, dec!(10));
        assert!(matches!(
            &enriched[0].source,
            EnrichmentSource::Fallback { reason } if reason.contains("timed out")
        ));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let enricher = enricher(Box::new(StubLookup { calls: calls.clone() }), 1_000);
        assert!(enricher.enrich_all(Vec::new()).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
