use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::app::ports::ProductLookupPort;
use crate::domain::ProductInfo;
use crate::error::{LookupError, Result};

/// Product lookup against a DummyJSON-compatible catalogue API
pub struct HttpProductLookup {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

#[derive(Debug, Deserialize)]
struct CatalogProduct {
    title: String,
    category: String,
    price: f64,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
}

impl HttpProductLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sales_pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/products/search", self.base_url)
    }
}

/// Pick the product whose title matches the name, ignoring case
fn select_match(products: Vec<CatalogProduct>, name: &str) -> std::result::Result<ProductInfo, LookupError> {
    let wanted = name.trim().to_lowercase();
    let product = products
        .into_iter()
        .find(|p| p.title.trim().to_lowercase() == wanted)
        .ok_or_else(|| LookupError::UnknownProduct(name.to_string()))?;

    let price = Decimal::from_str(&product.price.to_string()).map_err(|e| {
        LookupError::InvalidResponse(format!("price {} for '{}': {}", product.price, product.title, e))
    })?;

    Ok(ProductInfo {
        category: product.category,
        price,
        brand: product.brand,
        rating: product.rating,
    })
}

#[async_trait]
impl ProductLookupPort for HttpProductLookup {
    async fn lookup(&self, product: &str) -> std::result::Result<ProductInfo, LookupError> {
        let url = self.search_url();
        debug!(%url, product, "Querying product catalogue");

        let response = self
            .client
            .get(&url)
            .query(&[("q", product)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout(self.timeout)
                } else {
                    LookupError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LookupError::Timeout(self.timeout)
            } else {
                LookupError::Unavailable(e.to_string())
            }
        })?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::InvalidResponse(e.to_string()))?;

        select_match(parsed.products, product)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
