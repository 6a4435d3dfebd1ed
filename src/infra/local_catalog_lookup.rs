use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::app::ports::ProductLookupPort;
use crate::domain::ProductInfo;
use crate::error::{LookupError, PipelineError, Result};

/// Deterministic product lookup backed by a local TOML catalogue.
///
/// ```toml
/// [[products]]
/// name = "Laptop"
/// category = "laptops"
/// price = 1299.00
/// brand = "Apple"
/// rating = 4.7
/// ```
#[derive(Debug, Default)]
pub struct LocalCatalogLookup {
    products: HashMap<String, ProductInfo>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    category: String,
    price: Decimal,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl LocalCatalogLookup {
    /// An empty catalogue: every lookup fails and falls back
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read product catalogue '{}': {}", path.display(), e))
        })?;
        let catalog = Self::from_toml(&content)?;
        info!("Loaded {} products from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        Ok(file
            .products
            .into_iter()
            .map(|entry| {
                (
                    entry.name,
                    ProductInfo {
                        category: entry.category,
                        price: entry.price,
                        brand: entry.brand,
                        rating: entry.rating,
                    },
                )
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<(String, ProductInfo)> for LocalCatalogLookup {
    fn from_iter<I: IntoIterator<Item = (String, ProductInfo)>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().map(|(name, info)| (key(&name), info)).collect(),
        }
    }
}

#[async_trait]
impl ProductLookupPort for LocalCatalogLookup {
    async fn lookup(&self, product: &str) -> std::result::Result<ProductInfo, LookupError> {
        self.products
            .get(&key(product))
            .cloned()
            .ok_or_else(|| LookupError::UnknownProduct(product.to_string()))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
