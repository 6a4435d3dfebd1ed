use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::FIELD_DELIMITER;
use crate::error::RejectionReason;

/// Columns that can appear in an input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    TransactionId,
    Date,
    ProductId,
    Product,
    Quantity,
    Price,
    Customer,
    Region,
}

impl Column {
    /// Field name used in rejection reasons and logs
    pub fn name(&self) -> &'static str {
        match self {
            Column::TransactionId => "transaction_id",
            Column::Date => "date",
            Column::ProductId => "product_id",
            Column::Product => "product",
            Column::Quantity => "quantity",
            Column::Price => "price",
            Column::Customer => "customer",
            Column::Region => "region",
        }
    }

    /// Header label used in the enriched output file
    pub fn header(&self) -> &'static str {
        match self {
            Column::TransactionId => "TransactionID",
            Column::Date => "Date",
            Column::ProductId => "ProductID",
            Column::Product => "ProductName",
            Column::Quantity => "Quantity",
            Column::Price => "UnitPrice",
            Column::Customer => "CustomerID",
            Column::Region => "Region",
        }
    }
}

/// Known line layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `date|customer|product|quantity|price|region`
    #[default]
    Basic,
    /// `transaction_id|date|product_id|product|quantity|price|customer|region`
    Extended,
}

/// Fixed column order of an input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn for_layout(layout: Layout) -> Self {
        let columns = match layout {
            Layout::Basic => vec![
                Column::Date,
                Column::Customer,
                Column::Product,
                Column::Quantity,
                Column::Price,
                Column::Region,
            ],
            Layout::Extended => vec![
                Column::TransactionId,
                Column::Date,
                Column::ProductId,
                Column::Product,
                Column::Quantity,
                Column::Price,
                Column::Customer,
                Column::Region,
            ],
        };
        Self { columns }
    }

    pub fn basic() -> Self {
        Self::for_layout(Layout::Basic)
    }

    pub fn extended() -> Self {
        Self::for_layout(Layout::Extended)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn has(&self, column: Column) -> bool {
        self.position(column).is_some()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::basic()
    }
}

/// A validated sales transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 1-based line number in the input file
    pub line: usize,
    pub transaction_id: Option<String>,
    pub date: NaiveDate,
    pub customer: String,
    pub product_id: Option<String>,
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub region: String,
}

impl Transaction {
    /// Line amount: quantity × unit price
    pub fn revenue(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// Serialize back into a pipe-delimited line in the given column order
    pub fn to_line(&self, schema: &Schema) -> String {
        let delimiter = FIELD_DELIMITER.to_string();
        schema
            .columns()
            .iter()
            .map(|column| self.field(*column))
            .collect::<Vec<_>>()
            .join(&delimiter)
    }

    /// Text value of a single column
    pub fn field(&self, column: Column) -> String {
        match column {
            Column::TransactionId => self.transaction_id.clone().unwrap_or_default(),
            Column::Date => self.date.format("%Y-%m-%d").to_string(),
            Column::ProductId => self.product_id.clone().unwrap_or_default(),
            Column::Product => self.product.clone(),
            Column::Quantity => self.quantity.to_string(),
            Column::Price => self.unit_price.to_string(),
            Column::Customer => self.customer.clone(),
            Column::Region => self.region.clone(),
        }
    }
}

/// Pipeline stage that turned a line away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionStage {
    Parse,
    Normalization,
    Validation,
}

impl RejectionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionStage::Parse => "parse",
            RejectionStage::Normalization => "normalization",
            RejectionStage::Validation => "validation",
        }
    }
}

/// A line that did not become a transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub line: usize,
    pub raw: String,
    pub stage: RejectionStage,
    pub reason: RejectionReason,
}

/// Product metadata returned by a lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Where an enriched transaction's metadata came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnrichmentSource {
    Catalog,
    Fallback { reason: String },
}

/// A transaction with product metadata attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    pub category: String,
    pub current_price: Decimal,
    pub brand: Option<String>,
    pub rating: Option<f64>,
    pub source: EnrichmentSource,
}

impl EnrichedTransaction {
    pub fn is_matched(&self) -> bool {
        matches!(self.source, EnrichmentSource::Catalog)
    }

    pub fn revenue(&self) -> Decimal {
        self.transaction.revenue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn widget() -> Transaction {
        Transaction {
            line: 2,
            transaction_id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            customer: "C001".to_string(),
            product_id: None,
            product: "Widget, Deluxe".to_string(),
            quantity: 3,
            unit_price: dec!(19.99),
            region: "East".to_string(),
        }
    }

    #[test]
    fn test_revenue_is_exact() {
        assert_eq!(widget().revenue(), dec!(59.97));
    }

    #[test]
    fn test_to_line_uses_schema_order() {
        assert_eq!(
            widget().to_line(&Schema::basic()),
            "2024-01-05|C001|Widget, Deluxe|3|19.99|East"
        );
    }

    #[test]
    fn test_schema_widths() {
        assert_eq!(Schema::basic().width(), 6);
        assert_eq!(Schema::extended().width(), 8);
        assert_eq!(Schema::extended().position(Column::Product), Some(3));
        assert!(!Schema::basic().has(Column::TransactionId));
    }
}
