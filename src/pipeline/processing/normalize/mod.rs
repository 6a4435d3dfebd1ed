pub mod dates;
pub mod numbers;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Column, Rejection, RejectionStage, Schema};
use crate::error::RejectionReason;
use crate::pipeline::processing::parser::RawRecord;

pub use dates::DateNormalizer;

/// A typed candidate transaction. The normalizer only produces complete
/// records; `None` fields reach the quality gate from other producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub line: usize,
    pub raw: String,
    pub transaction_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub customer: Option<String>,
    pub product_id: Option<String>,
    pub product: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
    pub region: Option<String>,
}

impl NormalizedRecord {
    fn empty(record: &RawRecord) -> Self {
        Self {
            line: record.line,
            raw: record.raw.clone(),
            transaction_id: None,
            date: None,
            customer: None,
            product_id: None,
            product: None,
            quantity: None,
            unit_price: None,
            region: None,
        }
    }
}

/// Trait for normalizing parsed records into typed candidates
pub trait Normalizer {
    fn normalize(&self, record: &RawRecord) -> Result<NormalizedRecord, Rejection>;
}

/// Converts raw fields into typed values according to the schema
pub struct FieldNormalizer {
    schema: Schema,
    dates: DateNormalizer,
}

impl FieldNormalizer {
    pub fn new(schema: Schema, dates: DateNormalizer) -> Self {
        Self { schema, dates }
    }

    /// Pair each column with its raw text, folding overflow into the product.
    ///
    /// Columns before the product are anchored from the left and columns
    /// after it from the right; whatever is left between them is the name.
    fn align(&self, fields: &[String]) -> Vec<(Column, String)> {
        let columns = self.schema.columns();
        let overflow = fields.len().saturating_sub(columns.len());
        let product_at = match self.schema.position(Column::Product) {
            Some(index) if overflow > 0 => index,
            _ => {
                return columns
                    .iter()
                    .copied()
                    .zip(fields.iter().cloned())
                    .collect();
            }
        };

        let mut aligned = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let text = if index < product_at {
                fields[index].clone()
            } else if index == product_at {
                fields[index..=index + overflow]
                    .iter()
                    .map(|fragment| strip_quotes(fragment))
                    .filter(|fragment| !fragment.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                fields[index + overflow].clone()
            };
            aligned.push((*column, text));
        }
        aligned
    }

    fn reject(record: &RawRecord, reason: RejectionReason) -> Rejection {
        Rejection {
            line: record.line,
            raw: record.raw.clone(),
            stage: RejectionStage::Normalization,
            reason,
        }
    }
}

impl Normalizer for FieldNormalizer {
    fn normalize(&self, record: &RawRecord) -> Result<NormalizedRecord, Rejection> {
        let mut normalized = NormalizedRecord::empty(record);
        if record.fields.len() > self.schema.width() {
            debug!(line = record.line, "Reassembling product name from overflow fields");
        }

        let aligned: Vec<(Column, String)> = self
            .align(&record.fields)
            .into_iter()
            .map(|(column, raw)| (column, strip_quotes(&raw)))
            .collect();

        // Required fields first, before any coercion
        if let Some((column, _)) = aligned.iter().find(|(_, value)| value.is_empty()) {
            return Err(Rejection {
                line: record.line,
                raw: record.raw.clone(),
                stage: RejectionStage::Validation,
                reason: RejectionReason::MissingField { field: column.name() },
            });
        }

        for (column, value) in aligned {
            match column {
                Column::TransactionId => normalized.transaction_id = Some(normalize_identifier(&value)),
                Column::ProductId => normalized.product_id = Some(normalize_identifier(&value)),
                Column::Customer => normalized.customer = Some(normalize_identifier(&value)),
                Column::Product => normalized.product = Some(collapse_whitespace(&value)),
                Column::Region => normalized.region = Some(normalize_region(&value)),
                Column::Date => {
                    let date = self.dates.parse(&value).ok_or_else(|| {
                        Self::reject(record, RejectionReason::InvalidDate { value: value.clone() })
                    })?;
                    normalized.date = Some(date);
                }
                Column::Quantity => {
                    let quantity =
                        numbers::parse_quantity(&value).map_err(|r| Self::reject(record, r))?;
                    normalized.quantity = Some(quantity);
                }
                Column::Price => {
                    let price = numbers::parse_price(&value).map_err(|r| Self::reject(record, r))?;
                    normalized.unit_price = Some(price);
                }
            }
        }

        Ok(normalized)
    }
}

/// Trim and remove one layer of surrounding double quotes
pub fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identifiers lose inner whitespace and are upper-cased (`c 001` → `C001`)
pub fn normalize_identifier(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Regions are capitalised per word (`north east` → `North East`)
pub fn normalize_region(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(fields: &[&str]) -> RawRecord {
        RawRecord {
            line: 3,
            raw: fields.join("|"),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn normalizer() -> FieldNormalizer {
        FieldNormalizer::new(Schema::basic(), DateNormalizer::default())
    }

    #[test]
    fn test_normalizes_scenario_line() {
        let record = normalizer()
            .normalize(&raw(&["2024-01-05", "C001", "Widget, Deluxe", "3", "19.99", "East"]))
            .unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(record.customer.as_deref(), Some("C001"));
        assert_eq!(record.product.as_deref(), Some("Widget, Deluxe"));
        assert_eq!(record.quantity, Some(3));
        assert_eq!(record.unit_price, Some(dec!(19.99)));
        assert_eq!(record.region.as_deref(), Some("East"));
    }

    #[test]
    fn test_quoted_product_keeps_comma() {
        let record = normalizer()
            .normalize(&raw(&["05/01/2024", " c001 ", "\"Widget,  Deluxe\"", "1,000", "₹1,299.00", "north  east"]))
            .unwrap();

        assert_eq!(record.product.as_deref(), Some("Widget, Deluxe"));
        assert_eq!(record.customer.as_deref(), Some("C001"));
        assert_eq!(record.quantity, Some(1000));
        assert_eq!(record.unit_price, Some(dec!(1299.00)));
        assert_eq!(record.region.as_deref(), Some("North East"));
    }

    #[test]
    fn test_overflow_is_reassembled_into_product() {
        let record = normalizer()
            .normalize(&raw(&["2024-01-05", "C001", "Widget", " Deluxe", "3", "19.99", "East"]))
            .unwrap();

        assert_eq!(record.product.as_deref(), Some("Widget, Deluxe"));
        assert_eq!(record.quantity, Some(3));
        assert_eq!(record.region.as_deref(), Some("East"));
    }

    #[test]
    fn test_overflow_in_extended_layout() {
        let normalizer = FieldNormalizer::new(Schema::extended(), DateNormalizer::default());
        let record = normalizer
            .normalize(&raw(&[
                "T001", "2024-12-01", "P101", "Laptop", "Pro", "2", "45,000", "C007", "North",
            ]))
            .unwrap();

        assert_eq!(record.transaction_id.as_deref(), Some("T001"));
        assert_eq!(record.product_id.as_deref(), Some("P101"));
        assert_eq!(record.product.as_deref(), Some("Laptop, Pro"));
        assert_eq!(record.unit_price, Some(dec!(45000)));
        assert_eq!(record.customer.as_deref(), Some("C007"));
    }

    #[test]
    fn test_missing_field_reported_before_coercion() {
        let rejection = normalizer()
            .normalize(&raw(&["2024-13-40", "C010", "Widget", "1", "19.99", "  "]))
            .unwrap_err();
        assert_eq!(rejection.stage, RejectionStage::Validation);
        assert_eq!(rejection.reason, RejectionReason::MissingField { field: "region" });

        let rejection = normalizer()
            .normalize(&raw(&["2024-01-05", "", "Widget", "-3", "19.99", "East"]))
            .unwrap_err();
        assert_eq!(rejection.reason, RejectionReason::MissingField { field: "customer" });
    }

    #[test]
    fn test_failures_are_classified() {
        let rejection = normalizer()
            .normalize(&raw(&["someday", "C001", "Widget", "3", "19.99", "East"]))
            .unwrap_err();
        assert_eq!(rejection.stage, RejectionStage::Normalization);
        assert_eq!(rejection.reason.code(), "invalid_date");

        let rejection = normalizer()
            .normalize(&raw(&["2024-01-05", "C001", "Widget", "lots", "19.99", "East"]))
            .unwrap_err();
        assert_eq!(rejection.reason.code(), "invalid_number");

        let rejection = normalizer()
            .normalize(&raw(&["2024-01-05", "C001", "Widget", "3", "-19.99", "East"]))
            .unwrap_err();
        assert_eq!(rejection.reason.code(), "negative_value");
    }
}
