use serde::Serialize;
use tracing::{debug, info};

use crate::config::ValidationConfig;
use crate::domain::{Column, Rejection, RejectionStage, Schema, Transaction};
use crate::error::RejectionReason;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::NormalizedRecord;

/// The three run counters of the cleaning stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationCounts {
    pub parsed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl ValidationCounts {
    /// parsed = accepted + rejected
    pub fn is_balanced(&self) -> bool {
        self.parsed == self.accepted + self.rejected
    }
}

/// Result of running the quality gate over a batch
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: Vec<Transaction>,
    pub rejections: Vec<Rejection>,
    pub counts: ValidationCounts,
}

/// Trait for implementing accept/reject logic over normalized records
pub trait QualityGate {
    /// Accept a candidate as a transaction or reject it with the first failing rule
    fn assess(&self, record: &NormalizedRecord) -> Result<Transaction, Rejection>;

    /// Assess a batch. Rejections from earlier stages pass straight through
    /// and are counted, so every input record is either accepted or rejected.
    fn assess_batch(&self, candidates: Vec<Result<NormalizedRecord, Rejection>>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        for candidate in candidates {
            outcome.counts.parsed += 1;
            match candidate.and_then(|record| self.assess(&record)) {
                Ok(transaction) => {
                    outcome.counts.accepted += 1;
                    metrics::quality_gate::record_accepted();
                    outcome.valid.push(transaction);
                }
                Err(rejection) => {
                    outcome.counts.rejected += 1;
                    metrics::quality_gate::record_rejected(rejection.stage.as_str(), rejection.reason.code());
                    debug!(line = rejection.line, reason = %rejection.reason, "Rejected record");
                    outcome.rejections.push(rejection);
                }
            }
        }

        info!(
            parsed = outcome.counts.parsed,
            accepted = outcome.counts.accepted,
            rejected = outcome.counts.rejected,
            "Cleaning stage complete"
        );
        outcome
    }
}

/// Rule-based quality gate.
///
/// Rules run in order and stop at the first failure:
/// required fields, sign, date window, upper bounds, then (extended
/// layout only) id prefixes.
pub struct DefaultQualityGate {
    pub config: ValidationConfig,
    schema: Schema,
}

impl DefaultQualityGate {
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, ValidationConfig::default())
    }

    pub fn with_config(schema: Schema, config: ValidationConfig) -> Self {
        Self { config, schema }
    }

    fn check_required(&self, record: &NormalizedRecord) -> Result<(), RejectionReason> {
        for column in self.schema.columns() {
            let present = match column {
                Column::TransactionId => record.transaction_id.is_some(),
                Column::Date => record.date.is_some(),
                Column::ProductId => record.product_id.is_some(),
                Column::Product => record.product.is_some(),
                Column::Quantity => record.quantity.is_some(),
                Column::Price => record.unit_price.is_some(),
                Column::Customer => record.customer.is_some(),
                Column::Region => record.region.is_some(),
            };
            if !present {
                return Err(RejectionReason::MissingField { field: column.name() });
            }
        }
        Ok(())
    }

    fn check_id_prefixes(&self, record: &NormalizedRecord) -> Result<(), RejectionReason> {
        let ids = [
            (Column::TransactionId, record.transaction_id.as_deref(), 'T'),
            (Column::ProductId, record.product_id.as_deref(), 'P'),
            (Column::Customer, record.customer.as_deref(), 'C'),
        ];
        for (column, value, prefix) in ids {
            if let Some(value) = value {
                if !value.starts_with(prefix) {
                    return Err(RejectionReason::InvalidId {
                        field: column.name(),
                        value: value.to_string(),
                        prefix,
                    });
                }
            }
        }
        Ok(())
    }

    fn build(&self, record: &NormalizedRecord) -> Result<Transaction, RejectionReason> {
        self.check_required(record)?;

        let missing = |column: Column| RejectionReason::MissingField { field: column.name() };
        let date = record.date.ok_or_else(|| missing(Column::Date))?;
        let quantity = record.quantity.ok_or_else(|| missing(Column::Quantity))?;
        let unit_price = record.unit_price.ok_or_else(|| missing(Column::Price))?;

        // Sign
        if quantity < 0 {
            return Err(RejectionReason::NegativeValue {
                field: "quantity",
                value: quantity.to_string(),
            });
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(RejectionReason::NegativeValue {
                field: "price",
                value: unit_price.to_string(),
            });
        }
        if self.config.require_positive {
            if quantity == 0 {
                return Err(RejectionReason::NonPositive {
                    field: "quantity",
                    value: quantity.to_string(),
                });
            }
            if unit_price.is_zero() {
                return Err(RejectionReason::NonPositive {
                    field: "price",
                    value: unit_price.to_string(),
                });
            }
        }

        // Date window
        let too_early = self.config.earliest_date.is_some_and(|earliest| date < earliest);
        let too_late = self.config.latest_date.is_some_and(|latest| date > latest);
        if too_early || too_late {
            return Err(RejectionReason::DateOutOfRange { date });
        }

        // Upper bounds (inclusive)
        let quantity_out_of_range = || RejectionReason::OutOfRange {
            field: "quantity",
            value: quantity.to_string(),
            limit: self.config.max_quantity.to_string(),
        };
        if quantity > i64::from(self.config.max_quantity) {
            return Err(quantity_out_of_range());
        }
        let quantity = u32::try_from(quantity).map_err(|_| quantity_out_of_range())?;
        if unit_price > self.config.max_unit_price {
            return Err(RejectionReason::OutOfRange {
                field: "price",
                value: unit_price.to_string(),
                limit: self.config.max_unit_price.to_string(),
            });
        }

        if self.config.require_id_prefixes && self.schema.has(Column::TransactionId) {
            self.check_id_prefixes(record)?;
        }

        Ok(Transaction {
            line: record.line,
            transaction_id: record.transaction_id.clone(),
            date,
            customer: record.customer.clone().ok_or_else(|| missing(Column::Customer))?,
            product_id: record.product_id.clone(),
            product: record.product.clone().ok_or_else(|| missing(Column::Product))?,
            quantity,
            unit_price,
            region: record.region.clone().ok_or_else(|| missing(Column::Region))?,
        })
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, record: &NormalizedRecord) -> Result<Transaction, Rejection> {
        self.build(record).map_err(|reason| Rejection {
            line: record.line,
            raw: record.raw.clone(),
            stage: RejectionStage::Validation,
            reason,
        })
    }
}
