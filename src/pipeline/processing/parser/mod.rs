use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::FIELD_DELIMITER;
use crate::domain::{Column, Rejection, RejectionStage, Schema};
use crate::error::RejectionReason;
use crate::observability::metrics;
use crate::pipeline::ingestion::SourceLine;

/// Fields of one line, split but not yet interpreted
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub line: usize,
    pub raw: String,
    pub fields: Vec<String>,
}

pub trait Parser {
    fn parse_line(&self, line: &SourceLine) -> Result<RawRecord, Rejection>;

    fn parse_all(&self, lines: &[SourceLine]) -> Vec<Result<RawRecord, Rejection>> {
        lines.iter().map(|line| self.parse_line(line)).collect()
    }
}

/// A wrapper that adds metrics to any parser implementation
pub struct MetricsParser<P: Parser> {
    inner: P,
}

impl<P: Parser> MetricsParser<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Parser> Parser for MetricsParser<P> {
    fn parse_line(&self, line: &SourceLine) -> Result<RawRecord, Rejection> {
        let result = self.inner.parse_line(line);
        match &result {
            Ok(_) => metrics::parser::line_parsed(),
            Err(rejection) => metrics::parser::line_rejected(rejection.reason.code()),
        }
        result
    }
}

/// Splits pipe-delimited lines against a fixed schema.
///
/// Commas are never separators here. A `|` inside double quotes is kept as
/// part of the field. Lines with more fields than the schema are passed on
/// when the schema has a product column to absorb the overflow.
pub struct PipeDelimitedParser {
    schema: Schema,
}

impl PipeDelimitedParser {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn reject(line: &SourceLine, reason: RejectionReason) -> Rejection {
        Rejection {
            line: line.number,
            raw: line.text.clone(),
            stage: RejectionStage::Parse,
            reason,
        }
    }
}

impl Parser for PipeDelimitedParser {
    fn parse_line(&self, line: &SourceLine) -> Result<RawRecord, Rejection> {
        let width = self.schema.width();
        let mut fields = split_fields(&line.text);

        // A trailing delimiter leaves empty fields past the last column
        while fields.len() > width && fields.last().is_some_and(|f| f.trim().is_empty()) {
            fields.pop();
        }

        if fields.len() < width {
            let missing = self.schema.columns()[fields.len()];
            debug!(line = line.number, "Line has {} of {} fields", fields.len(), width);
            return Err(Self::reject(
                line,
                RejectionReason::MissingField {
                    field: missing.name(),
                },
            ));
        }

        if fields.len() > width && !self.schema.has(Column::Product) {
            return Err(Self::reject(
                line,
                RejectionReason::FieldCount {
                    expected: width,
                    found: fields.len(),
                },
            ));
        }

        Ok(RawRecord {
            line: line.number,
            raw: line.text.clone(),
            fields,
        })
    }
}

/// Split on the field delimiter, ignoring delimiters inside a quoted field.
///
/// A `"` opens a quoted field only as the first non-blank character of the
/// field and closes it only when followed by a delimiter or end of line.
/// Any other `"` is literal text (`27" Monitor`). A quote that is never
/// closed is treated as literal and the line is split on every delimiter.
/// Quotes are left in place for the normalizer.
pub fn split_fields(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for (index, &ch) in chars.iter().enumerate() {
        if ch == '"' {
            if in_quotes {
                in_quotes = !closes_field(&chars[index + 1..]);
            } else if current.trim().is_empty() {
                in_quotes = true;
            }
            current.push(ch);
        } else if ch == FIELD_DELIMITER && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }

    if in_quotes {
        return text.split(FIELD_DELIMITER).map(str::to_string).collect();
    }
    fields.push(current);
    fields
}

fn closes_field(rest: &[char]) -> bool {
    rest.iter()
        .find(|c| !c.is_whitespace())
        .map_or(true, |&c| c == FIELD_DELIMITER)
}
