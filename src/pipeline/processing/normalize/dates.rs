use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants;

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses the date column against an ordered list of chrono formats
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    formats: Vec<String>,
}

impl DateNormalizer {
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Parse a date, returning `None` when no format matches
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let cleaned = ORDINAL_SUFFIX.replace_all(raw.trim(), "$1");
        let cleaned = WHITESPACE.replace_all(&cleaned, " ");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return None;
        }

        self.formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(cleaned, format).ok())
            .or_else(|| parse_datetime(cleaned))
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(constants::default_date_formats())
    }
}

/// Date-times are accepted and truncated to their calendar date
fn parse_datetime(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.date())
}
