use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::RejectionReason;

const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£'];

/// Strip thousands separators, whitespace and a leading currency symbol
pub fn clean_numeric(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(CURRENCY_SYMBOLS)
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect()
}

/// Parse a quantity. Whole-valued decimals such as `3.0` are accepted.
pub fn parse_quantity(raw: &str) -> Result<i64, RejectionReason> {
    let cleaned = clean_numeric(raw);
    let invalid = || RejectionReason::InvalidNumber {
        field: "quantity",
        value: raw.trim().to_string(),
    };

    let value = match cleaned.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            let decimal = Decimal::from_str(&cleaned).map_err(|_| invalid())?;
            if !decimal.fract().is_zero() {
                return Err(invalid());
            }
            decimal.to_i64().ok_or_else(invalid)?
        }
    };

    if value < 0 {
        return Err(RejectionReason::NegativeValue {
            field: "quantity",
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Parse a unit price as an exact decimal
pub fn parse_price(raw: &str) -> Result<Decimal, RejectionReason> {
    let cleaned = clean_numeric(raw);
    let price = Decimal::from_str(&cleaned).map_err(|_| RejectionReason::InvalidNumber {
        field: "price",
        value: raw.trim().to_string(),
    })?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(RejectionReason::NegativeValue {
            field: "price",
            value: price.to_string(),
        });
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thousands_separators_are_stripped() {
        assert_eq!(parse_quantity("1,200").unwrap(), 1200);
        assert_eq!(parse_price("1,916.50").unwrap(), dec!(1916.50));
        assert_eq!(parse_price("₹ 45,000").unwrap(), dec!(45000));
        assert_eq!(parse_price("$19.99").unwrap(), dec!(19.99));
    }

    #[test]
    fn test_whole_decimal_quantity() {
        assert_eq!(parse_quantity("3.0").unwrap(), 3);
        assert!(matches!(
            parse_quantity("2.5"),
            Err(RejectionReason::InvalidNumber { field: "quantity", .. })
        ));
    }

    #[test]
    fn test_non_numeric_values() {
        assert_eq!(
            parse_quantity("three"),
            Err(RejectionReason::InvalidNumber {
                field: "quantity",
                value: "three".to_string()
            })
        );
        assert!(matches!(
            parse_price("N/A"),
            Err(RejectionReason::InvalidNumber { field: "price", .. })
        ));
    }

    #[test]
    fn test_negative_values() {
        assert!(matches!(
            parse_quantity("-3"),
            Err(RejectionReason::NegativeValue { field: "quantity", .. })
        ));
        assert!(matches!(
            parse_price("-19.99"),
            Err(RejectionReason::NegativeValue { field: "price", .. })
        ));
        assert_eq!(parse_price("0").unwrap(), Decimal::ZERO);
    }
}
