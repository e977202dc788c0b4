//! Fixed-precision money helpers
//!
//! Amounts are `rust_decimal::Decimal` everywhere inside the services.
//! SQLite stores them as decimal TEXT; gateway payloads carry JSON numbers
//! or numeric strings. Both are converted exactly once, here.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{Error, Result};

/// Parse a stored or user-supplied decimal string
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| Error::InvalidAmount(format!("Invalid decimal '{}': {}", raw, e)))
}

/// Render a decimal for storage in a TEXT column, always two places
pub fn to_storage(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Parse a gateway-reported amount
///
/// Finite numbers outside the `Decimal` range (about 7.9e28) saturate to
/// `Decimal::MAX` / `Decimal::MIN` so they still compare correctly against
/// any stored amount. NaN, infinities and non-numbers are errors.
fn parse_reported(raw: &str) -> Result<Decimal> {
    parse_decimal(raw).or_else(|err| {
        let value: f64 = raw.trim().parse().map_err(|_| err)?;
        if !value.is_finite() {
            return Err(Error::InvalidAmount(format!("Amount '{}' is not finite", raw)));
        }
        Ok(Decimal::from_f64(value).unwrap_or(if value.abs() < 1.0 {
            Decimal::ZERO
        } else if value > 0.0 {
            Decimal::MAX
        } else {
            Decimal::MIN
        }))
    })
}

/// Convert a JSON amount field into a decimal
///
/// `null` means "not supplied". Numbers go through their textual form so
/// `99.99` stays `99.99` instead of the nearest binary float.
pub fn amount_from_json(value: &Value) -> Result<Option<Decimal>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => parse_reported(&n.to_string()).map(Some),
        Value::String(s) => parse_reported(s).map(Some),
        other => Err(Error::InvalidAmount(format!(
            "Amount must be a number, got {}",
            other
        ))),
    }
}

/// Amount charged at checkout
///
/// A non-zero discount price wins over the list price; a zero or missing
/// discount falls back to the list price.
pub fn charged_amount(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(discount) if !discount.is_zero() => discount,
        _ => price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_amount_from_json_number() {
        assert_eq!(amount_from_json(&json!(100.00)).unwrap(), Some(dec!(100)));
        assert_eq!(amount_from_json(&json!(99.99)).unwrap(), Some(dec!(99.99)));
        assert_eq!(amount_from_json(&json!(50)).unwrap(), Some(dec!(50)));
    }

    #[test]
    fn test_amount_from_json_string() {
        assert_eq!(amount_from_json(&json!("100.00")).unwrap(), Some(dec!(100.00)));
        assert_eq!(amount_from_json(&json!(" 12.5 ")).unwrap(), Some(dec!(12.5)));
    }

    #[test]
    fn test_amount_from_json_null_is_absent() {
        assert_eq!(amount_from_json(&Value::Null).unwrap(), None);
    }

    #[test]
    fn test_amount_from_json_rejects_garbage() {
        assert!(amount_from_json(&json!("abc")).is_err());
        assert!(amount_from_json(&json!(true)).is_err());
        assert!(amount_from_json(&json!({"v": 1})).is_err());
    }

    #[test]
    fn test_amount_beyond_decimal_range_saturates() {
        assert_eq!(amount_from_json(&json!(1e30)).unwrap(), Some(Decimal::MAX));
        assert_eq!(amount_from_json(&json!("1e30")).unwrap(), Some(Decimal::MAX));
        assert_eq!(amount_from_json(&json!(-1e30)).unwrap(), Some(Decimal::MIN));
        assert!(amount_from_json(&json!("inf")).is_err());
        assert!(amount_from_json(&json!("NaN")).is_err());
    }

    #[test]
    fn test_scientific_notation_accepted() {
        assert_eq!(parse_decimal("1e2").unwrap(), dec!(100));
    }

    #[test]
    fn test_to_storage_keeps_two_places() {
        assert_eq!(to_storage(dec!(100)), "100.00");
        assert_eq!(to_storage(dec!(100.5)), "100.50");
        assert_eq!(to_storage(dec!(19.999)), "20.00");
        assert_eq!(to_storage(dec!(42.104)), "42.10");
    }

    #[test]
    fn test_charged_amount_prefers_discount() {
        assert_eq!(charged_amount(dec!(100), Some(dec!(80))), dec!(80));
        assert_eq!(charged_amount(dec!(100), Some(dec!(0))), dec!(100));
        assert_eq!(charged_amount(dec!(100), None), dec!(100));
        assert_eq!(charged_amount(dec!(0), None), dec!(0));
    }
}
