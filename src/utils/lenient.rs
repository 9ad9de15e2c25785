//! Money inputs coming from operator forms.
//!
//! Optional amounts that are missing, empty or unparsable count as zero
//! rather than rejecting the whole request.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses `"12.50"`, `"12,50"` or `"1.234,56"`; anything else is zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// `deserialize_with` helper: numbers, numeric strings and `null` all decode.
pub fn amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(&s),
        _ => Decimal::ZERO,
    })
}

/// Like [`amount`] but keeps "not provided" distinct, for partial updates.
pub fn optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::Number(n) => Some(parse_amount(&n.to_string())),
        Value::String(s) => Some(parse_amount(&s)),
        _ => Some(Decimal::ZERO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "amount")]
        freight: Decimal,
        #[serde(default, deserialize_with = "optional_amount")]
        fee: Option<Decimal>,
    }

    #[test]
    fn parses_dot_and_comma_decimals() {
        assert_eq!(parse_amount("12.50"), Decimal::new(1250, 2));
        assert_eq!(parse_amount("12,50"), Decimal::new(1250, 2));
        assert_eq!(parse_amount("1.234,56"), Decimal::new(123456, 2));
        assert_eq!(parse_amount(" 7 "), Decimal::new(7, 0));
    }

    #[test]
    fn malformed_amounts_are_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("12.5.1"), Decimal::ZERO);
    }

    #[test]
    fn form_fields_decode_leniently() {
        let form: Form = serde_json::from_str(r#"{"freight": "oops", "fee": 35.5}"#).unwrap();
        assert_eq!(form.freight, Decimal::ZERO);
        assert_eq!(form.fee, Some(Decimal::new(355, 1)));

        let form: Form = serde_json::from_str(r#"{"freight": 10}"#).unwrap();
        assert_eq!(form.freight, Decimal::new(10, 0));
        assert_eq!(form.fee, None);

        let form: Form = serde_json::from_str(r#"{"freight": null, "fee": null}"#).unwrap();
        assert_eq!(form.freight, Decimal::ZERO);
        assert_eq!(form.fee, None);
    }
}
