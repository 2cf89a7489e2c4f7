//! Turns the raw text found on a listing page into typed cell values.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::record::KITCHEN_TYPE;

/// A single normalized cell. `Absent` is the null marker and renders as an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Converts a scalar taken out of the embedded listing JSON.
    /// Objects and arrays are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FieldValue::Absent,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map_or(FieldValue::Absent, FieldValue::Float),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            FieldValue::Absent => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Returns the first run of digits as an integer, or the input unchanged.
/// Runs too long for an `i64` are kept as text.
pub fn extract_number(raw: &str) -> FieldValue {
    digits_re()
        .find(raw)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map_or_else(|| FieldValue::Text(raw.to_string()), FieldValue::Int)
}

/// Reads a price like `"€1,250,000"`. Commas are thousands separators here and nowhere else.
pub fn extract_price(raw: &str) -> Option<i64> {
    let cleaned = raw.replace(',', "");
    digits_re()
        .find(&cleaned)
        .and_then(|m| m.as_str().parse().ok())
}

pub fn coerce_boolean(raw: &str) -> FieldValue {
    match raw {
        "Yes" => FieldValue::Bool(true),
        "No" => FieldValue::Bool(false),
        other => extract_number(other),
    }
}

pub fn coerce_kitchen(raw: &str) -> FieldValue {
    FieldValue::Bool(raw == "Installed")
}

/// Normalizes a table data cell according to the header it sits under.
pub fn normalize_field(header: &str, raw: &str) -> FieldValue {
    if header == KITCHEN_TYPE {
        coerce_kitchen(raw)
    } else {
        coerce_boolean(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_number_takes_first_digit_run() {
        assert_eq!(extract_number("3 bedrooms"), FieldValue::Int(3));
        assert_eq!(extract_number("120 m² living, 40 m² garden"), FieldValue::Int(120));
    }

    #[test]
    fn extract_number_without_digits_is_unchanged() {
        assert_eq!(
            extract_number("no digits here"),
            FieldValue::Text("no digits here".into())
        );
    }

    #[test]
    fn price_ignores_thousands_commas() {
        assert_eq!(extract_price("€1,250,000"), Some(1_250_000));
        assert_eq!(extract_price("Price on request"), None);
    }

    #[test]
    fn yes_no_become_booleans() {
        assert_eq!(coerce_boolean("Yes"), FieldValue::Bool(true));
        assert_eq!(coerce_boolean("No"), FieldValue::Bool(false));
        assert_eq!(coerce_boolean("4 fireplaces"), FieldValue::Int(4));
        assert_eq!(coerce_boolean("yes"), FieldValue::Text("yes".into()));
    }

    #[test]
    fn kitchen_type_only_accepts_installed() {
        assert_eq!(normalize_field(KITCHEN_TYPE, "Installed"), FieldValue::Bool(true));
        assert_eq!(normalize_field(KITCHEN_TYPE, "Hyper equipped"), FieldValue::Bool(false));
        assert_eq!(normalize_field(KITCHEN_TYPE, "Yes"), FieldValue::Bool(false));
        assert_eq!(normalize_field("Furnished", "Yes"), FieldValue::Bool(true));
    }

    #[test]
    fn json_scalars_convert() {
        let v: serde_json::Value = serde_json::json!({"a": 1, "b": 2.5, "c": null, "d": "x"});
        assert_eq!(FieldValue::from_json(&v["a"]), FieldValue::Int(1));
        assert_eq!(FieldValue::from_json(&v["b"]), FieldValue::Float(2.5));
        assert_eq!(FieldValue::from_json(&v["c"]), FieldValue::Absent);
        assert_eq!(FieldValue::from_json(&v["d"]), FieldValue::Text("x".into()));
        assert_eq!(FieldValue::Absent.to_string(), "");
    }
}
