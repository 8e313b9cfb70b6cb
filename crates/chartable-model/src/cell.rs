//! Cell values and rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error_value::ErrorValue;

/// A single table cell.
///
/// `Null` only appears in raw input; parsing replaces it with a sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Error(ErrorValue),
}

/// A row snapshot, keyed by column slug.
pub type Row = BTreeMap<String, CellValue>;

/// Column-oriented values, keyed by column slug. Every vector has one cell per row.
pub type ColumnStore = BTreeMap<String, Vec<CellValue>>;

impl CellValue {
    /// True for real values: numbers, text, and booleans.
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Text(_) | Self::Bool(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// True for a real number that is not `NaN`.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(n) if !n.is_nan())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The sentinel held by this cell, if any.
    pub fn error(&self) -> Option<ErrorValue> {
        match self {
            Self::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Unformatted string form. Sentinels and nulls render as an empty string.
    pub fn to_plain_string(&self) -> String {
        match self {
            Self::Null | Self::Error(_) => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_plain_number(*n),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Shortest round-tripping representation of a number, without a trailing `.0`.
pub fn format_plain_number(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if v == v.trunc() && v.abs() < 1e21 {
        // `-0` prints as "0"
        return format!("{}", v as i128);
    }
    format!("{v}")
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ErrorValue> for CellValue {
    fn from(value: ErrorValue) -> Self {
        Self::Error(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build a [`Row`] from `(slug, value)` pairs.
///
/// ```
/// use chartable_model::{CellValue, row};
///
/// let r = row([("entityName", CellValue::from("France")), ("year", 2000.into())]);
/// assert_eq!(r["year"], CellValue::Number(2000.0));
/// ```
pub fn row<K, I>(pairs: I) -> Row
where
    K: Into<String>,
    I: IntoIterator<Item = (K, CellValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_values_exclude_sentinels_and_null() {
        assert!(CellValue::Number(1.0).is_real());
        assert!(CellValue::Text("a".into()).is_real());
        assert!(!CellValue::Null.is_real());
        assert!(!CellValue::Error(ErrorValue::DivideByZero).is_real());
    }

    #[test]
    fn test_nan_is_not_a_number() {
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert!(!CellValue::Number(f64::NAN).is_number());
    }

    #[test]
    fn test_plain_number_formatting() {
        assert_eq!(format_plain_number(2000.0), "2000");
        assert_eq!(format_plain_number(-0.0), "0");
        assert_eq!(format_plain_number(1.25), "1.25");
        assert_eq!(format_plain_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_sentinel_renders_blank() {
        assert_eq!(CellValue::Error(ErrorValue::FilteredOut).to_plain_string(), "");
    }

    #[test]
    fn test_untagged_json_round_trip() {
        let json = r#"{"a":1.5,"b":"x","c":null,"d":true}"#;
        let r: Row = serde_json::from_str(json).expect("parse row");
        assert_eq!(r["a"], CellValue::Number(1.5));
        assert_eq!(r["b"], CellValue::Text("x".into()));
        assert_eq!(r["c"], CellValue::Null);
        assert_eq!(r["d"], CellValue::Bool(true));
        let out = serde_json::to_string(&r).expect("serialize row");
        assert_eq!(out, json);
    }
}
