//! Column types and coerced values.
//!
//! `ColumnType` is the (deliberately small) type universe used when turning
//! the textual fields of a mysqldump snapshot into typed values. Only bare
//! literals consult it; quoted literals are always text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a column, by position.
///
/// # TOML Format
///
/// ```toml
/// columns = ["number", "other", "float"]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer column; bare literals are parsed as `i64`
    Number,

    /// Floating point or decimal column; bare literals are parsed as `f64`
    Float,

    /// Any other column; a bare literal in such a column cannot be coerced
    Other,
}

impl ColumnType {
    /// Get the string representation used in rule files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Float => "float",
            ColumnType::Other => "other",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "number" => Ok(ColumnType::Number),
            "float" => Ok(ColumnType::Float),
            "other" => Ok(ColumnType::Other),
            other => Err(format!("unknown column type: {other}")),
        }
    }
}

/// A single typed value produced by row coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoercedValue {
    /// SQL `NULL`
    Null,

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit floating point
    Float64(f64),

    /// Text, taken from a quoted literal
    String(String),
}

impl CoercedValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A fully coerced row. Field order matches the snapshot's column order.
pub type CoercedRow = Vec<CoercedValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_from_str() {
        assert_eq!("number".parse::<ColumnType>(), Ok(ColumnType::Number));
        assert_eq!("FLOAT".parse::<ColumnType>(), Ok(ColumnType::Float));
        assert_eq!("other".parse::<ColumnType>(), Ok(ColumnType::Other));
        assert!("decimal".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_column_type_serde_lowercase() {
        let json = serde_json::to_string(&ColumnType::Float).unwrap();
        assert_eq!(json, "\"float\"");
        let parsed: ColumnType = serde_json::from_str("\"number\"").unwrap();
        assert_eq!(parsed, ColumnType::Number);
    }

    #[test]
    fn test_coerced_value_accessors() {
        assert!(CoercedValue::Null.is_null());
        assert_eq!(CoercedValue::Int64(7).as_i64(), Some(7));
        assert_eq!(CoercedValue::Float64(1.5).as_f64(), Some(1.5));
        assert_eq!(CoercedValue::String("abc".into()).as_str(), Some("abc"));
        assert_eq!(CoercedValue::String("1".into()).as_i64(), None);
    }

    #[test]
    fn test_coerced_value_serializes_untagged() {
        let row: CoercedRow = vec![
            CoercedValue::Int64(1),
            CoercedValue::Null,
            CoercedValue::String("x".into()),
        ];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"[1,null,"x"]"#);
    }
}
