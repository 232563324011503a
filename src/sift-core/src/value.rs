//! JSON value representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A JSON value as seen by the query language.
///
/// Records keep their fields in insertion order so that decompiled queries
/// and constant-folded results are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The JSON `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered array of values.
    Array(Vec<Value>),
    /// Record of named fields.
    Record(Vec<(String, Value)>),
}

impl Value {
    /// The empty array `[]`.
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is the literal `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    /// Check if this value is the literal `false`.
    pub fn is_false(&self) -> bool {
        matches!(self, Self::Bool(false))
    }

    /// Check if this value is an empty array.
    pub fn is_empty_array(&self) -> bool {
        matches!(self, Self::Array(items) if items.is_empty())
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64, widening longs.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(f) => Some(*f),
            Self::Long(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as array slice.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a record field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Record(_) => "record",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Long(i) => write!(f, "{i}"),
            Self::Double(d) if d.is_finite() && d.fract() == 0.0 => write!(f, "{d:.1}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write_json_string(f, s),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_json_string(f, name)?;
                    write!(f, ": {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    match serde_json::to_string(s) {
        Ok(quoted) => f.write_str(&quoted),
        Err(_) => Err(fmt::Error),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Long(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Long(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_predicates() {
        assert!(Value::Bool(true).is_true());
        assert!(Value::Bool(false).is_false());
        assert!(!Value::Null.is_false());
        assert!(Value::Null.is_null());
        assert!(Value::empty_array().is_empty_array());
        assert!(!Value::from(vec![1i64]).is_empty_array());
    }

    #[test]
    fn test_display_json_text() {
        let record = Value::Record(vec![
            ("name".to_string(), Value::from("a \"b\"")),
            ("n".to_string(), Value::from(vec![1i64, 2])),
            ("x".to_string(), Value::Double(2.0)),
        ]);
        assert_eq!(
            record.to_string(),
            r#"{"name": "a \"b\"", "n": [1, 2], "x": 2.0}"#
        );
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Double(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_field_lookup() {
        let record = Value::Record(vec![("a".to_string(), Value::Long(1))]);
        assert_eq!(record.field("a"), Some(&Value::Long(1)));
        assert_eq!(record.field("b"), None);
        assert_eq!(Value::Null.field("a"), None);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(Some(3i32)), Value::Long(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::Long(4).as_double(), Some(4.0));
        assert_eq!(Value::from("s").type_name(), "string");
    }
}
