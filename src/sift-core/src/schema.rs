//! Read-only type descriptors attached to expressions.
//!
//! The full schema algebra lives with the type checker; rewrite rules only
//! need a coarse answer to questions such as "is this input always empty?".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;

/// A coarse description of the values an expression may produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Schema {
    /// Nothing is known.
    Any,
    /// Always `null`.
    Null,
    /// A boolean, possibly null.
    Boolean,
    /// A long or double.
    Number,
    /// A string.
    String,
    /// Always the empty array `[]`.
    EmptyArray,
    /// An array whose elements match the boxed schema.
    Array(Box<Schema>),
    /// A record.
    Record,
}

impl Schema {
    /// Describe a literal value.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Long(_) | Value::Double(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(items) if items.is_empty() => Self::EmptyArray,
            Value::Array(items) => {
                let element = items
                    .iter()
                    .map(Self::of_value)
                    .reduce(|a, b| a.union(&b))
                    .unwrap_or(Self::Any);
                Self::Array(Box::new(element))
            }
            Value::Record(_) => Self::Record,
        }
    }

    /// An array with unknown elements.
    pub fn any_array() -> Self {
        Self::Array(Box::new(Self::Any))
    }

    /// The least schema describing values of either `self` or `other`.
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (Self::EmptyArray, Self::Array(e)) | (Self::Array(e), Self::EmptyArray) => {
                Self::Array(e.clone())
            }
            (Self::Array(a), Self::Array(b)) => Self::Array(Box::new(a.union(b))),
            _ => Self::Any,
        }
    }

    /// Returns true if every value described is the empty array.
    pub fn is_always_empty(&self) -> bool {
        matches!(self, Self::EmptyArray)
    }

    /// Returns true if every value described is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::EmptyArray | Self::Array(_))
    }

    /// The element schema of an array schema.
    pub fn elements(&self) -> Self {
        match self {
            Self::Array(element) => (**element).clone(),
            _ => Self::Any,
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Null => write!(f, "null"),
            Self::Boolean => write!(f, "boolean"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::EmptyArray => write!(f, "[]"),
            Self::Array(element) => write!(f, "[{element} ...]"),
            Self::Record => write!(f, "{{...}}"),
        }
    }
}
