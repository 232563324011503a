//! Core error types for sift.

use thiserror::Error;

/// Result type alias using `SiftError`.
pub type SiftResult<T> = std::result::Result<T, SiftError>;

/// Broad classification of an error, used by front ends to decide how to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// An ordinary query compile error caused by the user's query.
    User,
    /// A defect inside sift itself (a rule left the tree inconsistent, etc.).
    Internal,
    /// Bad configuration or parameters handed to the engine.
    Config,
}

/// Core error type for sift operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SiftError {
    /// Type mismatch or invalid type operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Invalid value provided.
    #[error("ValueError: {0}")]
    ValueError(String),

    /// Compile-time evaluation of a constant subexpression failed.
    #[error("EvaluationError: {0}")]
    EvaluationError(String),

    /// The expression tree no longer satisfies its structural invariants.
    #[error("InvariantViolation: {0}")]
    InvariantViolation(String),

    /// Internal error (bug in sift).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Invalid configuration.
    #[error("ConfigError: {0}")]
    ConfigError(String),

    /// Invalid parameter provided.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl SiftError {
    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `EvaluationError`.
    pub fn evaluation<S: Into<String>>(msg: S) -> Self {
        Self::EvaluationError(msg.into())
    }

    /// Create a new `InvariantViolation`.
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Create a new `ConfigError`.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new `InvalidParameter` error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TypeError(_) | Self::ValueError(_) | Self::EvaluationError(_) => {
                ErrorCategory::User
            }
            Self::InvariantViolation(_) | Self::InternalError(_) => ErrorCategory::Internal,
            Self::ConfigError(_)
            | Self::InvalidParameter(_)
            | Self::SerdeJsonError(_) => ErrorCategory::Config,
        }
    }

    /// Returns true if this error reports a defect in sift rather than in the query.
    pub fn is_internal(&self) -> bool {
        self.category() == ErrorCategory::Internal
    }
}

/// Ensure a condition holds, returning an `InternalError` if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::SiftError::$variant(format!($($msg)*)));
        }
    };
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::SiftError::InternalError($msg.to_string()));
        }
    };
}

/// Return early with an `InternalError`.
#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        return Err($crate::SiftError::InternalError(format!($($arg)*)))
    };
}

/// Return early with a `TypeError`.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::SiftError::TypeError(format!($($arg)*)))
    };
}

/// Return early with an `EvaluationError`.
#[macro_export]
macro_rules! eval_err {
    ($($arg:tt)*) => {
        return Err($crate::SiftError::EvaluationError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SiftError::evaluation("cannot add string to long");
        assert_eq!(err.to_string(), "EvaluationError: cannot add string to long");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(SiftError::type_error("x").category(), ErrorCategory::User);
        assert_eq!(SiftError::evaluation("x").category(), ErrorCategory::User);
        assert_eq!(SiftError::invariant("x").category(), ErrorCategory::Internal);
        assert_eq!(SiftError::internal("x").category(), ErrorCategory::Internal);
        assert_eq!(SiftError::config("x").category(), ErrorCategory::Config);
        assert!(SiftError::invariant("child does not point back").is_internal());
        assert!(!SiftError::value_error("bad literal").is_internal());
    }

    fn checked(n: i64) -> SiftResult<i64> {
        ensure!(n >= 0, "negative");
        ensure!(n < 10, InvalidParameter: "{} is too large", n);
        Ok(n)
    }

    fn typed(n: i64) -> SiftResult<i64> {
        if n < 0 {
            type_err!("expected a count, got {}", n);
        }
        Ok(n)
    }

    #[test]
    fn test_type_err_macro() {
        let err = typed(-2).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: expected a count, got -2");
        assert_eq!(err.category(), ErrorCategory::User);
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(checked(3).unwrap(), 3);
        assert!(checked(-1).unwrap_err().is_internal());
        assert!(matches!(
            checked(12).unwrap_err(),
            SiftError::InvalidParameter(msg) if msg == "12 is too large"
        ));
    }
}
