use thiserror::Error;

/// Errors raised while decoding a host payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A required field was absent or `null`.
    #[error("missing argument '{field}'")]
    MissingArgument {
        /// Full path of the field.
        field: String,
    },

    /// A field carried a value of the wrong kind.
    #[error("argument '{field}' must be {expected}")]
    TypeMismatch {
        /// Full path of the field.
        field: String,
        /// Description of the accepted values.
        expected: &'static str,
    },
}

impl CodecError {
    /// Creates a missing-argument error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingArgument {
            field: field.into(),
        }
    }

    /// Creates a type-mismatch error.
    #[must_use]
    pub fn mismatch(field: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
        }
    }

    /// Returns the full path of the offending field.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingArgument { field } | Self::TypeMismatch { field, .. } => field,
        }
    }
}
