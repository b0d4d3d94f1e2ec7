//! Error types surfaced on the command channel.
//!
//! Protocol failures (malformed requests, missing or mistyped arguments) and
//! vendor failures share one enum so every handler has a single error path.
//! Each variant maps to a stable string class on the wire; vendor codes stay
//! integers.

use thiserror::Error;

use crate::codec::CodecError;
use crate::sdk::VendorStatus;

/// Errors answered to the host in place of a success payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// An argument was missing or had the wrong type.
    #[error(transparent)]
    Argument(#[from] CodecError),

    /// The request could not be parsed as a method call.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Parser diagnostic.
        message: String,
    },

    /// The vendor SDK rejected the operation.
    #[error("vendor error {code}: {message}")]
    Vendor {
        /// Vendor result code.
        code: i32,
        /// Vendor message.
        message: String,
    },
}

impl CommandError {
    /// Creates a malformed-request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Returns the stable wire class of this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Argument(CodecError::MissingArgument { .. }) => "MISSING_ARGUMENT",
            Self::Argument(CodecError::TypeMismatch { .. }) => "TYPE_MISMATCH",
            Self::MalformedRequest { .. } => "MALFORMED_REQUEST",
            Self::Vendor { .. } => "VENDOR",
        }
    }

    /// Returns the offending field for argument errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Argument(error) => Some(error.field()),
            Self::MalformedRequest { .. } | Self::Vendor { .. } => None,
        }
    }

    /// Returns the vendor code for vendor errors.
    #[must_use]
    pub const fn vendor_code(&self) -> Option<i32> {
        match self {
            Self::Vendor { code, .. } => Some(*code),
            Self::Argument(_) | Self::MalformedRequest { .. } => None,
        }
    }
}

impl From<VendorStatus> for CommandError {
    fn from(status: VendorStatus) -> Self {
        Self::Vendor {
            code: status.code,
            message: status.message,
        }
    }
}
