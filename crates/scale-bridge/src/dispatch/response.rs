//! Command responses and their wire encoding.

use serde_json::{Value, json};

use super::errors::CommandError;

/// The single answer produced for a command.
///
/// `NotImplemented` is distinct from `Error`: it tells the host
/// the bridge does not support the command at all, rather than that the
/// command failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Command-specific success payload.
    Success(Value),
    /// Protocol or vendor failure.
    Error(CommandError),
    /// The command name is not supported by this bridge.
    NotImplemented {
        /// The unsupported name.
        method: String,
    },
}

impl Response {
    /// Returns `true` for success payloads.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the success payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Error(_) | Self::NotImplemented { .. } => None,
        }
    }

    /// Returns the error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CommandError> {
        match self {
            Self::Error(error) => Some(error),
            Self::Success(_) | Self::NotImplemented { .. } => None,
        }
    }

    /// Encodes the response for the host.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Success(payload) => json!({ "kind": "success", "payload": payload }),
            Self::Error(error) => json!({
                "kind": "error",
                "code": error.code(),
                "message": error.to_string(),
                "field": error.field(),
                "vendorCode": error.vendor_code(),
            }),
            Self::NotImplemented { method } => json!({
                "kind": "not_implemented",
                "method": method,
            }),
        }
    }
}
