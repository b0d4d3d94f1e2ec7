use std::str::FromStr;

use serde_json::Value;
use time::OffsetDateTime;

use super::errors::CodecError;
use super::{Payload, from_epoch_millis};
use crate::model::Gender;

const STRING: &str = "a string";
const BOOL: &str = "a boolean";
const INT: &str = "a 32-bit integer";
const LONG: &str = "a 64-bit integer";
const DOUBLE: &str = "a number";
const OBJECT: &str = "an object";
const GENDER: &str = "\"male\" or \"female\"";
const TIMESTAMP: &str = "epoch milliseconds within the supported date range";

/// Typed, read-only view over a host argument map.
///
/// Every accessor reports failures against the field's full path, so a
/// mistyped `height` inside the `user` object is reported as `user.height`.
#[derive(Debug, Clone)]
pub struct Arguments<'a> {
    map: Option<&'a Payload>,
    scope: String,
}

impl<'a> Arguments<'a> {
    /// Wraps a top-level argument map.
    #[must_use]
    pub const fn new(map: &'a Payload) -> Self {
        Self {
            map: Some(map),
            scope: String::new(),
        }
    }

    /// A view with no fields, used for commands invoked without arguments.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            map: None,
            scope: String::new(),
        }
    }

    /// Wraps the arguments value of a call.
    ///
    /// `null` is treated as an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TypeMismatch`] for any other non-object value.
    pub fn from_value(value: &'a Value) -> Result<Self, CodecError> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            Value::Null => Ok(Self::empty()),
            _ => Err(CodecError::mismatch("arguments", OBJECT)),
        }
    }

    /// Reads a nested object.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing or not an object.
    pub fn object(&self, key: &str) -> Result<Self, CodecError> {
        match self.require(key)? {
            Value::Object(map) => Ok(Self {
                map: Some(map),
                scope: self.path(key),
            }),
            _ => Err(CodecError::mismatch(self.path(key), OBJECT)),
        }
    }

    /// Reads a string field.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing or not a string.
    pub fn string(&self, key: &str) -> Result<String, CodecError> {
        self.require(key)?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| CodecError::mismatch(self.path(key), STRING))
    }

    /// Reads a boolean field.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing or not a boolean.
    pub fn bool(&self, key: &str) -> Result<bool, CodecError> {
        self.require(key)?
            .as_bool()
            .ok_or_else(|| CodecError::mismatch(self.path(key), BOOL))
    }

    /// Reads an integer field that must fit in 32 bits.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing, fractional, or out
    /// of range.
    pub fn int(&self, key: &str) -> Result<i32, CodecError> {
        self.require(key)?
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| CodecError::mismatch(self.path(key), INT))
    }

    /// Reads an integer field that must fit in 64 bits.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing, fractional, or out
    /// of range.
    pub fn long(&self, key: &str) -> Result<i64, CodecError> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| CodecError::mismatch(self.path(key), LONG))
    }

    /// Reads a floating point field. Integer literals are accepted.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing or not a number.
    pub fn double(&self, key: &str) -> Result<f64, CodecError> {
        self.require(key)?
            .as_f64()
            .ok_or_else(|| CodecError::mismatch(self.path(key), DOUBLE))
    }

    /// Reads a gender string.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing or not one of the
    /// accepted spellings.
    pub fn gender(&self, key: &str) -> Result<Gender, CodecError> {
        self.require(key)?
            .as_str()
            .and_then(|raw| Gender::from_str(raw).ok())
            .ok_or_else(|| CodecError::mismatch(self.path(key), GENDER))
    }

    /// Reads an epoch-millisecond timestamp.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the field is missing, not an integer, or
    /// outside the representable date range.
    pub fn timestamp(&self, key: &str) -> Result<OffsetDateTime, CodecError> {
        self.require(key)?
            .as_i64()
            .and_then(from_epoch_millis)
            .ok_or_else(|| CodecError::mismatch(self.path(key), TIMESTAMP))
    }

    fn require(&self, key: &str) -> Result<&'a Value, CodecError> {
        self.map
            .and_then(|map| map.get(key))
            .filter(|value| !value.is_null())
            .ok_or_else(|| CodecError::missing(self.path(key)))
    }

    fn path(&self, key: &str) -> String {
        if self.scope.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{key}", self.scope)
        }
    }
}
