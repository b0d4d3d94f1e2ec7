//! Method call deserialisation for the command channel.

use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::errors::CommandError;

/// A command as received from the host.
///
/// ```json
/// {"method":"disconnectDevice","arguments":{"mac":"AA:BB:CC:DD:EE:FF","modelId":"1"}}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodCall {
    method: String,
    #[serde(default)]
    arguments: Value,
}

impl MethodCall {
    /// Creates a call with the given name and arguments.
    #[must_use]
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Creates a call without arguments.
    #[must_use]
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }

    /// Parses one JSON document into a call. Trailing whitespace, including
    /// a newline delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::MalformedRequest`] for empty input or input
    /// that does not match the call schema.
    pub fn parse(input: &[u8]) -> Result<Self, CommandError> {
        let trimmed = input.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(CommandError::malformed("empty request"));
        }
        serde_json::from_slice(trimmed).map_err(|error| CommandError::malformed(error.to_string()))
    }

    /// Returns the method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the raw arguments value.
    #[must_use]
    pub const fn arguments(&self) -> &Value {
        &self.arguments
    }
}

/// Commands the bridge implements. Names are matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Method {
    /// Initialise the vendor SDK.
    InitSdk,
    /// Subscribe to radio state changes.
    SetBleStateListener,
    /// Subscribe to discovery callbacks.
    SetBleDeviceDiscoveryListener,
    /// Subscribe to connection lifecycle callbacks.
    SetBleConnectionChangeListener,
    /// Subscribe to measurement callbacks.
    SetScaleDataListener,
    /// Start scanning.
    StartBleDeviceDiscovery,
    /// Stop scanning.
    StopBleDeviceDiscovery,
    /// Connect to a scale.
    ConnectDevice,
    /// Disconnect from a scale.
    DisconnectDevice,
    /// Read the persisted configuration.
    GetConfig,
    /// Persist a new configuration.
    SaveConfig,
    /// Expand a stored sample into measurement items.
    GenerateScaleData,
}

impl Method {
    /// Looks up a supported method by name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
