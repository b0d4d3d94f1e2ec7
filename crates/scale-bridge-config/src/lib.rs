//! Layered configuration for the scale bridge.
//!
//! Values are merged from defaults, an optional configuration file,
//! `SCALE_BRIDGE_*` environment variables, and command-line flags, in that
//! order of increasing precedence. The bridge itself only consumes three
//! settings: the log filter, the log format, and the optional command
//! timeout used to harden hosts against vendor operations that never call
//! back.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_LOG_FILTER, default_command_timeout_ms,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration shared by the bridge and its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SCALE_BRIDGE")]
pub struct BridgeConfig {
    /// `tracing` filter expression, for example `info` or
    /// `scale_bridge::events=trace`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Upper bound, in milliseconds, for blocking command calls. Zero
    /// disables the bound.
    #[ortho_config(default = default_command_timeout_ms())]
    pub command_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the command timeout, or `None` when blocking calls may wait
    /// indefinitely.
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        defaults::timeout_from_millis(self.command_timeout_ms)
    }
}
