//! The vendor SDK boundary.
//!
//! The vendor library is an opaque collaborator that performs all radio
//! work. The bridge talks to it through [`ScaleSdk`]: continuation-style
//! operations take a [`Completion`] the vendor invokes once, and each
//! listener kind receives a [`Listener`] fed with a tagged callback enum.

use std::fmt;
use std::sync::Arc;

use crate::model::{Device, ScaleConfig, ScaleData, StoredScaleData, User};

/// One-shot continuation invoked by the vendor when an operation finishes.
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Long-lived callback invoked by the vendor on its own threads.
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Outcome reported by the vendor as a `(code, message)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorStatus {
    /// Vendor result code; zero means success.
    pub code: i32,
    /// Human-readable vendor message.
    pub message: String,
}

impl VendorStatus {
    /// Code reported on success.
    pub const OK_CODE: i32 = 0;

    /// Creates a status from a code and message.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The generic acknowledgment returned by listener registration.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(Self::OK_CODE, "OK")
    }

    /// Returns `true` when the code signals success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == Self::OK_CODE
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// A broadcast-only scale reported during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastDevice(pub Device);

/// A kitchen scale reported during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitchenDevice(pub Device);

/// Callbacks raised by the discovery listener.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryCallback {
    /// A connectable body scale was found.
    DeviceDiscovered(Device),
    /// A broadcast-only scale was found.
    BroadcastDeviceDiscovered(BroadcastDevice),
    /// A kitchen scale was found.
    KitchenDeviceDiscovered(KitchenDevice),
    /// Scanning started.
    ScanStarted,
    /// Scanning stopped.
    ScanStopped,
    /// Scanning failed with a vendor code.
    ScanFailed(i32),
}

/// Callbacks raised by the connection listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCallback {
    /// A connection attempt started.
    Connecting(Device),
    /// A connection attempt failed with a vendor code.
    ConnectError(Device, i32),
    /// The link is up.
    Connected(Device),
    /// GATT service discovery finished.
    ServiceSearchComplete(Device),
    /// The link is down.
    Disconnected(Device),
    /// A disconnect is in progress.
    Disconnecting(Device),
}

/// Callbacks raised by the scale data listener.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleDataCallback {
    /// The scale reported a new measuring state.
    StateChanged(Device, i32),
    /// The scale uploaded samples it stored while offline.
    StoredData(Device, Vec<StoredScaleData>),
    /// The scale reported its battery level.
    Electric(Device, i32),
    /// A live, not yet stable weight reading.
    UnsteadyWeight(Device, f64),
    /// A complete measurement.
    ScaleData(Device, ScaleData),
}

/// Operations offered by the vendor body-scale SDK.
///
/// Implementations may invoke completions and listeners from any thread.
pub trait ScaleSdk: Send + Sync {
    /// Initialises the SDK with the application identifier and licence.
    fn init_sdk(&self, app_id: &str, license_content: &str, done: Completion<VendorStatus>);

    /// Replaces the radio state listener.
    fn set_ble_state_listener(&self, listener: Listener<i32>);

    /// Replaces the discovery listener.
    fn set_discovery_listener(&self, listener: Listener<DiscoveryCallback>);

    /// Replaces the connection listener.
    fn set_connection_listener(&self, listener: Listener<ConnectionCallback>);

    /// Replaces the scale data listener.
    fn set_scale_data_listener(&self, listener: Listener<ScaleDataCallback>);

    /// Starts scanning for scales.
    fn start_discovery(&self, done: Completion<VendorStatus>);

    /// Stops scanning for scales.
    fn stop_discovery(&self, done: Completion<VendorStatus>);

    /// Builds a device handle from its identity pair.
    fn build_device(&self, model_id: &str, mac: &str) -> Device;

    /// Validates a user before it is used by another operation.
    ///
    /// # Errors
    ///
    /// Returns the vendor status when the user is rejected.
    fn validate_user(&self, user: &User) -> Result<(), VendorStatus>;

    /// Connects to a scale on behalf of a user.
    fn connect_device(&self, device: &Device, user: &User, done: Completion<VendorStatus>);

    /// Disconnects from a scale.
    fn disconnect_device(&self, device: &Device, done: Completion<VendorStatus>);

    /// Returns the currently persisted configuration.
    fn config(&self) -> ScaleConfig;

    /// Persists a new configuration.
    fn save_config(&self, config: ScaleConfig, done: Completion<VendorStatus>);

    /// Checks a stored sample's integrity tag and expands it into items.
    fn build_stored_data(
        &self,
        sample: StoredScaleData,
        done: Completion<Result<ScaleData, VendorStatus>>,
    );
}
