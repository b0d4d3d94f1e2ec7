//! In-memory vendor double for exercising the bridge without hardware.
//!
//! [`FakeScaleSdk`] records every call it receives and lets tests drive the
//! registered listeners directly. Completions run inline by default; switch
//! to deferred mode to hold them back and release or drop them later.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::events::ListenerKind;
use crate::model::{Device, ScaleConfig, ScaleData, ScaleItemData, StoredScaleData, User};
use crate::sdk::{
    Completion, ConnectionCallback, DiscoveryCallback, Listener, ScaleDataCallback, ScaleSdk,
    VendorStatus,
};

/// Vendor code reported when a stored sample's integrity tag is rejected.
pub const HMAC_MISMATCH_CODE: i32 = 1203;

/// Item type code of the weight item produced by sample expansion.
pub const WEIGHT_ITEM_TYPE: i32 = 1;

/// Item type code of the body-mass-index item produced by sample expansion.
pub const BMI_ITEM_TYPE: i32 = 2;

type Deferred = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Listeners {
    ble_state: Option<Listener<i32>>,
    discovery: Option<Listener<DiscoveryCallback>>,
    connection: Option<Listener<ConnectionCallback>>,
    scale_data: Option<Listener<ScaleDataCallback>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct RegistrationCounts {
    ble_state: usize,
    discovery: usize,
    connection: usize,
    scale_data: usize,
}

impl RegistrationCounts {
    const fn get(self, kind: ListenerKind) -> usize {
        match kind {
            ListenerKind::BleState => self.ble_state,
            ListenerKind::Discovery => self.discovery,
            ListenerKind::Connection => self.connection,
            ListenerKind::ScaleData => self.scale_data,
        }
    }
}

struct FakeState {
    listeners: Listeners,
    registrations: RegistrationCounts,
    config: ScaleConfig,
    operation_status: VendorStatus,
    user_rejection: Option<VendorStatus>,
    valid_hmac: String,
    defer: bool,
    deferred: Vec<Deferred>,
    initialisations: Vec<(String, String)>,
    connections: Vec<(Device, User)>,
    disconnections: Vec<Device>,
    saved_configs: Vec<ScaleConfig>,
    discovery_requests: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            listeners: Listeners::default(),
            registrations: RegistrationCounts::default(),
            config: ScaleConfig::default(),
            operation_status: VendorStatus::ok(),
            user_rejection: None,
            valid_hmac: String::new(),
            defer: false,
            deferred: Vec::new(),
            initialisations: Vec::new(),
            connections: Vec::new(),
            disconnections: Vec::new(),
            saved_configs: Vec::new(),
            discovery_requests: 0,
        }
    }
}

/// Scriptable stand-in for the vendor SDK.
#[derive(Default)]
pub struct FakeScaleSdk {
    state: Mutex<FakeState>,
}

impl FakeScaleSdk {
    /// Creates a double that accepts every user and answers `(0, "OK")`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every status-returning operation with `status`.
    #[must_use]
    pub fn with_operation_status(self, status: VendorStatus) -> Self {
        self.lock().operation_status = status;
        self
    }

    /// Rejects every user with `status`.
    #[must_use]
    pub fn with_user_rejection(self, status: VendorStatus) -> Self {
        self.lock().user_rejection = Some(status);
        self
    }

    /// Seeds the persisted configuration.
    #[must_use]
    pub fn with_config(self, config: ScaleConfig) -> Self {
        self.lock().config = config;
        self
    }

    /// Sets the only integrity tag accepted by sample expansion.
    #[must_use]
    pub fn with_valid_hmac(self, hmac: impl Into<String>) -> Self {
        self.lock().valid_hmac = hmac.into();
        self
    }

    /// Holds completions back until [`Self::complete_pending`] runs them.
    #[must_use]
    pub fn with_deferred_completions(self) -> Self {
        self.lock().defer = true;
        self
    }

    /// Runs every held completion in submission order and returns how many
    /// ran.
    #[must_use]
    pub fn complete_pending(&self) -> usize {
        let pending = std::mem::take(&mut self.lock().deferred);
        let count = pending.len();
        for run in pending {
            run();
        }
        count
    }

    /// Drops every held completion without running it.
    #[must_use]
    pub fn discard_pending(&self) -> usize {
        let pending = std::mem::take(&mut self.lock().deferred);
        pending.len()
    }

    /// Returns how often the vendor listener of `kind` was replaced.
    #[must_use]
    pub fn registration_count(&self, kind: ListenerKind) -> usize {
        self.lock().registrations.get(kind)
    }

    /// Returns the `(app_id, license_content)` pairs seen by `init_sdk`.
    #[must_use]
    pub fn initialisations(&self) -> Vec<(String, String)> {
        self.lock().initialisations.clone()
    }

    /// Returns every connection request in arrival order.
    #[must_use]
    pub fn connections(&self) -> Vec<(Device, User)> {
        self.lock().connections.clone()
    }

    /// Returns every disconnection request in arrival order.
    #[must_use]
    pub fn disconnections(&self) -> Vec<Device> {
        self.lock().disconnections.clone()
    }

    /// Returns every configuration passed to `save_config`.
    #[must_use]
    pub fn saved_configs(&self) -> Vec<ScaleConfig> {
        self.lock().saved_configs.clone()
    }

    /// Returns how many start or stop discovery requests arrived.
    #[must_use]
    pub fn discovery_requests(&self) -> usize {
        self.lock().discovery_requests
    }

    /// Raises a radio state change. Returns `false` if nothing listens.
    #[must_use]
    pub fn emit_ble_state(&self, state: i32) -> bool {
        let Some(listener) = self.lock().listeners.ble_state.clone() else {
            return false;
        };
        listener(state);
        true
    }

    /// Raises a discovery callback. Returns `false` if nothing listens.
    #[must_use]
    pub fn emit_discovery(&self, callback: DiscoveryCallback) -> bool {
        let Some(listener) = self.lock().listeners.discovery.clone() else {
            return false;
        };
        listener(callback);
        true
    }

    /// Raises a connection callback. Returns `false` if nothing listens.
    #[must_use]
    pub fn emit_connection(&self, callback: ConnectionCallback) -> bool {
        let Some(listener) = self.lock().listeners.connection.clone() else {
            return false;
        };
        listener(callback);
        true
    }

    /// Raises a scale data callback. Returns `false` if nothing listens.
    #[must_use]
    pub fn emit_scale_data(&self, callback: ScaleDataCallback) -> bool {
        let Some(listener) = self.lock().listeners.scale_data.clone() else {
            return false;
        };
        listener(callback);
        true
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish<T: Send + 'static>(&self, done: Completion<T>, value: T) {
        let mut state = self.lock();
        if state.defer {
            state.deferred.push(Box::new(move || done(value)));
            return;
        }
        drop(state);
        done(value);
    }

    fn finish_status(&self, done: Completion<VendorStatus>) {
        let status = self.lock().operation_status.clone();
        self.finish(done, status);
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "body-mass index is a ratio of floating point measurements"
)]
fn expand(sample: &StoredScaleData) -> ScaleData {
    let mut items = vec![ScaleItemData {
        item_type: WEIGHT_ITEM_TYPE,
        name: "weight".to_owned(),
        value: sample.weight_kg,
    }];
    let height_cm = sample
        .user
        .as_ref()
        .map_or(0, |user| user.profile().height_cm);
    if height_cm > 0 {
        let metres = f64::from(height_cm) / 100.0;
        items.push(ScaleItemData {
            item_type: BMI_ITEM_TYPE,
            name: "bmi".to_owned(),
            value: sample.weight_kg / (metres * metres),
        });
    }
    ScaleData {
        measured_at: sample.measured_at,
        items,
    }
}

impl ScaleSdk for FakeScaleSdk {
    fn init_sdk(&self, app_id: &str, license_content: &str, done: Completion<VendorStatus>) {
        self.lock()
            .initialisations
            .push((app_id.to_owned(), license_content.to_owned()));
        self.finish_status(done);
    }

    fn set_ble_state_listener(&self, listener: Listener<i32>) {
        let mut state = self.lock();
        state.listeners.ble_state = Some(listener);
        state.registrations.ble_state += 1;
    }

    fn set_discovery_listener(&self, listener: Listener<DiscoveryCallback>) {
        let mut state = self.lock();
        state.listeners.discovery = Some(listener);
        state.registrations.discovery += 1;
    }

    fn set_connection_listener(&self, listener: Listener<ConnectionCallback>) {
        let mut state = self.lock();
        state.listeners.connection = Some(listener);
        state.registrations.connection += 1;
    }

    fn set_scale_data_listener(&self, listener: Listener<ScaleDataCallback>) {
        let mut state = self.lock();
        state.listeners.scale_data = Some(listener);
        state.registrations.scale_data += 1;
    }

    fn start_discovery(&self, done: Completion<VendorStatus>) {
        self.lock().discovery_requests += 1;
        self.finish_status(done);
    }

    fn stop_discovery(&self, done: Completion<VendorStatus>) {
        self.lock().discovery_requests += 1;
        self.finish_status(done);
    }

    fn build_device(&self, model_id: &str, mac: &str) -> Device {
        Device::new(model_id, mac)
    }

    fn validate_user(&self, _user: &User) -> Result<(), VendorStatus> {
        self.lock().user_rejection.clone().map_or(Ok(()), Err)
    }

    fn connect_device(&self, device: &Device, user: &User, done: Completion<VendorStatus>) {
        self.lock().connections.push((device.clone(), user.clone()));
        self.finish_status(done);
    }

    fn disconnect_device(&self, device: &Device, done: Completion<VendorStatus>) {
        self.lock().disconnections.push(device.clone());
        self.finish_status(done);
    }

    fn config(&self) -> ScaleConfig {
        self.lock().config.clone()
    }

    fn save_config(&self, config: ScaleConfig, done: Completion<VendorStatus>) {
        {
            let mut state = self.lock();
            state.config = config.clone();
            state.saved_configs.push(config);
        }
        self.finish_status(done);
    }

    fn build_stored_data(
        &self,
        sample: StoredScaleData,
        done: Completion<Result<ScaleData, VendorStatus>>,
    ) {
        let accepted = self.lock().valid_hmac == sample.hmac;
        let outcome = if accepted {
            Ok(expand(&sample))
        } else {
            Err(VendorStatus::new(
                HMAC_MISMATCH_CODE,
                "stored sample failed integrity verification",
            ))
        };
        self.finish(done, outcome);
    }
}
