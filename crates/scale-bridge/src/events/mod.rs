//! Tagged events fanned in from the vendor listeners.
//!
//! The vendor exposes four independent listener kinds. Each one is mapped by
//! a dedicated function ([`ble_state_event`], [`discovery_event`],
//! [`connection_event`], [`scale_data_event`]) into a [`BridgeEvent`], which
//! the [`EventMultiplexer`] encodes into an [`EventRecord`] and hands to the
//! single attached [`EventSink`]. This module is the only place that knows
//! the full tag set.

mod multiplexer;
mod sink;

use serde::Serialize;
use serde_json::Value;

use crate::codec::{self, Payload};
use crate::model::{Device, ScaleData, StoredScaleData};
use crate::sdk::{ConnectionCallback, DiscoveryCallback, ScaleDataCallback};

pub use self::multiplexer::{EventMultiplexer, ListenerKind};
pub use self::sink::{ChannelSink, EventSink};

/// Event tags as seen by the host.
pub mod names {
    /// Radio state changed.
    pub const BLE_SYSTEM_STATE: &str = "onBleSystemState";
    /// A scale was discovered.
    pub const DEVICE_DISCOVER: &str = "onDeviceDiscover";
    /// Scanning started.
    pub const START_SCAN: &str = "onStartScan";
    /// Scanning stopped.
    pub const STOP_SCAN: &str = "onStopScan";
    /// Scanning failed.
    pub const SCAN_FAIL: &str = "onScanFail";
    /// Connection attempt started.
    pub const CONNECTING: &str = "onConnecting";
    /// Connection attempt failed.
    pub const CONNECT_ERROR: &str = "onConnectError";
    /// Link is up.
    pub const CONNECTED: &str = "onConnected";
    /// Service discovery finished.
    pub const SERVICE_SEARCH_COMPLETE: &str = "onServiceSearchComplete";
    /// Link is down.
    pub const DISCONNECTED: &str = "onDisconnected";
    /// Disconnect in progress.
    pub const DISCONNECTING: &str = "onDisconnecting";
    /// Scale measuring state changed.
    pub const SCALE_STATE_CHANGE: &str = "onScaleStateChange";
    /// Stored samples uploaded.
    pub const GET_STORED_SCALE: &str = "onGetStoredScale";
    /// Battery level reported.
    pub const GET_ELECTRIC: &str = "onGetElectric";
    /// Live weight reported.
    pub const GET_UNSTEADY_WEIGHT: &str = "onGetUnsteadyWeight";
    /// Complete measurement reported.
    pub const GET_SCALE_DATA: &str = "onGetScaleData";
}

/// A vendor callback translated into the bridge's event vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Radio state changed.
    BleSystemState {
        /// Vendor radio state code.
        state: i32,
    },
    /// A connectable scale was discovered.
    DeviceDiscover {
        /// The discovered scale.
        device: Device,
    },
    /// Scanning started.
    StartScan,
    /// Scanning stopped.
    StopScan,
    /// Scanning failed.
    ScanFail {
        /// Vendor failure code.
        code: i32,
    },
    /// Connection attempt started.
    Connecting,
    /// Connection attempt failed.
    ConnectError {
        /// Vendor failure code.
        error_code: i32,
    },
    /// Link is up.
    Connected,
    /// Service discovery finished.
    ServiceSearchComplete,
    /// Link is down.
    Disconnected,
    /// Disconnect in progress.
    Disconnecting,
    /// Scale measuring state changed.
    ScaleStateChange {
        /// Reporting scale.
        device: Device,
        /// Vendor state code.
        state: i32,
    },
    /// Stored samples uploaded.
    GetStoredScale {
        /// Reporting scale.
        device: Device,
        /// Samples in upload order.
        stored: Vec<StoredScaleData>,
    },
    /// Battery level reported.
    GetElectric {
        /// Reporting scale.
        device: Device,
        /// Battery level.
        electric: i32,
    },
    /// Live weight reported.
    GetUnsteadyWeight {
        /// Reporting scale.
        device: Device,
        /// Weight in kilograms.
        weight: f64,
    },
    /// Complete measurement reported.
    GetScaleData {
        /// Reporting scale.
        device: Device,
        /// The measurement.
        data: ScaleData,
    },
}

impl BridgeEvent {
    /// Returns the host-facing tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BleSystemState { .. } => names::BLE_SYSTEM_STATE,
            Self::DeviceDiscover { .. } => names::DEVICE_DISCOVER,
            Self::StartScan => names::START_SCAN,
            Self::StopScan => names::STOP_SCAN,
            Self::ScanFail { .. } => names::SCAN_FAIL,
            Self::Connecting => names::CONNECTING,
            Self::ConnectError { .. } => names::CONNECT_ERROR,
            Self::Connected => names::CONNECTED,
            Self::ServiceSearchComplete => names::SERVICE_SEARCH_COMPLETE,
            Self::Disconnected => names::DISCONNECTED,
            Self::Disconnecting => names::DISCONNECTING,
            Self::ScaleStateChange { .. } => names::SCALE_STATE_CHANGE,
            Self::GetStoredScale { .. } => names::GET_STORED_SCALE,
            Self::GetElectric { .. } => names::GET_ELECTRIC,
            Self::GetUnsteadyWeight { .. } => names::GET_UNSTEADY_WEIGHT,
            Self::GetScaleData { .. } => names::GET_SCALE_DATA,
        }
    }

    /// Encodes the event payload. Events without data have none.
    #[must_use]
    pub fn payload(&self) -> Option<Payload> {
        let entries: Vec<(&str, Value)> = match self {
            Self::StartScan
            | Self::StopScan
            | Self::Connecting
            | Self::Connected
            | Self::ServiceSearchComplete
            | Self::Disconnected
            | Self::Disconnecting => return None,
            Self::BleSystemState { state } => vec![("state", Value::from(*state))],
            Self::DeviceDiscover { device } => vec![("device", codec::encode_device(device))],
            Self::ScanFail { code } => vec![("code", Value::from(*code))],
            Self::ConnectError { error_code } => vec![("errorCode", Value::from(*error_code))],
            Self::ScaleStateChange { device, state } => vec![
                ("device", codec::encode_device(device)),
                ("state", Value::from(*state)),
            ],
            Self::GetStoredScale { device, stored } => vec![
                ("device", codec::encode_device(device)),
                ("storedList", codec::encode_stored_list(stored)),
            ],
            Self::GetElectric { device, electric } => vec![
                ("device", codec::encode_device(device)),
                ("electric", Value::from(*electric)),
            ],
            Self::GetUnsteadyWeight { device, weight } => vec![
                ("device", codec::encode_device(device)),
                ("weight", Value::from(*weight)),
            ],
            Self::GetScaleData { device, data } => vec![
                ("device", codec::encode_device(device)),
                ("scaleData", codec::encode_scale_data(data)),
            ],
        };
        Some(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        )
    }

    /// Encodes the event into the record delivered to the sink.
    #[must_use]
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            name: self.name(),
            payload: self.payload(),
        }
    }
}

/// An encoded event as delivered on the event channel.
///
/// Serialises as `{"name": "...", "payload": {...}}`, with a `null`
/// payload for events that carry no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    name: &'static str,
    payload: Option<Payload>,
}

impl EventRecord {
    /// Returns the event tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the payload, if the event carries one.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Looks up one payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|payload| payload.get(key))
    }

    /// Encodes the record as a JSON value.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let payload = self.payload.clone().map_or(Value::Null, Value::Object);
        serde_json::json!({ "name": self.name, "payload": payload })
    }
}

/// Maps a radio state change.
#[must_use]
pub const fn ble_state_event(state: i32) -> BridgeEvent {
    BridgeEvent::BleSystemState { state }
}

/// Maps a discovery callback. Broadcast and kitchen devices are not
/// supported and map to `None`.
#[must_use]
pub fn discovery_event(callback: DiscoveryCallback) -> Option<BridgeEvent> {
    match callback {
        DiscoveryCallback::DeviceDiscovered(device) => Some(BridgeEvent::DeviceDiscover { device }),
        DiscoveryCallback::ScanStarted => Some(BridgeEvent::StartScan),
        DiscoveryCallback::ScanStopped => Some(BridgeEvent::StopScan),
        DiscoveryCallback::ScanFailed(code) => Some(BridgeEvent::ScanFail { code }),
        DiscoveryCallback::BroadcastDeviceDiscovered(_)
        | DiscoveryCallback::KitchenDeviceDiscovered(_) => None,
    }
}

/// Maps a connection callback. The device is not forwarded.
#[must_use]
pub const fn connection_event(callback: &ConnectionCallback) -> BridgeEvent {
    match *callback {
        ConnectionCallback::Connecting(_) => BridgeEvent::Connecting,
        ConnectionCallback::ConnectError(_, error_code) => {
            BridgeEvent::ConnectError { error_code }
        }
        ConnectionCallback::Connected(_) => BridgeEvent::Connected,
        ConnectionCallback::ServiceSearchComplete(_) => BridgeEvent::ServiceSearchComplete,
        ConnectionCallback::Disconnected(_) => BridgeEvent::Disconnected,
        ConnectionCallback::Disconnecting(_) => BridgeEvent::Disconnecting,
    }
}

/// Maps a scale data callback.
#[must_use]
pub fn scale_data_event(callback: ScaleDataCallback) -> BridgeEvent {
    match callback {
        ScaleDataCallback::StateChanged(device, state) => {
            BridgeEvent::ScaleStateChange { device, state }
        }
        ScaleDataCallback::StoredData(device, stored) => {
            BridgeEvent::GetStoredScale { device, stored }
        }
        ScaleDataCallback::Electric(device, electric) => {
            BridgeEvent::GetElectric { device, electric }
        }
        ScaleDataCallback::UnsteadyWeight(device, weight) => {
            BridgeEvent::GetUnsteadyWeight { device, weight }
        }
        ScaleDataCallback::ScaleData(device, data) => BridgeEvent::GetScaleData { device, data },
    }
}

#[cfg(test)]
mod tests;
