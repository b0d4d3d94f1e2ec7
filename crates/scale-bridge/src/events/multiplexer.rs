use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use strum::{Display, IntoStaticStr};
use tracing::debug;

use super::sink::EventSink;
use super::{BridgeEvent, ble_state_event, connection_event, discovery_event, scale_data_event};
use crate::sdk::{ConnectionCallback, DiscoveryCallback, ScaleDataCallback, ScaleSdk};

/// Tracing target for event delivery.
pub(crate) const EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// The four vendor listener kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ListenerKind {
    /// Radio on/off state.
    BleState,
    /// Device discovery.
    Discovery,
    /// Connection lifecycle.
    Connection,
    /// Scale measurements.
    ScaleData,
}

impl ListenerKind {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Holder for the currently attached sink, shared with vendor listeners.
#[derive(Default)]
struct SinkSlot {
    current: RwLock<Option<Arc<dyn EventSink>>>,
}

impl SinkSlot {
    /// Clones the current sink under the read lock and delivers after
    /// releasing it, so a sink may re-enter the vendor while a detach is
    /// pending.
    fn publish(&self, event: &BridgeEvent) {
        let current = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(sink) = current else {
            debug!(
                target: EVENTS_TARGET,
                event = event.name(),
                "no sink attached; event dropped"
            );
            return;
        };
        sink.deliver(event.to_record());
    }

    fn replace(&self, sink: Option<Arc<dyn EventSink>>) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, sink).is_some()
    }

    fn is_attached(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[derive(Debug, Default)]
struct Registrations {
    ble_state: AtomicBool,
    discovery: AtomicBool,
    connection: AtomicBool,
    scale_data: AtomicBool,
}

impl Registrations {
    const fn flag(&self, kind: ListenerKind) -> &AtomicBool {
        match kind {
            ListenerKind::BleState => &self.ble_state,
            ListenerKind::Discovery => &self.discovery,
            ListenerKind::Connection => &self.connection,
            ListenerKind::ScaleData => &self.scale_data,
        }
    }
}

/// Fans the vendor listeners into one event channel with at most one sink.
///
/// Events raised while no sink is attached are dropped: there is no
/// buffering and no replay. Each listener kind is registered with the vendor
/// at most once per multiplexer.
#[derive(Default)]
pub struct EventMultiplexer {
    slot: Arc<SinkSlot>,
    registrations: Registrations,
}

impl fmt::Debug for EventMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMultiplexer")
            .field("attached", &self.slot.is_attached())
            .field("registrations", &self.registrations)
            .finish()
    }
}

impl EventMultiplexer {
    /// Creates a multiplexer with no sink and no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a sink, silently replacing any previous one.
    ///
    /// Returns `true` if a previous sink was displaced.
    #[must_use]
    pub fn attach(&self, sink: Arc<dyn EventSink>) -> bool {
        let displaced = self.slot.replace(Some(sink));
        debug!(target: EVENTS_TARGET, displaced, "event sink attached");
        displaced
    }

    /// Detaches the current sink.
    ///
    /// A delivery that started before this call may still reach the
    /// detached sink; events raised afterwards do not.
    ///
    /// Returns `true` if a sink was attached.
    #[must_use]
    pub fn detach(&self) -> bool {
        let detached = self.slot.replace(None);
        debug!(target: EVENTS_TARGET, detached, "event sink detached");
        detached
    }

    /// Returns `true` while a sink is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.is_attached()
    }

    /// Returns `true` once the given listener kind has been registered.
    #[must_use]
    pub fn is_registered(&self, kind: ListenerKind) -> bool {
        self.registrations.flag(kind).load(Ordering::Acquire)
    }

    /// Registers the radio state listener.
    ///
    /// Returns `false` without touching the vendor if already registered.
    #[must_use]
    pub fn register_ble_state_listener<S: ScaleSdk + ?Sized>(&self, sdk: &S) -> bool {
        if !self.claim(ListenerKind::BleState) {
            return false;
        }
        let slot = Arc::clone(&self.slot);
        sdk.set_ble_state_listener(Arc::new(move |state: i32| {
            slot.publish(&ble_state_event(state));
        }));
        true
    }

    /// Registers the discovery listener.
    ///
    /// Returns `false` without touching the vendor if already registered.
    #[must_use]
    pub fn register_discovery_listener<S: ScaleSdk + ?Sized>(&self, sdk: &S) -> bool {
        if !self.claim(ListenerKind::Discovery) {
            return false;
        }
        let slot = Arc::clone(&self.slot);
        sdk.set_discovery_listener(Arc::new(move |callback: DiscoveryCallback| {
            let Some(event) = discovery_event(callback) else {
                debug!(target: EVENTS_TARGET, "unsupported device kind discovered; ignored");
                return;
            };
            slot.publish(&event);
        }));
        true
    }

    /// Registers the connection listener.
    ///
    /// Returns `false` without touching the vendor if already registered.
    #[must_use]
    pub fn register_connection_listener<S: ScaleSdk + ?Sized>(&self, sdk: &S) -> bool {
        if !self.claim(ListenerKind::Connection) {
            return false;
        }
        let slot = Arc::clone(&self.slot);
        sdk.set_connection_listener(Arc::new(move |callback: ConnectionCallback| {
            slot.publish(&connection_event(&callback));
        }));
        true
    }

    /// Registers the scale data listener.
    ///
    /// Returns `false` without touching the vendor if already registered.
    #[must_use]
    pub fn register_scale_data_listener<S: ScaleSdk + ?Sized>(&self, sdk: &S) -> bool {
        if !self.claim(ListenerKind::ScaleData) {
            return false;
        }
        let slot = Arc::clone(&self.slot);
        sdk.set_scale_data_listener(Arc::new(move |callback: ScaleDataCallback| {
            slot.publish(&scale_data_event(callback));
        }));
        true
    }

    /// Registers a listener kind by value.
    #[must_use]
    pub fn register<S: ScaleSdk + ?Sized>(&self, kind: ListenerKind, sdk: &S) -> bool {
        match kind {
            ListenerKind::BleState => self.register_ble_state_listener(sdk),
            ListenerKind::Discovery => self.register_discovery_listener(sdk),
            ListenerKind::Connection => self.register_connection_listener(sdk),
            ListenerKind::ScaleData => self.register_scale_data_listener(sdk),
        }
    }

    fn claim(&self, kind: ListenerKind) -> bool {
        let first = !self.registrations.flag(kind).swap(true, Ordering::AcqRel);
        debug!(
            target: EVENTS_TARGET,
            listener = kind.as_str(),
            first,
            "listener registration requested"
        );
        first
    }
}
