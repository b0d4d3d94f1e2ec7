//! Unit tests for event mapping and the multiplexer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use time::OffsetDateTime;

use super::*;
use crate::model::{ScaleItemData, StoredScaleData};
use crate::sdk::{BroadcastDevice, KitchenDevice};
use crate::test_support::FakeScaleSdk;

fn scale() -> Device {
    Device::new("7", "AA:BB:CC:DD:EE:FF")
        .with_name("QN-Scale")
        .with_rssi(-58)
}

#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<EventRecord>>>,
}

impl Recorder {
    fn sink(&self) -> Arc<dyn EventSink> {
        let seen = Arc::clone(&self.seen);
        Arc::new(move |event: EventRecord| {
            seen.lock().expect("recorder lock").push(event);
        })
    }

    fn names(&self) -> Vec<&'static str> {
        self.seen
            .lock()
            .expect("recorder lock")
            .iter()
            .map(EventRecord::name)
            .collect()
    }

    fn len(&self) -> usize {
        self.seen.lock().expect("recorder lock").len()
    }
}

#[fixture]
fn wired() -> (Arc<FakeScaleSdk>, EventMultiplexer) {
    let sdk = Arc::new(FakeScaleSdk::new());
    let events = EventMultiplexer::new();
    for kind in [
        ListenerKind::BleState,
        ListenerKind::Discovery,
        ListenerKind::Connection,
        ListenerKind::ScaleData,
    ] {
        assert!(events.register(kind, sdk.as_ref()));
    }
    (sdk, events)
}

#[rstest]
#[case(DiscoveryCallback::ScanStarted, names::START_SCAN)]
#[case(DiscoveryCallback::ScanStopped, names::STOP_SCAN)]
#[case(DiscoveryCallback::ScanFailed(4), names::SCAN_FAIL)]
#[case(DiscoveryCallback::DeviceDiscovered(scale()), names::DEVICE_DISCOVER)]
fn discovery_callbacks_map_to_tags(#[case] callback: DiscoveryCallback, #[case] tag: &str) {
    let event = discovery_event(callback).expect("supported callback");
    assert_eq!(event.name(), tag);
}

#[rstest]
#[case(DiscoveryCallback::BroadcastDeviceDiscovered(BroadcastDevice(scale())))]
#[case(DiscoveryCallback::KitchenDeviceDiscovered(KitchenDevice(scale())))]
fn unsupported_device_kinds_are_ignored(#[case] callback: DiscoveryCallback) {
    assert!(discovery_event(callback).is_none());
}

#[rstest]
#[case(ConnectionCallback::Connecting(scale()), names::CONNECTING)]
#[case(ConnectionCallback::Connected(scale()), names::CONNECTED)]
#[case(ConnectionCallback::ServiceSearchComplete(scale()), names::SERVICE_SEARCH_COMPLETE)]
#[case(ConnectionCallback::Disconnected(scale()), names::DISCONNECTED)]
#[case(ConnectionCallback::Disconnecting(scale()), names::DISCONNECTING)]
fn connection_callbacks_without_data_have_no_payload(
    #[case] callback: ConnectionCallback,
    #[case] tag: &str,
) {
    let record = connection_event(&callback).to_record();
    assert_eq!(record.name(), tag);
    assert!(record.payload().is_none());
    assert_eq!(record.to_wire(), json!({ "name": tag, "payload": null }));
}

#[test]
fn connect_error_carries_only_the_code() {
    let record = connection_event(&ConnectionCallback::ConnectError(scale(), 9)).to_record();
    assert_eq!(record.name(), names::CONNECT_ERROR);
    assert_eq!(record.field("errorCode"), Some(&json!(9)));
    assert_eq!(record.payload().map(|payload| payload.len()), Some(1));
}

#[test]
fn discovered_device_is_fully_encoded() {
    let record = discovery_event(DiscoveryCallback::DeviceDiscovered(scale()))
        .expect("supported callback")
        .to_record();
    assert_eq!(
        record.field("device"),
        Some(&json!({
            "mac": "AA:BB:CC:DD:EE:FF",
            "modelId": "7",
            "name": "QN-Scale",
            "rssi": -58,
        }))
    );
}

#[test]
fn scale_data_event_encodes_items_in_order() {
    let data = ScaleData {
        measured_at: OffsetDateTime::UNIX_EPOCH,
        items: vec![
            ScaleItemData {
                item_type: 1,
                name: "weight".to_owned(),
                value: 70.5,
            },
            ScaleItemData {
                item_type: 2,
                name: "bmi".to_owned(),
                value: 22.0,
            },
        ],
    };
    let record = scale_data_event(ScaleDataCallback::ScaleData(scale(), data)).to_record();
    assert_eq!(record.name(), names::GET_SCALE_DATA);
    let items = record
        .field("scaleData")
        .and_then(|data| data.get("items"))
        .and_then(Value::as_array)
        .expect("items array");
    let item_names: Vec<_> = items.iter().filter_map(|item| item.get("name")).collect();
    assert_eq!(item_names, [&json!("weight"), &json!("bmi")]);
}

#[test]
fn stored_samples_are_listed() {
    let sample = StoredScaleData {
        weight_kg: 64.2,
        measured_at: OffsetDateTime::UNIX_EPOCH,
        mac: "AA:BB:CC:DD:EE:FF".to_owned(),
        hmac: "tag".to_owned(),
        user: None,
    };
    let record =
        scale_data_event(ScaleDataCallback::StoredData(scale(), vec![sample])).to_record();
    assert_eq!(
        record.field("storedList"),
        Some(&json!([{
            "weight": 64.2,
            "measureTime": 0,
            "mac": "AA:BB:CC:DD:EE:FF",
            "hmac": "tag",
        }]))
    );
}

#[rstest]
fn events_without_a_sink_are_dropped(wired: (Arc<FakeScaleSdk>, EventMultiplexer)) {
    let (sdk, events) = wired;
    assert!(sdk.emit_ble_state(1));
    let recorder = Recorder::default();
    assert!(!events.attach(recorder.sink()));
    assert_eq!(recorder.len(), 0);
}

#[rstest]
#[case(
    |sdk: &FakeScaleSdk| sdk.emit_ble_state(1),
    names::BLE_SYSTEM_STATE,
    json!({ "state": 1 })
)]
#[case(
    |sdk: &FakeScaleSdk| sdk.emit_discovery(DiscoveryCallback::ScanFailed(4)),
    names::SCAN_FAIL,
    json!({ "code": 4 })
)]
#[case(
    |sdk: &FakeScaleSdk| sdk.emit_scale_data(ScaleDataCallback::StateChanged(scale(), 2)),
    names::SCALE_STATE_CHANGE,
    json!({
        "device": {
            "mac": "AA:BB:CC:DD:EE:FF",
            "modelId": "7",
            "name": "QN-Scale",
            "rssi": -58,
        },
        "state": 2,
    })
)]
fn delivered_events_carry_their_payload(
    wired: (Arc<FakeScaleSdk>, EventMultiplexer),
    #[case] emit: fn(&FakeScaleSdk) -> bool,
    #[case] tag: &str,
    #[case] expected: Value,
) {
    let (sdk, events) = wired;
    let recorder = Recorder::default();
    assert!(!events.attach(recorder.sink()));
    assert!(emit(sdk.as_ref()));

    let delivered = recorder.seen.lock().expect("recorder lock").clone();
    let [record] = delivered.as_slice() else {
        panic!("expected one event, got {delivered:?}");
    };
    assert_eq!(record.name(), tag);
    assert_eq!(record.payload().cloned().map(Value::Object), Some(expected));
}

#[test]
fn sink_may_reenter_the_vendor_while_a_detach_is_pending() {
    let sdk = Arc::new(FakeScaleSdk::new());
    let events = Arc::new(EventMultiplexer::new());
    assert!(events.register_discovery_listener(sdk.as_ref()));

    let recorder = Recorder::default();
    let seen = Arc::clone(&recorder.seen);
    let vendor = Arc::clone(&sdk);
    let multiplexer = Arc::clone(&events);
    let first_delivery = AtomicBool::new(true);
    assert!(!events.attach(Arc::new(move |event: EventRecord| {
        seen.lock().expect("recorder lock").push(event);
        if first_delivery.swap(false, Ordering::SeqCst) {
            let detacher = Arc::clone(&multiplexer);
            let detached = thread::spawn(move || detacher.detach())
                .join()
                .expect("detach thread");
            assert!(detached);
            assert!(vendor.emit_discovery(DiscoveryCallback::ScanStopped));
        }
    })));

    let (done, finished) = mpsc::channel();
    let emitter = Arc::clone(&sdk);
    thread::spawn(move || {
        let emitted = emitter.emit_discovery(DiscoveryCallback::ScanStarted);
        done.send(emitted).expect("test still waiting");
    });

    assert_eq!(finished.recv_timeout(Duration::from_secs(5)), Ok(true));
    assert_eq!(recorder.names(), [names::START_SCAN]);
    assert!(!events.is_attached());
}

#[rstest]
fn each_kind_registers_once(wired: (Arc<FakeScaleSdk>, EventMultiplexer)) {
    let (sdk, events) = wired;
    assert!(!events.register_discovery_listener(sdk.as_ref()));
    assert!(!events.register_scale_data_listener(sdk.as_ref()));
    assert_eq!(sdk.registration_count(ListenerKind::Discovery), 1);
    assert_eq!(sdk.registration_count(ListenerKind::ScaleData), 1);
    assert!(events.is_registered(ListenerKind::Connection));

    let recorder = Recorder::default();
    assert!(!events.attach(recorder.sink()));
    assert!(sdk.emit_discovery(DiscoveryCallback::ScanStarted));
    assert_eq!(recorder.names(), [names::START_SCAN]);
}

#[rstest]
fn attaching_replaces_the_previous_sink(wired: (Arc<FakeScaleSdk>, EventMultiplexer)) {
    let (sdk, events) = wired;
    let first = Recorder::default();
    let second = Recorder::default();

    assert!(!events.attach(first.sink()));
    assert!(sdk.emit_discovery(DiscoveryCallback::ScanStarted));
    assert!(events.attach(second.sink()));
    assert!(sdk.emit_discovery(DiscoveryCallback::ScanStopped));

    assert_eq!(first.names(), [names::START_SCAN]);
    assert_eq!(second.names(), [names::STOP_SCAN]);
}

#[rstest]
fn detached_sink_receives_nothing(wired: (Arc<FakeScaleSdk>, EventMultiplexer)) {
    let (sdk, events) = wired;
    let recorder = Recorder::default();
    assert!(!events.attach(recorder.sink()));
    assert!(events.detach());
    assert!(!events.detach());
    assert!(!events.is_attached());

    assert!(sdk.emit_connection(ConnectionCallback::Connected(scale())));
    assert_eq!(recorder.len(), 0);
}

#[rstest]
fn broadcast_discoveries_never_reach_the_sink(wired: (Arc<FakeScaleSdk>, EventMultiplexer)) {
    let (sdk, events) = wired;
    let recorder = Recorder::default();
    assert!(!events.attach(recorder.sink()));
    let broadcast = BroadcastDevice(scale());
    assert!(sdk.emit_discovery(DiscoveryCallback::BroadcastDeviceDiscovered(broadcast)));
    assert!(sdk.emit_discovery(DiscoveryCallback::DeviceDiscovered(scale())));
    assert_eq!(recorder.names(), [names::DEVICE_DISCOVER]);
}

#[rstest]
fn channel_sink_forwards_in_order(wired: (Arc<FakeScaleSdk>, EventMultiplexer)) {
    let (sdk, events) = wired;
    let (sink, receiver) = ChannelSink::new();
    assert!(!events.attach(Arc::new(sink)));
    assert!(sdk.emit_scale_data(ScaleDataCallback::Electric(scale(), 80)));
    assert!(sdk.emit_scale_data(ScaleDataCallback::UnsteadyWeight(scale(), 70.1)));

    let first = receiver.try_recv().expect("first event");
    let second = receiver.try_recv().expect("second event");
    assert_eq!(first.name(), names::GET_ELECTRIC);
    assert_eq!(first.field("electric"), Some(&json!(80)));
    assert_eq!(second.name(), names::GET_UNSTEADY_WEIGHT);
    assert_eq!(second.field("weight"), Some(&json!(70.1)));
}

#[test]
fn channel_sink_tolerates_a_closed_receiver() {
    let (sink, receiver) = ChannelSink::new();
    drop(receiver);
    sink.deliver(BridgeEvent::StartScan.to_record());
}

#[rstest]
#[case(ListenerKind::BleState, "ble_state")]
#[case(ListenerKind::Discovery, "discovery")]
#[case(ListenerKind::Connection, "connection")]
#[case(ListenerKind::ScaleData, "scale_data")]
fn listener_kinds_have_snake_case_labels(#[case] kind: ListenerKind, #[case] label: &str) {
    assert_eq!(kind.as_str(), label);
    assert_eq!(kind.to_string(), label);
}
