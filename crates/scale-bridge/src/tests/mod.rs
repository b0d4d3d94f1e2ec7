//! Crate-level end-to-end and BDD tests.

use std::sync::Arc;

use scale_bridge_config::BridgeConfig;
use serde_json::{Value, json};

use crate::events::{ChannelSink, names};
use crate::model::Device;
use crate::sdk::{ConnectionCallback, ScaleDataCallback};
use crate::test_support::FakeScaleSdk;
use crate::ScaleBridge;


fn wire(bridge: &ScaleBridge<FakeScaleSdk>, request: &str) -> Value {
    bridge
        .call_json(request.as_bytes())
        .wait()
        .expect("response")
        .to_wire()
}

#[test]
fn host_session_over_json() {
    let bridge = ScaleBridge::new(Arc::new(FakeScaleSdk::new()), &BridgeConfig::default());

    assert_eq!(
        wire(
            &bridge,
            r#"{"method":"initSdk","arguments":{"appId":"app","licenseContent":"content"}}"#
        ),
        json!({ "kind": "success", "payload": { "code": 0, "message": "OK" } })
    );
    assert_eq!(
        wire(&bridge, r#"{"method":"setBleConnectionChangeListener"}"#),
        json!({ "kind": "success", "payload": { "code": 0, "message": "OK" } })
    );
    assert_eq!(
        wire(&bridge, r#"{"method":"setKitchenScaleListener"}"#),
        json!({ "kind": "not_implemented", "method": "setKitchenScaleListener" })
    );
    assert_eq!(
        wire(&bridge, r#"{"method":"disconnectDevice","arguments":{"mac":"AA:BB"}}"#),
        json!({
            "kind": "error",
            "code": "MISSING_ARGUMENT",
            "message": "missing argument 'modelId'",
            "field": "modelId",
            "vendorCode": null,
        })
    );

    let (sink, receiver) = ChannelSink::new();
    assert!(!bridge.listen(Arc::new(sink)));
    let scale = Device::new("1", "AA:BB:CC:DD:EE:FF");
    let sdk = bridge.dispatcher().sdk();
    assert!(sdk.emit_connection(ConnectionCallback::ConnectError(scale.clone(), 4)));
    assert!(!sdk.emit_scale_data(ScaleDataCallback::Electric(scale, 90)));

    let event = receiver.try_recv().expect("connect error event");
    assert_eq!(
        event.to_wire(),
        json!({ "name": names::CONNECT_ERROR, "payload": { "errorCode": 4 } })
    );
    assert!(receiver.try_recv().is_err());
}
