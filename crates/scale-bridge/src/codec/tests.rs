//! Unit tests for payload decoding and encoding.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::model::Gender;

#[fixture]
fn user_json() -> Value {
    json!({
        "userId": "user-1",
        "height": 175,
        "gender": "male",
        "birthday": 631_152_000_000_i64,
        "athleteType": 0,
        "clothesWeight": 0.5,
    })
}

fn as_map(value: &Value) -> &Payload {
    value.as_object().expect("object fixture")
}

#[rstest]
fn decodes_complete_user(user_json: Value) {
    let args = Arguments::new(as_map(&user_json));
    let profile = decode_user(&args).expect("decode user");
    assert_eq!(profile.id, "user-1");
    assert_eq!(profile.height_cm, 175);
    assert_eq!(profile.gender, Gender::Male);
    assert_eq!(to_epoch_millis(profile.birthday), 631_152_000_000);
    assert_eq!(profile.athlete_type, 0);
    assert!((profile.clothes_weight_kg - 0.5).abs() < f64::EPSILON);
}

#[rstest]
#[case("userId")]
#[case("height")]
#[case("gender")]
#[case("birthday")]
#[case("athleteType")]
#[case("clothesWeight")]
fn missing_user_field_is_named(mut user_json: Value, #[case] field: &str) {
    user_json
        .as_object_mut()
        .expect("object fixture")
        .remove(field);
    let args = Arguments::new(as_map(&user_json));
    let error = decode_user(&args).expect_err("decode must fail");
    assert_eq!(error, CodecError::missing(field));
}

#[rstest]
#[case("height", json!(175.5))]
#[case("height", json!("175"))]
#[case("height", json!(5_000_000_000_i64))]
#[case("gender", json!("unknown"))]
#[case("gender", json!(1))]
#[case("birthday", json!(1.5))]
#[case("birthday", json!(i64::MAX))]
#[case("clothesWeight", json!("0.5"))]
#[case("userId", json!(42))]
fn mistyped_user_field_is_rejected(
    mut user_json: Value,
    #[case] field: &str,
    #[case] value: Value,
) {
    user_json
        .as_object_mut()
        .expect("object fixture")
        .insert(field.to_owned(), value);
    let args = Arguments::new(as_map(&user_json));
    let error = decode_user(&args).expect_err("decode must fail");
    assert!(
        matches!(&error, CodecError::TypeMismatch { field: f, .. } if f == field),
        "unexpected error: {error:?}"
    );
}

#[rstest]
fn null_counts_as_missing(mut user_json: Value) {
    user_json
        .as_object_mut()
        .expect("object fixture")
        .insert("userId".to_owned(), Value::Null);
    let args = Arguments::new(as_map(&user_json));
    assert_eq!(
        decode_user(&args).expect_err("decode must fail"),
        CodecError::missing("userId")
    );
}

#[rstest]
fn integer_clothes_weight_is_accepted(mut user_json: Value) {
    user_json
        .as_object_mut()
        .expect("object fixture")
        .insert("clothesWeight".to_owned(), json!(1));
    let args = Arguments::new(as_map(&user_json));
    let profile = decode_user(&args).expect("decode user");
    assert!((profile.clothes_weight_kg - 1.0).abs() < f64::EPSILON);
}

#[rstest]
fn nested_errors_carry_the_full_path(mut user_json: Value) {
    user_json
        .as_object_mut()
        .expect("object fixture")
        .insert("height".to_owned(), json!("tall"));
    let call = json!({ "user": user_json });
    let args = Arguments::new(as_map(&call));
    let user = args.object("user").expect("user object");
    let error = decode_user(&user).expect_err("decode must fail");
    assert_eq!(error.field(), "user.height");
}

#[test]
fn non_object_nested_value_is_a_mismatch() {
    let call = json!({ "device": "AA:BB" });
    let args = Arguments::new(as_map(&call));
    let error = args.object("device").expect_err("must fail");
    assert_eq!(error, CodecError::mismatch("device", "an object"));
}

#[test]
fn arguments_must_be_an_object_or_null() {
    assert!(Arguments::from_value(&Value::Null).is_ok());
    assert!(Arguments::from_value(&json!({})).is_ok());
    let error = Arguments::from_value(&json!([1, 2])).expect_err("array rejected");
    assert_eq!(error.field(), "arguments");
}

#[test]
fn empty_arguments_report_missing_fields() {
    let error = Arguments::empty().string("mac").expect_err("must fail");
    assert_eq!(error, CodecError::missing("mac"));
}

#[test]
fn decodes_device_identity() {
    let device = json!({ "mac": "AA:BB:CC:DD:EE:FF", "modelId": "1" });
    let (model_id, mac) =
        decode_device_identity(&Arguments::new(as_map(&device))).expect("decode device");
    assert_eq!(model_id, "1");
    assert_eq!(mac, "AA:BB:CC:DD:EE:FF");
}

#[test]
fn decodes_config_and_rejects_bool_as_int() {
    let config = json!({
        "onlyScreenOn": true,
        "allowDuplicates": false,
        "durationMs": 5000,
        "connectTimeoutMs": 30_000,
        "unit": 1,
        "skipLocationCheck": true,
    });
    let decoded = decode_config(&Arguments::new(as_map(&config))).expect("decode config");
    assert_eq!(
        decoded,
        ScaleConfig {
            only_screen_on: true,
            allow_duplicates: false,
            duration_ms: 5000,
            connect_timeout_ms: 30_000,
            unit: 1,
            skip_location_check: true,
        }
    );

    let mut broken = config;
    broken
        .as_object_mut()
        .expect("object fixture")
        .insert("unit".to_owned(), json!(true));
    let error = decode_config(&Arguments::new(as_map(&broken))).expect_err("must fail");
    assert_eq!(error, CodecError::mismatch("unit", "a 32-bit integer"));
}

#[test]
fn config_encoding_uses_decoding_keys() {
    let config = ScaleConfig {
        only_screen_on: true,
        allow_duplicates: true,
        duration_ms: 12,
        connect_timeout_ms: 34,
        unit: 2,
        skip_location_check: false,
    };
    let encoded = encode_config(&config);
    let decoded = decode_config(&Arguments::new(as_map(&encoded))).expect("decode");
    assert_eq!(decoded, config);
}

#[test]
fn device_encoding_nulls_absent_discovery_fields() {
    let encoded = encode_device(&Device::new("1", "AA:BB:CC:DD:EE:FF"));
    assert_eq!(
        encoded,
        json!({ "mac": "AA:BB:CC:DD:EE:FF", "modelId": "1", "name": null, "rssi": null })
    );

    let advertised = encode_device(&Device::new("1", "AA").with_name("Scale").with_rssi(-70));
    assert_eq!(advertised["name"], json!("Scale"));
    assert_eq!(advertised["rssi"], json!(-70));
}

#[test]
fn scale_data_keeps_item_order() {
    let data = ScaleData {
        measured_at: from_epoch_millis(1_700_000_000_000).expect("timestamp"),
        items: vec![
            ScaleItemData {
                item_type: 1,
                name: "weight".to_owned(),
                value: 65.5,
            },
            ScaleItemData {
                item_type: 2,
                name: "bmi".to_owned(),
                value: 21.4,
            },
        ],
    };
    let encoded = encode_scale_data(&data);
    assert_eq!(encoded["measureTime"], json!(1_700_000_000_000_i64));
    assert_eq!(encoded["items"][0]["name"], json!("weight"));
    assert_eq!(encoded["items"][1]["type"], json!(2));
}

#[test]
fn stored_data_omits_user() {
    let sample = StoredScaleData {
        weight_kg: 70.0,
        measured_at: from_epoch_millis(0).expect("epoch"),
        mac: "AA".to_owned(),
        hmac: "tag".to_owned(),
        user: None,
    };
    assert_eq!(
        encode_stored_data(&sample),
        json!({ "weight": 70.0, "measureTime": 0, "mac": "AA", "hmac": "tag" })
    );
}

#[test]
fn status_encodes_code_and_message() {
    assert_eq!(
        encode_status(&VendorStatus::new(7, "busy")),
        json!({ "code": 7, "message": "busy" })
    );
}

#[rstest]
#[case(0)]
#[case(-86_400_000)]
#[case(1_700_000_000_123)]
fn epoch_millis_convert_both_ways(#[case] millis: i64) {
    let at = from_epoch_millis(millis).expect("in range");
    assert_eq!(to_epoch_millis(at), millis);
}
