//! Conversions between domain entities and loose key/value payloads.
//!
//! Decoding is strict: a missing field yields
//! [`CodecError::MissingArgument`] and a value of the wrong kind yields
//! [`CodecError::TypeMismatch`], both naming the offending field by its full
//! path (for example `user.height`). Nothing is coerced, with one exception:
//! double fields accept any JSON number, since hosts routinely serialise
//! whole-valued doubles as integers.
//!
//! Encoding always emits every field of the wire schema; values the vendor
//! did not produce are encoded as `null`.

mod arguments;
mod errors;

use serde_json::{Map, Value, json};
use time::OffsetDateTime;

use crate::model::{
    Device, ScaleConfig, ScaleData, ScaleItemData, StoredScaleData, UserProfile,
};
use crate::sdk::VendorStatus;

pub use self::arguments::Arguments;
pub use self::errors::CodecError;

/// A flat key/value payload as exchanged with the host.
pub type Payload = Map<String, Value>;

/// Argument field names read from host requests.
pub mod keys {
    /// Device MAC address.
    pub const MAC: &str = "mac";
    /// Device model identifier.
    pub const MODEL_ID: &str = "modelId";
    /// Nested device object.
    pub const DEVICE: &str = "device";
    /// Nested user object.
    pub const USER: &str = "user";
    /// User identifier.
    pub const USER_ID: &str = "userId";
    /// User height in centimetres.
    pub const HEIGHT: &str = "height";
    /// User gender.
    pub const GENDER: &str = "gender";
    /// User birthday in epoch milliseconds.
    pub const BIRTHDAY: &str = "birthday";
    /// User athlete classification.
    pub const ATHLETE_TYPE: &str = "athleteType";
    /// Clothes weight in kilograms.
    pub const CLOTHES_WEIGHT: &str = "clothesWeight";
    /// Scan-only-while-screen-on flag.
    pub const ONLY_SCREEN_ON: &str = "onlyScreenOn";
    /// Duplicate discovery flag.
    pub const ALLOW_DUPLICATES: &str = "allowDuplicates";
    /// Scan duration.
    pub const DURATION_MS: &str = "durationMs";
    /// Connect timeout.
    pub const CONNECT_TIMEOUT_MS: &str = "connectTimeoutMs";
    /// Unit system.
    pub const UNIT: &str = "unit";
    /// Location check bypass flag.
    pub const SKIP_LOCATION_CHECK: &str = "skipLocationCheck";
    /// Weight in kilograms.
    pub const WEIGHT: &str = "weight";
    /// Measurement time argument of `generateScaleData`.
    pub const MEASURE_TIME_MS: &str = "measureTimeMs";
    /// Integrity tag.
    pub const HMAC: &str = "hmac";
    /// Application identifier.
    pub const APP_ID: &str = "appId";
    /// Licence file content.
    pub const LICENSE_CONTENT: &str = "licenseContent";
}

/// Converts epoch milliseconds into a timestamp.
///
/// Returns `None` when the value lies outside the representable date range.
#[must_use]
pub fn from_epoch_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::UNIX_EPOCH.checked_add(time::Duration::milliseconds(millis))
}

/// Converts a timestamp into epoch milliseconds, saturating at the `i64`
/// bounds.
#[must_use]
pub fn to_epoch_millis(at: OffsetDateTime) -> i64 {
    let millis = (at - OffsetDateTime::UNIX_EPOCH).whole_milliseconds();
    i64::try_from(millis).unwrap_or(if millis < 0 { i64::MIN } else { i64::MAX })
}

/// Decodes a device identity pair.
///
/// # Errors
///
/// Returns a [`CodecError`] if `mac` or `modelId` is missing or not a string.
pub fn decode_device_identity(args: &Arguments<'_>) -> Result<(String, String), CodecError> {
    let mac = args.string(keys::MAC)?;
    let model_id = args.string(keys::MODEL_ID)?;
    Ok((model_id, mac))
}

/// Decodes host-supplied user fields.
///
/// Body shape and goal are not read; the bridge pins them.
///
/// # Errors
///
/// Returns a [`CodecError`] naming the first missing or mistyped field.
pub fn decode_user(args: &Arguments<'_>) -> Result<UserProfile, CodecError> {
    Ok(UserProfile {
        id: args.string(keys::USER_ID)?,
        height_cm: args.int(keys::HEIGHT)?,
        gender: args.gender(keys::GENDER)?,
        birthday: args.timestamp(keys::BIRTHDAY)?,
        athlete_type: args.int(keys::ATHLETE_TYPE)?,
        clothes_weight_kg: args.double(keys::CLOTHES_WEIGHT)?,
    })
}

/// Decodes the six configuration fields.
///
/// # Errors
///
/// Returns a [`CodecError`] naming the first missing or mistyped field.
pub fn decode_config(args: &Arguments<'_>) -> Result<ScaleConfig, CodecError> {
    Ok(ScaleConfig {
        only_screen_on: args.bool(keys::ONLY_SCREEN_ON)?,
        allow_duplicates: args.bool(keys::ALLOW_DUPLICATES)?,
        duration_ms: args.int(keys::DURATION_MS)?,
        connect_timeout_ms: args.long(keys::CONNECT_TIMEOUT_MS)?,
        unit: args.int(keys::UNIT)?,
        skip_location_check: args.bool(keys::SKIP_LOCATION_CHECK)?,
    })
}

/// Encodes a vendor status as `{code, message}`.
#[must_use]
pub fn encode_status(status: &VendorStatus) -> Value {
    json!({
        "code": status.code,
        "message": status.message,
    })
}

/// Encodes a device, including discovery-only fields as `null` when absent.
#[must_use]
pub fn encode_device(device: &Device) -> Value {
    json!({
        "mac": device.mac(),
        "modelId": device.model_id(),
        "name": device.name(),
        "rssi": device.rssi(),
    })
}

/// Encodes the configuration with the same keys `saveConfig` accepts.
#[must_use]
pub fn encode_config(config: &ScaleConfig) -> Value {
    json!({
        "onlyScreenOn": config.only_screen_on,
        "allowDuplicates": config.allow_duplicates,
        "durationMs": config.duration_ms,
        "connectTimeoutMs": config.connect_timeout_ms,
        "unit": config.unit,
        "skipLocationCheck": config.skip_location_check,
    })
}

/// Encodes one measurement item.
#[must_use]
pub fn encode_item(item: &ScaleItemData) -> Value {
    json!({
        "type": item.item_type,
        "name": item.name,
        "value": item.value,
    })
}

/// Encodes measurement items, preserving order.
#[must_use]
pub fn encode_items(items: &[ScaleItemData]) -> Value {
    Value::Array(items.iter().map(encode_item).collect())
}

/// Encodes a complete measurement.
#[must_use]
pub fn encode_scale_data(data: &ScaleData) -> Value {
    json!({
        "measureTime": to_epoch_millis(data.measured_at),
        "items": encode_items(&data.items),
    })
}

/// Encodes a stored sample. The attributed user is not part of the wire
/// shape.
#[must_use]
pub fn encode_stored_data(sample: &StoredScaleData) -> Value {
    json!({
        "weight": sample.weight_kg,
        "measureTime": to_epoch_millis(sample.measured_at),
        "mac": sample.mac,
        "hmac": sample.hmac,
    })
}

/// Encodes a list of stored samples, preserving order.
#[must_use]
pub fn encode_stored_list(samples: &[StoredScaleData]) -> Value {
    Value::Array(samples.iter().map(encode_stored_data).collect())
}

#[cfg(test)]
mod tests;
