//! Domain entities exchanged with the vendor SDK.
//!
//! These types are the strongly typed counterparts of the loose key/value
//! payloads crossing the host boundary. The [`codec`](crate::codec) module
//! owns every conversion between the two representations.

use strum::{Display, EnumString, IntoStaticStr};
use time::OffsetDateTime;

/// A scale identified by its model identifier and MAC address.
///
/// Devices built from host input only carry the identity pair. Devices
/// reported by discovery may also carry the advertised name and signal
/// strength.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    mac: String,
    model_id: String,
    name: Option<String>,
    rssi: Option<i32>,
}

impl Device {
    /// Creates a device from its identity pair.
    #[must_use]
    pub fn new(model_id: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            model_id: model_id.into(),
            name: None,
            rssi: None,
        }
    }

    /// Attaches the advertised broadcast name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches the received signal strength.
    #[must_use]
    pub const fn with_rssi(mut self, rssi: i32) -> Self {
        self.rssi = Some(rssi);
        self
    }

    /// Returns the MAC address.
    #[must_use]
    pub const fn mac(&self) -> &str {
        self.mac.as_str()
    }

    /// Returns the model identifier.
    #[must_use]
    pub const fn model_id(&self) -> &str {
        self.model_id.as_str()
    }

    /// Returns the advertised name, when discovery supplied one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the signal strength, when discovery supplied one.
    #[must_use]
    pub const fn rssi(&self) -> Option<i32> {
        self.rssi
    }
}

/// Biological sex used by the body-composition formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    /// Encoded as `"male"`.
    Male,
    /// Encoded as `"female"`.
    Female,
}

/// Body shape hint understood by the vendor SDK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyShape {
    /// No hint. The bridge always sends this value.
    #[default]
    None,
    /// Slim build.
    Slim,
    /// Average build.
    Normal,
    /// Muscular build.
    Strong,
}

/// Fitness goal hint understood by the vendor SDK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserGoal {
    /// No goal. The bridge always sends this value.
    #[default]
    None,
    /// Reduce body fat.
    LoseFat,
    /// Keep current composition.
    StayHealthy,
    /// Increase muscle mass.
    GainMuscle,
}

/// Host-supplied user fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    /// Opaque user identifier.
    pub id: String,
    /// Height in centimetres.
    pub height_cm: i32,
    /// Biological sex.
    pub gender: Gender,
    /// Date of birth.
    pub birthday: OffsetDateTime,
    /// Vendor athlete classification.
    pub athlete_type: i32,
    /// Weight of worn clothes in kilograms, subtracted from readings.
    pub clothes_weight_kg: f64,
}

/// A user as handed to the vendor SDK.
///
/// Shape and goal are pinned to their `None` sentinels; hosts cannot choose
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    profile: UserProfile,
    body_shape: BodyShape,
    goal: UserGoal,
}

impl From<UserProfile> for User {
    fn from(profile: UserProfile) -> Self {
        Self {
            profile,
            body_shape: BodyShape::None,
            goal: UserGoal::None,
        }
    }
}

impl User {
    /// Returns the host-supplied fields.
    #[must_use]
    pub const fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> &str {
        self.profile.id.as_str()
    }

    /// Returns the body shape sentinel.
    #[must_use]
    pub const fn body_shape(&self) -> BodyShape {
        self.body_shape
    }

    /// Returns the goal sentinel.
    #[must_use]
    pub const fn goal(&self) -> UserGoal {
        self.goal
    }
}

/// Persisted SDK configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleConfig {
    /// Only scan while the host screen is on.
    pub only_screen_on: bool,
    /// Report the same device repeatedly during one scan.
    pub allow_duplicates: bool,
    /// Scan duration in milliseconds.
    pub duration_ms: i32,
    /// Connection attempt timeout in milliseconds.
    pub connect_timeout_ms: i64,
    /// Display unit system (vendor enumeration).
    pub unit: i32,
    /// Skip the location-service check before scanning.
    pub skip_location_check: bool,
}

/// One named measurement, for example weight or body fat.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleItemData {
    /// Vendor item type code.
    pub item_type: i32,
    /// Display name of the item.
    pub name: String,
    /// Measured value.
    pub value: f64,
}

/// An ordered set of measurement items.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleData {
    /// When the underlying sample was taken.
    pub measured_at: OffsetDateTime,
    /// Items in vendor order.
    pub items: Vec<ScaleItemData>,
}

/// A raw sample stored by the scale, awaiting expansion into [`ScaleData`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredScaleData {
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// When the sample was taken.
    pub measured_at: OffsetDateTime,
    /// MAC address of the scale that produced the sample.
    pub mac: String,
    /// Integrity tag checked by the vendor before expansion.
    pub hmac: String,
    /// User the sample is attributed to, once known.
    pub user: Option<User>,
}
