//! Method routing for the command channel.
//!
//! Routing happens in two steps. The arguments of a supported method are
//! first decoded into a typed `Command`; decoding failures are answered with an
//! argument error before the vendor is touched. The typed command is then
//! executed against the vendor SDK, which answers through the [`Reply`].

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::errors::CommandError;
use super::request::{Method, MethodCall};
use crate::codec::{self, Arguments, CodecError, keys};
use crate::completion::{PendingResponse, Reply, status_completion};
use crate::events::{EventMultiplexer, ListenerKind};
use crate::model::{ScaleConfig, ScaleData, StoredScaleData, User, UserProfile};
use crate::sdk::{ScaleSdk, VendorStatus};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// A supported method with its arguments decoded.
#[derive(Debug)]
enum Command {
    InitSdk {
        app_id: String,
        license_content: String,
    },
    Listen(ListenerKind),
    StartDiscovery,
    StopDiscovery,
    Connect {
        model_id: String,
        mac: String,
        profile: UserProfile,
    },
    Disconnect {
        model_id: String,
        mac: String,
    },
    GetConfig,
    SaveConfig(ScaleConfig),
    GenerateScaleData {
        profile: UserProfile,
        measured_at: OffsetDateTime,
        mac: String,
        hmac: String,
        weight_kg: f64,
    },
}

impl Command {
    fn decode(method: Method, args: &Arguments<'_>) -> Result<Self, CodecError> {
        let command = match method {
            Method::InitSdk => Self::InitSdk {
                app_id: args.string(keys::APP_ID)?,
                license_content: args.string(keys::LICENSE_CONTENT)?,
            },
            Method::SetBleStateListener => Self::Listen(ListenerKind::BleState),
            Method::SetBleDeviceDiscoveryListener => Self::Listen(ListenerKind::Discovery),
            Method::SetBleConnectionChangeListener => Self::Listen(ListenerKind::Connection),
            Method::SetScaleDataListener => Self::Listen(ListenerKind::ScaleData),
            Method::StartBleDeviceDiscovery => Self::StartDiscovery,
            Method::StopBleDeviceDiscovery => Self::StopDiscovery,
            Method::ConnectDevice => {
                let (model_id, mac) = codec::decode_device_identity(&args.object(keys::DEVICE)?)?;
                let profile = codec::decode_user(&args.object(keys::USER)?)?;
                Self::Connect {
                    model_id,
                    mac,
                    profile,
                }
            }
            Method::DisconnectDevice => {
                let (model_id, mac) = codec::decode_device_identity(args)?;
                Self::Disconnect { model_id, mac }
            }
            Method::GetConfig => Self::GetConfig,
            Method::SaveConfig => Self::SaveConfig(codec::decode_config(args)?),
            Method::GenerateScaleData => Self::GenerateScaleData {
                profile: codec::decode_user(&args.object(keys::USER)?)?,
                measured_at: args.timestamp(keys::MEASURE_TIME_MS)?,
                mac: args.string(keys::MAC)?,
                hmac: args.string(keys::HMAC)?,
                weight_kg: args.double(keys::WEIGHT)?,
            },
        };
        Ok(command)
    }
}

/// Routes host commands to the vendor SDK.
///
/// The dispatcher owns the [`EventMultiplexer`] that listener registration
/// commands wire into the vendor. Handling never blocks on the vendor: the
/// response is produced whenever the vendor continuation fires, possibly on
/// another thread.
pub struct CommandDispatcher<S: ScaleSdk + ?Sized> {
    sdk: Arc<S>,
    events: EventMultiplexer,
}

impl<S: ScaleSdk + ?Sized> fmt::Debug for CommandDispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<S: ScaleSdk + ?Sized> CommandDispatcher<S> {
    /// Creates a dispatcher with a fresh event multiplexer.
    #[must_use]
    pub fn new(sdk: Arc<S>) -> Self {
        Self {
            sdk,
            events: EventMultiplexer::new(),
        }
    }

    /// Returns the vendor SDK.
    #[must_use]
    pub const fn sdk(&self) -> &Arc<S> {
        &self.sdk
    }

    /// Returns the event multiplexer fed by the registered listeners.
    #[must_use]
    pub const fn events(&self) -> &EventMultiplexer {
        &self.events
    }

    /// Handles a call and returns the handle its response will arrive on.
    #[must_use]
    pub fn handle(&self, call: &MethodCall) -> PendingResponse {
        let (reply, pending) = Reply::channel(call.method());
        self.handle_with(call, reply);
        pending
    }

    /// Handles a call, answering through `reply` exactly once.
    pub fn handle_with(&self, call: &MethodCall, reply: Reply) {
        let Some(method) = Method::lookup(call.method()) else {
            debug!(
                target: DISPATCH_TARGET,
                method = call.method(),
                "method not implemented"
            );
            reply.not_implemented(call.method());
            return;
        };

        let decoded = Arguments::from_value(call.arguments())
            .and_then(|args| Command::decode(method, &args));
        match decoded {
            Ok(command) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = method.as_str(),
                    "dispatching command"
                );
                self.execute(command, reply);
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    method = method.as_str(),
                    field = error.field(),
                    error = %error,
                    "rejecting command arguments"
                );
                reply.error(CommandError::from(error));
            }
        }
    }

    fn execute(&self, command: Command, reply: Reply) {
        match command {
            Command::InitSdk {
                app_id,
                license_content,
            } => self
                .sdk
                .init_sdk(&app_id, &license_content, status_completion(reply)),
            Command::Listen(kind) => {
                let registered = self.events.register(kind, self.sdk.as_ref());
                debug!(
                    target: DISPATCH_TARGET,
                    listener = kind.as_str(),
                    registered,
                    "acknowledging listener registration"
                );
                reply.success(codec::encode_status(&VendorStatus::ok()));
            }
            Command::StartDiscovery => self.sdk.start_discovery(status_completion(reply)),
            Command::StopDiscovery => self.sdk.stop_discovery(status_completion(reply)),
            Command::Connect {
                model_id,
                mac,
                profile,
            } => self.connect(&model_id, &mac, profile, reply),
            Command::Disconnect { model_id, mac } => {
                let device = self.sdk.build_device(&model_id, &mac);
                self.sdk.disconnect_device(&device, status_completion(reply));
            }
            Command::GetConfig => reply.success(codec::encode_config(&self.sdk.config())),
            Command::SaveConfig(config) => self.sdk.save_config(config, status_completion(reply)),
            Command::GenerateScaleData {
                profile,
                measured_at,
                mac,
                hmac,
                weight_kg,
            } => match self.validated_user(profile, Method::GenerateScaleData) {
                Ok(user) => {
                    let sample = StoredScaleData {
                        weight_kg,
                        measured_at,
                        mac,
                        hmac,
                        user: Some(user),
                    };
                    self.generate_scale_data(sample, reply);
                }
                Err(error) => reply.error(error),
            },
        }
    }

    fn connect(&self, model_id: &str, mac: &str, profile: UserProfile, reply: Reply) {
        let device = self.sdk.build_device(model_id, mac);
        match self.validated_user(profile, Method::ConnectDevice) {
            Ok(user) => self
                .sdk
                .connect_device(&device, &user, status_completion(reply)),
            Err(error) => reply.error(error),
        }
    }

    fn generate_scale_data(&self, sample: StoredScaleData, reply: Reply) {
        self.sdk.build_stored_data(
            sample,
            Box::new(move |outcome: Result<ScaleData, VendorStatus>| match outcome {
                Ok(data) => reply.success(json!({ "items": codec::encode_items(&data.items) })),
                Err(status) => reply.error(vendor_failure(Method::GenerateScaleData, status)),
            }),
        );
    }

    /// Runs the vendor's user construction step. A rejection is final: the
    /// caller answers with it and skips the main operation.
    fn validated_user(&self, profile: UserProfile, method: Method) -> Result<User, CommandError> {
        let user = User::from(profile);
        self.sdk
            .validate_user(&user)
            .map(|()| user)
            .map_err(|status| vendor_failure(method, status))
    }
}

fn vendor_failure(method: Method, status: VendorStatus) -> CommandError {
    warn!(
        target: DISPATCH_TARGET,
        method = method.as_str(),
        code = status.code,
        message = status.message.as_str(),
        "vendor rejected command"
    );
    CommandError::from(status)
}
