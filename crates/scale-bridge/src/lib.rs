//! Bridge between a host shell and a Bluetooth body-scale vendor SDK.
//!
//! The host talks to the bridge over two logical channels:
//!
//! - a **command channel**, where each [`MethodCall`] produces exactly one
//!   [`Response`], possibly after the vendor's asynchronous continuation
//!   fires;
//! - an **event channel**, where vendor listener callbacks are fanned in to
//!   at most one attached [`EventSink`] as tagged [`EventRecord`]s.
//!
//! # Architecture
//!
//! The vendor library sits behind the [`ScaleSdk`] trait. The
//! [`CommandDispatcher`] decodes loose host arguments through the
//! [`codec`] module into typed commands, forwards them to the vendor, and
//! answers through a one-shot [`Reply`]. Listener registration commands wire
//! the vendor's listeners into the [`EventMultiplexer`], which drops events
//! while no sink is attached. [`ScaleBridge`] bundles both channels with the
//! timeout taken from [`scale_bridge_config::BridgeConfig`].
//!
//! The bridge only emits `tracing` events; [`telemetry::initialise`]
//! installs a subscriber for hosts that have none.

pub mod bridge;
pub mod codec;
pub mod completion;
pub mod dispatch;
pub mod events;
pub mod model;
pub mod sdk;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests;

pub use self::bridge::ScaleBridge;
pub use self::completion::{PendingResponse, Reply, ResponseError};
pub use self::dispatch::{CommandDispatcher, CommandError, Method, MethodCall, Response};
pub use self::events::{BridgeEvent, ChannelSink, EventMultiplexer, EventRecord, EventSink};
pub use self::sdk::{ScaleSdk, VendorStatus};
