//! Host-facing facade over the command and event channels.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use scale_bridge_config::BridgeConfig;
use tracing::debug;

use crate::completion::{PendingResponse, Reply, ResponseError};
use crate::dispatch::{CommandDispatcher, DISPATCH_TARGET, MethodCall, Response};
use crate::events::EventSink;
use crate::sdk::ScaleSdk;

/// One bridge instance between a host and a vendor SDK.
///
/// The command channel is served by [`call`](Self::call) and its blocking
/// and JSON variants. The event channel has a single subscriber, managed
/// with [`listen`](Self::listen) and [`cancel`](Self::cancel).
pub struct ScaleBridge<S: ScaleSdk + ?Sized> {
    dispatcher: CommandDispatcher<S>,
    command_timeout: Option<Duration>,
}

impl<S: ScaleSdk + ?Sized> fmt::Debug for ScaleBridge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleBridge")
            .field("dispatcher", &self.dispatcher)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl<S: ScaleSdk + ?Sized> ScaleBridge<S> {
    /// Creates a bridge over `sdk` using the timeout from `config`.
    #[must_use]
    pub fn new(sdk: Arc<S>, config: &BridgeConfig) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(sdk),
            command_timeout: config.command_timeout(),
        }
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &CommandDispatcher<S> {
        &self.dispatcher
    }

    /// Returns the bound applied by [`call_blocking`](Self::call_blocking).
    #[must_use]
    pub const fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    /// Issues a command and returns the handle its response arrives on.
    #[must_use]
    pub fn call(&self, call: &MethodCall) -> PendingResponse {
        self.dispatcher.handle(call)
    }

    /// Issues a command and waits for its response, bounded by the
    /// configured timeout when one is set.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::TimedOut`] when the bound elapses and
    /// [`ResponseError::Abandoned`] if the vendor dropped its continuation.
    /// A timed-out vendor operation keeps running; its late answer is
    /// discarded.
    pub fn call_blocking(&self, call: &MethodCall) -> Result<Response, ResponseError> {
        let pending = self.call(call);
        let Some(timeout) = self.command_timeout else {
            return pending.wait();
        };
        pending.wait_timeout(timeout)
    }

    /// Parses one JSON request and issues it.
    ///
    /// Unparsable input is answered at once with a malformed-request error
    /// on the returned handle.
    #[must_use]
    pub fn call_json(&self, input: &[u8]) -> PendingResponse {
        match MethodCall::parse(input) {
            Ok(call) => self.call(&call),
            Err(error) => {
                debug!(target: DISPATCH_TARGET, error = %error, "rejecting malformed request");
                let (reply, pending) = Reply::channel("");
                reply.error(error);
                pending
            }
        }
    }

    /// Subscribes `sink` to the event channel, replacing any current
    /// subscriber.
    ///
    /// Returns `true` if a previous subscriber was displaced.
    #[must_use]
    pub fn listen(&self, sink: Arc<dyn EventSink>) -> bool {
        self.dispatcher.events().attach(sink)
    }

    /// Unsubscribes the current event subscriber.
    ///
    /// Returns `true` if a subscriber was attached.
    #[must_use]
    pub fn cancel(&self) -> bool {
        self.dispatcher.events().detach()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::TryRecvError;

    use serde_json::json;

    use super::*;
    use crate::events::{ChannelSink, names};
    use crate::sdk::DiscoveryCallback;
    use crate::test_support::FakeScaleSdk;

    fn bridge_with(sdk: FakeScaleSdk, timeout_ms: u64) -> ScaleBridge<FakeScaleSdk> {
        let config = BridgeConfig {
            command_timeout_ms: timeout_ms,
            ..BridgeConfig::default()
        };
        ScaleBridge::new(Arc::new(sdk), &config)
    }

    #[test]
    fn json_requests_are_dispatched() {
        let bridge = bridge_with(FakeScaleSdk::new(), 0);
        let response = bridge
            .call_json(b"{\"method\":\"getConfig\"}\n")
            .wait()
            .expect("response");
        assert_eq!(
            response.payload().and_then(|payload| payload.get("unit")),
            Some(&json!(0))
        );
    }

    #[test]
    fn malformed_json_is_answered_immediately() {
        let bridge = bridge_with(FakeScaleSdk::new(), 0);
        let response = bridge
            .call_json(b"{\"method\":")
            .try_take()
            .expect("answered")
            .expect("response present");
        assert_eq!(
            response.error().map(crate::dispatch::CommandError::code),
            Some("MALFORMED_REQUEST")
        );
    }

    #[test]
    fn blocking_call_times_out_when_configured() {
        let bridge = bridge_with(FakeScaleSdk::new().with_deferred_completions(), 20);
        let outcome = bridge.call_blocking(&MethodCall::bare("startBleDeviceDiscovery"));
        assert_eq!(
            outcome,
            Err(ResponseError::TimedOut {
                method: "startBleDeviceDiscovery".to_owned(),
                timeout_ms: 20,
            })
        );
        assert_eq!(bridge.dispatcher().sdk().complete_pending(), 1);
    }

    #[test]
    fn blocking_call_without_timeout_returns_the_answer() {
        let bridge = bridge_with(FakeScaleSdk::new(), 0);
        assert_eq!(bridge.command_timeout(), None);
        let response = bridge
            .call_blocking(&MethodCall::bare("stopBleDeviceDiscovery"))
            .expect("response");
        assert!(response.is_success());
    }

    #[test]
    fn listen_and_cancel_manage_the_subscriber() {
        let bridge = bridge_with(FakeScaleSdk::new(), 0);
        let registered = bridge
            .call_blocking(&MethodCall::bare("setBleDeviceDiscoveryListener"))
            .expect("response");
        assert!(registered.is_success());

        let (sink, receiver) = ChannelSink::new();
        assert!(!bridge.listen(Arc::new(sink)));
        assert!(bridge.dispatcher().sdk().emit_discovery(DiscoveryCallback::ScanStarted));
        assert!(bridge.cancel());
        assert!(bridge.dispatcher().sdk().emit_discovery(DiscoveryCallback::ScanStopped));

        let delivered = receiver.try_recv().expect("start event");
        assert_eq!(delivered.name(), names::START_SCAN);
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Disconnected));
    }
}
