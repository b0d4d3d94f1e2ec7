use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use super::EventRecord;
use super::multiplexer::EVENTS_TARGET;

/// Subscriber on the event channel.
///
/// Deliveries happen synchronously on the vendor's callback thread and in
/// callback order for any one listener kind. No lock is held during
/// `deliver`, so implementations may issue commands or switch sinks from
/// inside it. A sink replaced or detached concurrently may still receive
/// the event being delivered at that moment.
pub trait EventSink: Send + Sync {
    /// Receives one event.
    fn deliver(&self, event: EventRecord);
}

impl<F> EventSink for F
where
    F: Fn(EventRecord) + Send + Sync,
{
    fn deliver(&self, event: EventRecord) {
        self(event);
    }
}

/// Sink that forwards events into a standard channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<EventRecord>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that observes it.
    #[must_use]
    pub fn new() -> (Self, Receiver<EventRecord>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: EventRecord) {
        if let Err(error) = self.sender.send(event) {
            debug!(
                target: EVENTS_TARGET,
                event = error.0.name(),
                "receiver closed; event dropped"
            );
        }
    }
}
