//! One-shot command completion.
//!
//! A [`Reply`] answers exactly one command. It is consumed by value, so a
//! handler cannot respond twice, and it is `Send`, so vendor continuations
//! may answer from their own threads. The host side of a channel reply is a
//! [`PendingResponse`], which can be awaited with or without a bound.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::codec;
use crate::dispatch::{CommandError, Response};
use crate::sdk::{Completion, VendorStatus};

const COMPLETION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::completion");

/// Errors raised while waiting for a command response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// The configured bound elapsed before the vendor answered. The vendor
    /// operation keeps running; its late answer is discarded.
    #[error("command '{method}' timed out after {timeout_ms} ms")]
    TimedOut {
        /// Command name.
        method: String,
        /// Bound that elapsed, in milliseconds.
        timeout_ms: u128,
    },

    /// The reply was dropped without answering, so no response can arrive.
    #[error("command '{method}' was abandoned without a response")]
    Abandoned {
        /// Command name.
        method: String,
    },
}

/// Single-use responder for one command.
pub struct Reply {
    deliver: Box<dyn FnOnce(Response) + Send + 'static>,
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply").finish_non_exhaustive()
    }
}

impl Reply {
    /// Creates a reply backed by a channel, returning the host-side handle.
    #[must_use]
    pub fn channel(method_name: impl Into<String>) -> (Self, PendingResponse) {
        let method: String = method_name.into();
        let (sender, receiver) = mpsc::sync_channel(1);
        let label = method.clone();
        let reply = Self::from_fn(move |response| {
            if sender.send(response).is_err() {
                debug!(
                    target: COMPLETION_TARGET,
                    method = label.as_str(),
                    "host stopped waiting; response discarded"
                );
            }
        });
        (reply, PendingResponse { method, receiver })
    }

    /// Creates a reply that hands the response to a callback.
    #[must_use]
    pub fn from_fn(deliver: impl FnOnce(Response) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    /// Sends a response, consuming the reply.
    pub fn send(self, response: Response) {
        (self.deliver)(response);
    }

    /// Answers with a success payload.
    pub fn success(self, payload: Value) {
        self.send(Response::Success(payload));
    }

    /// Answers with a command error.
    pub fn error(self, error: CommandError) {
        self.send(Response::Error(error));
    }

    /// Answers with the not-implemented sentinel.
    pub fn not_implemented(self, method: impl Into<String>) {
        self.send(Response::NotImplemented {
            method: method.into(),
        });
    }
}

/// Host-side handle for a response that may arrive later.
#[derive(Debug)]
pub struct PendingResponse {
    method: String,
    receiver: Receiver<Response>,
}

impl PendingResponse {
    /// Returns the command name this handle waits for.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Blocks until the response arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Abandoned`] if the reply was dropped
    /// unanswered.
    pub fn wait(self) -> Result<Response, ResponseError> {
        self.receiver.recv().map_err(|_| self.abandoned())
    }

    /// Blocks until the response arrives or the bound elapses.
    ///
    /// The handle stays usable after a timeout, so callers may keep waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::TimedOut`] when the bound elapses and
    /// [`ResponseError::Abandoned`] if the reply was dropped unanswered.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Response, ResponseError> {
        self.receiver
            .recv_timeout(timeout)
            .map_err(|error| match error {
                RecvTimeoutError::Timeout => ResponseError::TimedOut {
                    method: self.method.clone(),
                    timeout_ms: timeout.as_millis(),
                },
                RecvTimeoutError::Disconnected => self.abandoned(),
            })
    }

    /// Returns the response if it has already arrived.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseError::Abandoned`] if the reply was dropped
    /// unanswered.
    pub fn try_take(&self) -> Result<Option<Response>, ResponseError> {
        match self.receiver.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self.abandoned()),
        }
    }

    fn abandoned(&self) -> ResponseError {
        ResponseError::Abandoned {
            method: self.method.clone(),
        }
    }
}

/// Adapts a reply into a vendor continuation that answers with the encoded
/// `{code, message}` status, whatever the code.
#[must_use]
pub fn status_completion(reply: Reply) -> Completion<VendorStatus> {
    Box::new(move |status: VendorStatus| reply.success(codec::encode_status(&status)))
}
