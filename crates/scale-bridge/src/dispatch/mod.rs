//! Command channel dispatch.
//!
//! A host command arrives as one JSON document:
//!
//! ```json
//! {"method":"disconnectDevice","arguments":{"mac":"AA:BB:CC:DD:EE:FF","modelId":"1"}}
//! ```
//!
//! The [`CommandDispatcher`] validates the arguments into a typed command,
//! forwards it to the vendor SDK and answers exactly once through a
//! [`Reply`](crate::completion::Reply). Every response encodes to one of
//! three shapes:
//!
//! ```json
//! {"kind":"success","payload":{"code":0,"message":"OK"}}
//! {"kind":"error","code":"MISSING_ARGUMENT","message":"...","field":"user.height","vendorCode":null}
//! {"kind":"not_implemented","method":"startKitchenScan"}
//! ```
//!
//! Unknown method names are answered with the not-implemented sentinel,
//! never with an error.

mod errors;
mod request;
mod response;
mod router;

pub use self::errors::CommandError;
pub use self::request::{Method, MethodCall};
pub use self::response::Response;
pub use self::router::CommandDispatcher;
pub(crate) use self::router::DISPATCH_TARGET;
