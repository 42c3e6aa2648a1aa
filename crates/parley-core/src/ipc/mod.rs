//! Bundled reference transport.
//!
//! A lightweight TCP-based transport for parley calls over `127.0.0.1`:
//! length-prefixed JSON frames carrying UID-routed envelopes.
//!
//! # Architecture
//!
//! - **Client**: Implements the [`Invoke`](crate::proxy::Invoke) capability;
//!   one frame out, one frame back, per call
//! - **Server**: Accepts connections and feeds envelopes to a
//!   [`Route`](crate::dispatch::Route) implementation
//! - **Protocol**: Shared framing and wire types used by both
//!
//! The core runtime does not depend on this module; any transport that
//! implements the capabilities can replace it.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::IpcClient;
pub use protocol::{CallFrame, ReplyFrame};
pub use server::{IpcServer, IpcServerHandle};
