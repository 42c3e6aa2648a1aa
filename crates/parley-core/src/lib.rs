//! Parley Core - Interface-to-stub RPC runtime with UID routing.
//!
//! This crate is the runtime half of an interface compiler: a generator
//! (external to this crate) turns interface definitions into descriptors
//! and thin stubs; this crate supplies everything those stubs forward to —
//! client proxies, dispatchers, and the call envelope and failure taxonomy
//! they share.
//!
//! Calls are routed by stable 64-bit uids, never by name: an interface uid
//! scopes the call, a method uid selects the operation. Names exist only
//! for diagnostics.
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_core::{ClientProxy, Dispatcher, InterfaceDescriptor, MethodDescriptor, Router};
//!
//! // Generated constants
//! const COMPOSITOR_UID: u64 = 0x9763fd6ae0868ca0;
//! const CREATE_WINDOW_UID: u64 = 0x7110f2964d70557a;
//!
//! let descriptor = Arc::new(InterfaceDescriptor::new(
//!     COMPOSITOR_UID,
//!     "Compositor",
//!     vec![MethodDescriptor::new(CREATE_WINDOW_UID, "createWindow", PARAMS, "Window")],
//! )?);
//!
//! // Server side: bind the implementation, mount, serve
//! let mut dispatcher = Dispatcher::new(descriptor.clone());
//! dispatcher.bind(CREATE_WINDOW_UID, |imp: Arc<MyCompositor>, size: Vec2f| async move {
//!     imp.create_window(size).await
//! })?;
//! let mut router = Router::new();
//! router.mount(dispatcher, implementation)?;
//! let handle = ipc::IpcServer::start(Arc::new(router)).await?;
//!
//! // Client side: a generated stub wraps ClientProxy::call
//! let client = ipc::IpcClient::connect(handle.addr()).await?;
//! let proxy = ClientProxy::new(descriptor, client);
//! let window: Window = proxy.call(CREATE_WINDOW_UID, &size).await?;
//! ```

pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod ipc;
pub mod proxy;

// Re-export commonly used types
pub use descriptor::{InterfaceDescriptor, InterfaceUid, MethodDescriptor, MethodUid, Param};
pub use dispatch::{Dispatcher, Route, Router};
pub use envelope::Envelope;
pub use error::{CallError, CallResult, DescriptorError};
pub use proxy::{ClientProxy, Invoke};
