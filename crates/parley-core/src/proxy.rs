//! Client-side forwarding: the `Invoke` capability and the generic proxy.
//!
//! A generated client stub is a thin wrapper over [`ClientProxy::call`]: one
//! method per declared operation, each forwarding its typed arguments with
//! the method's uid. The proxy performs exactly one transport round trip per
//! call and applies no policy of its own — no retries, no caching, no
//! reordering.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::descriptor::{InterfaceDescriptor, InterfaceUid, MethodUid};
use crate::error::{CallError, CallResult};

/// Transport capability consumed by client proxies.
///
/// One `invoke` must resolve with exactly one terminal outcome — a raw reply
/// value or a failure — never zero, never more than one. Timeouts and
/// cancellation are the implementor's business.
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke(
        &self,
        interface: InterfaceUid,
        method: MethodUid,
        args: serde_json::Value,
    ) -> CallResult<serde_json::Value>;
}

/// Generic forwarding half of a generated client stub.
pub struct ClientProxy<T> {
    descriptor: Arc<InterfaceDescriptor>,
    transport: T,
}

impl<T: Invoke> ClientProxy<T> {
    pub fn new(descriptor: Arc<InterfaceDescriptor>, transport: T) -> Self {
        Self {
            descriptor,
            transport,
        }
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Encode `params`, perform the round trip tagged with `method`, and
    /// decode the raw reply into the statically expected response type.
    ///
    /// A transport failure surfaces as [`CallError::Transport`]; a reply
    /// that does not decode as `R` is a [`CallError::Decode`]. The proxy
    /// never converts one into the other.
    pub async fn call<P, R>(&self, method: MethodUid, params: &P) -> CallResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let args = serde_json::to_value(params).map_err(|e| {
            CallError::decode(format!(
                "encoding arguments for {}: {}",
                self.descriptor.method_label(method),
                e
            ))
        })?;

        debug!("invoking {}", self.descriptor.method_label(method));
        let raw = self
            .transport
            .invoke(self.descriptor.uid(), method, args)
            .await?;

        serde_json::from_value(raw).map_err(|e| {
            CallError::decode(format!(
                "reply for {}: {}",
                self.descriptor.method_label(method),
                e
            ))
        })
    }
}
