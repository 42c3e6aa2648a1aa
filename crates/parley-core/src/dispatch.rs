//! Server-side routing: per-interface dispatchers and the multi-interface
//! router.
//!
//! Routing is by exact uid match only — no partial matching, no name
//! comparison, no fallback other than the explicit unknown-method failure.
//! Because uids are fixed-width integers fixed at generation time, the
//! lookup is a constant-time hash probe, the runtime analog of the switch a
//! stub generator would emit.
//!
//! # Thread Safety
//!
//! A dispatcher owns no mutable state after binding completes; `dispatch`
//! is reentrant and may run concurrently for independent envelopes. The
//! `Send + Sync` bounds on the implementation object make the collaborator's
//! concurrency obligation explicit.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::descriptor::{InterfaceDescriptor, InterfaceUid, MethodUid};
use crate::envelope::Envelope;
use crate::error::{CallError, CallResult, DescriptorError};

/// Type-erased bound handler: decode, invoke, encode.
type Handler<S> = Box<
    dyn Fn(Arc<S>, serde_json::Value) -> BoxFuture<'static, CallResult<serde_json::Value>>
        + Send
        + Sync,
>;

/// Routes envelopes for one interface to typed handlers on a concrete
/// implementation object.
///
/// Generated server stubs bind one handler per declared method; binding an
/// undeclared uid or binding the same uid twice is a construction-time
/// [`DescriptorError`], never a call-time failure.
pub struct Dispatcher<S> {
    descriptor: Arc<InterfaceDescriptor>,
    handlers: HashMap<MethodUid, Handler<S>>,
}

impl<S: Send + Sync + 'static> Dispatcher<S> {
    pub fn new(descriptor: Arc<InterfaceDescriptor>) -> Self {
        Self {
            descriptor,
            handlers: HashMap::new(),
        }
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Bind a typed handler for one declared method.
    ///
    /// The wrapper built here owns the boundary work: it decodes the
    /// envelope payload into `P` (a mismatch is a [`CallError::Decode`] and
    /// the handler body never runs) and encodes the handler's success value
    /// back into the opaque reply payload.
    pub fn bind<P, R, F, Fut>(&mut self, method: MethodUid, handler: F) -> Result<(), DescriptorError>
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<S>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult<R>> + Send + 'static,
    {
        let Some(declared) = self.descriptor.method(method) else {
            return Err(DescriptorError::UndeclaredMethodUid {
                interface: self.descriptor.name(),
                uid: method,
            });
        };
        if self.handlers.contains_key(&method) {
            return Err(DescriptorError::HandlerAlreadyBound {
                interface: self.descriptor.name(),
                uid: method,
            });
        }

        let label = format!("{}::{}", self.descriptor.name(), declared.name());
        let wrapped: Handler<S> = Box::new(move |implementation, args| {
            let params = match serde_json::from_value::<P>(args) {
                Ok(params) => params,
                Err(e) => {
                    let err = CallError::decode(format!("arguments for {}: {}", label, e));
                    return Box::pin(async move { Err(err) });
                }
            };
            let label = label.clone();
            let fut = handler(implementation, params);
            Box::pin(async move {
                let value = fut.await?;
                serde_json::to_value(value)
                    .map_err(|e| CallError::decode(format!("encoding reply for {}: {}", label, e)))
            })
        });

        self.handlers.insert(method, wrapped);
        Ok(())
    }

    /// Route one envelope to the matching method on `implementation`.
    ///
    /// Lookup is scoped by interface uid first, then by exact method uid.
    /// On a miss the implementation object is never touched.
    pub async fn dispatch(
        &self,
        envelope: &Envelope,
        implementation: Arc<S>,
    ) -> CallResult<serde_json::Value> {
        if envelope.interface != self.descriptor.uid() {
            warn!(
                "envelope for interface {:#018x} reached dispatcher for {}",
                envelope.interface,
                self.descriptor.name()
            );
            return Err(CallError::UnknownInterface {
                interface: envelope.interface,
            });
        }

        match self.handlers.get(&envelope.method) {
            Some(handler) => {
                debug!("dispatching {}", self.descriptor.method_label(envelope.method));
                handler(implementation, envelope.args.clone()).await
            }
            None => {
                warn!(
                    "unknown method {:#018x} on interface {}",
                    envelope.method,
                    self.descriptor.name()
                );
                Err(CallError::UnknownMethod {
                    interface: self.descriptor.uid(),
                    method: envelope.method,
                })
            }
        }
    }
}

/// Routing capability the transport layer consumes.
///
/// The transport turns the returned outcome into the reply: `Ok` becomes a
/// success reply, `Err` the failure reply. Either way one envelope yields
/// exactly one terminal outcome.
#[async_trait]
pub trait Route: Send + Sync {
    async fn route(&self, envelope: &Envelope) -> CallResult<serde_json::Value>;
}

#[async_trait]
trait MountedRoute: Send + Sync {
    async fn route_envelope(&self, envelope: &Envelope) -> CallResult<serde_json::Value>;
}

struct Mounted<S> {
    dispatcher: Dispatcher<S>,
    implementation: Arc<S>,
}

#[async_trait]
impl<S: Send + Sync + 'static> MountedRoute for Mounted<S> {
    async fn route_envelope(&self, envelope: &Envelope) -> CallResult<serde_json::Value> {
        self.dispatcher
            .dispatch(envelope, self.implementation.clone())
            .await
    }
}

/// Multi-interface routing table: interface uid first, then method uid.
///
/// Scoping by interface first is what makes method-uid collisions across
/// interfaces harmless.
#[derive(Default)]
pub struct Router {
    interfaces: HashMap<InterfaceUid, Box<dyn MountedRoute>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            interfaces: HashMap::new(),
        }
    }

    /// Mount a dispatcher together with its implementation object.
    pub fn mount<S: Send + Sync + 'static>(
        &mut self,
        dispatcher: Dispatcher<S>,
        implementation: Arc<S>,
    ) -> Result<(), DescriptorError> {
        let uid = dispatcher.descriptor().uid();
        if self.interfaces.contains_key(&uid) {
            return Err(DescriptorError::DuplicateInterfaceUid { uid });
        }
        self.interfaces.insert(
            uid,
            Box::new(Mounted {
                dispatcher,
                implementation,
            }),
        );
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

#[async_trait]
impl Route for Router {
    async fn route(&self, envelope: &Envelope) -> CallResult<serde_json::Value> {
        match self.interfaces.get(&envelope.interface) {
            Some(mounted) => mounted.route_envelope(envelope).await,
            None => {
                warn!("no interface mounted for uid {:#018x}", envelope.interface);
                Err(CallError::UnknownInterface {
                    interface: envelope.interface,
                })
            }
        }
    }
}
