//! Error types for the parley runtime.
//!
//! Per-call failures (`CallError`) are ordinary values: they travel through
//! the same `CallResult` channel as success, cross the wire serialized, and
//! are reconstructed unmodified on the caller's side. Construction-time
//! programming errors (`DescriptorError`) never occur at call time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::{InterfaceUid, MethodUid};

/// Per-call failure taxonomy.
///
/// The routing kinds (`UnknownInterface`, `UnknownMethod`) are produced by
/// the dispatcher before any implementation code runs. `Decode` means the
/// payload did not match the expected shape; the handler body never ran.
/// `Application` means the concrete method ran and failed. `Transport` means
/// the round trip itself could not complete and is always distinguishable
/// from an application failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallError {
    #[error("unknown interface {interface:#018x}")]
    UnknownInterface { interface: InterfaceUid },

    #[error("unknown method {method:#018x} on interface {interface:#018x}")]
    UnknownMethod {
        interface: InterfaceUid,
        method: MethodUid,
    },

    #[error("decode failure: {message}")]
    Decode { message: String },

    #[error("{message}")]
    Application {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<serde_json::Value>,
    },

    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl CallError {
    /// Create a decode failure.
    pub fn decode(message: impl Into<String>) -> Self {
        CallError::Decode {
            message: message.into(),
        }
    }

    /// Create an application failure with no structured detail.
    pub fn application(message: impl Into<String>) -> Self {
        CallError::Application {
            message: message.into(),
            detail: None,
        }
    }

    /// Create an application failure carrying structured detail.
    pub fn application_with(message: impl Into<String>, detail: serde_json::Value) -> Self {
        CallError::Application {
            message: message.into(),
            detail: Some(detail),
        }
    }

    /// Create a transport failure.
    pub fn transport(message: impl Into<String>) -> Self {
        CallError::Transport {
            message: message.into(),
        }
    }

    /// Stable label for the failure kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            CallError::UnknownInterface { .. } => "unknown_interface",
            CallError::UnknownMethod { .. } => "unknown_method",
            CallError::Decode { .. } => "decode",
            CallError::Application { .. } => "application",
            CallError::Transport { .. } => "transport",
        }
    }

    /// True for the dispatcher-level kinds that never reach an implementation.
    pub fn is_routing_failure(&self) -> bool {
        matches!(
            self,
            CallError::UnknownInterface { .. } | CallError::UnknownMethod { .. }
        )
    }
}

impl From<std::io::Error> for CallError {
    fn from(err: std::io::Error) -> Self {
        CallError::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type alias for per-call outcomes.
pub type CallResult<T> = std::result::Result<T, CallError>;

/// Programming errors detected while building descriptors and routing
/// tables. These are generation/construction-time only; a well-formed
/// descriptor can never produce one during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("duplicate method uid {uid:#018x} in interface {interface}")]
    DuplicateMethodUid {
        interface: &'static str,
        uid: MethodUid,
    },

    #[error("method uid {uid:#018x} is not declared by interface {interface}")]
    UndeclaredMethodUid {
        interface: &'static str,
        uid: MethodUid,
    },

    #[error("method uid {uid:#018x} on interface {interface} already has a handler")]
    HandlerAlreadyBound {
        interface: &'static str,
        uid: MethodUid,
    },

    #[error("interface uid {uid:#018x} is already mounted")]
    DuplicateInterfaceUid { uid: InterfaceUid },
}
