//! The per-call envelope: routing key plus opaque encoded arguments.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::descriptor::{InterfaceUid, MethodUid};
use crate::error::{CallError, CallResult};

/// One in-flight call. Created on the proxy side, consumed exactly once by
/// the dispatcher, discarded after the reply or error path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub interface: InterfaceUid,
    pub method: MethodUid,
    /// Opaque encoded arguments. The runtime only ever reads these through
    /// [`Envelope::decode`].
    pub args: serde_json::Value,
}

impl Envelope {
    pub fn new(interface: InterfaceUid, method: MethodUid, args: serde_json::Value) -> Self {
        Self {
            interface,
            method,
            args,
        }
    }

    /// Typed extraction of the encoded arguments.
    ///
    /// A shape mismatch is a [`CallError::Decode`], never an unchecked cast.
    pub fn decode<T: DeserializeOwned>(&self) -> CallResult<T> {
        serde_json::from_value(self.args.clone()).map_err(|e| {
            CallError::decode(format!(
                "arguments for method {:#018x}: {}",
                self.method, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_typed_args() {
        let envelope = Envelope::new(0x1, 0x2, serde_json::json!([800.0, 600.0]));
        let size: (f64, f64) = envelope.decode().unwrap();
        assert_eq!(size, (800.0, 600.0));
    }

    #[test]
    fn test_decode_shape_mismatch_is_decode_failure() {
        let envelope = Envelope::new(0x1, 0x2, serde_json::json!("not a pair"));
        let err = envelope.decode::<(f64, f64)>().unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_serde_round_trip() {
        let envelope = Envelope::new(
            0x9763fd6ae0868ca0,
            0x7110f2964d70557a,
            serde_json::json!({"w": 800, "h": 600}),
        );
        let json = serde_json::to_string(&envelope).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(envelope, back);
    }
}
