//! Shared wire types and framing.
//!
//! Defines the wire format for the bundled transport: 4-byte big-endian
//! length prefix followed by a UTF-8 JSON payload.
//!
//! ```text
//! [u32 BE: len][UTF-8 JSON bytes of len]
//! ```
//!
//! A call frame is an [`Envelope`] plus the client-allocated call id; a
//! reply frame echoes the id and carries either the result value or the
//! serialized [`CallError`], never both. Serializing the error itself is
//! what keeps failures identical on both ends of the wire.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::IpcConfig;
use crate::descriptor::{InterfaceUid, MethodUid};
use crate::envelope::Envelope;
use crate::error::{CallError, CallResult};

/// One outgoing call on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallFrame {
    pub id: u64,
    pub interface: InterfaceUid,
    pub method: MethodUid,
    pub args: serde_json::Value,
}

impl CallFrame {
    pub fn new(id: u64, envelope: Envelope) -> Self {
        Self {
            id,
            interface: envelope.interface,
            method: envelope.method,
            args: envelope.args,
        }
    }

    pub fn into_envelope(self) -> Envelope {
        Envelope::new(self.interface, self.method, self.args)
    }
}

/// One reply on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyFrame {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CallError>,
}

impl ReplyFrame {
    /// Create a success reply.
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create a failure reply.
    pub fn failure(id: u64, error: CallError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Collapse the frame into the call outcome.
    pub fn into_result(self) -> CallResult<serde_json::Value> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.result
            .ok_or_else(|| CallError::transport("reply frame carries neither result nor error"))
    }
}

/// Read a length-prefixed frame from an async reader.
///
/// Returns `None` on clean EOF (peer closed the connection). A length
/// prefix above [`IpcConfig::MAX_FRAME_SIZE`] is a transport failure.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> CallResult<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;

    if len > IpcConfig::MAX_FRAME_SIZE {
        return Err(CallError::transport(format!(
            "frame size {} exceeds maximum {}",
            len,
            IpcConfig::MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Some(payload))
}

/// Write a length-prefixed frame to an async writer.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, payload: &[u8]) -> CallResult<()> {
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
