//! TCP client side of the bundled transport.
//!
//! Implements the [`Invoke`] capability over a framed connection: one call
//! frame out, one reply frame back, per invocation.
//!
//! # Thread Safety
//!
//! The client uses a tokio `Mutex` to serialize access to the TCP stream,
//! allowing safe concurrent use from multiple async tasks. Call ids come
//! from an atomic counter so concurrent callers never share an id.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use super::protocol::{read_frame, write_frame, CallFrame, ReplyFrame};
use crate::config::IpcConfig;
use crate::descriptor::{InterfaceUid, MethodUid};
use crate::envelope::Envelope;
use crate::error::{CallError, CallResult};
use crate::proxy::Invoke;

/// IPC client connected to an [`IpcServer`](super::IpcServer).
#[derive(Debug)]
pub struct IpcClient {
    stream: Mutex<TcpStream>,
    addr: SocketAddr,
    next_id: AtomicU64,
}

impl IpcClient {
    /// Connect, bounded by [`IpcConfig::CONNECT_TIMEOUT`].
    pub async fn connect(addr: SocketAddr) -> CallResult<Self> {
        let stream = tokio::time::timeout(IpcConfig::CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| CallError::transport(format!("connect to {} timed out", addr)))?
            .map_err(|e| CallError::transport(format!("connect to {}: {}", addr, e)))?;

        debug!("IPC client connected to {}", addr);

        Ok(Self {
            stream: Mutex::new(stream),
            addr,
            next_id: AtomicU64::new(IpcConfig::FIRST_CALL_ID),
        })
    }

    /// Address of the connected server.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Invoke for IpcClient {
    /// Perform one round trip. Connection loss, a malformed reply frame, or
    /// a mismatched call id all surface as [`CallError::Transport`]; a
    /// failure the server sent deliberately comes back as the very error it
    /// serialized.
    async fn invoke(
        &self,
        interface: InterfaceUid,
        method: MethodUid,
        args: serde_json::Value,
    ) -> CallResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = CallFrame::new(id, Envelope::new(interface, method, args));
        let frame_bytes = serde_json::to_vec(&frame)
            .map_err(|e| CallError::transport(format!("encoding call frame: {}", e)))?;

        let mut stream = self.stream.lock().await;
        let (mut reader, mut writer) = stream.split();

        write_frame(&mut writer, &frame_bytes).await?;

        let reply_bytes = read_frame(&mut reader)
            .await?
            .ok_or_else(|| CallError::transport("connection closed before reply"))?;

        let reply: ReplyFrame = serde_json::from_slice(&reply_bytes)
            .map_err(|e| CallError::transport(format!("malformed reply frame: {}", e)))?;

        // The stream is held for the whole round trip, so replies cannot
        // interleave; a mismatched id means the peer broke the one-reply-
        // per-call contract.
        if reply.id != id && reply.id != IpcConfig::RESERVED_CALL_ID {
            return Err(CallError::transport(format!(
                "reply id {} does not match call id {}",
                reply.id, id
            )));
        }

        reply.into_result()
    }
}
