//! TCP server side of the bundled transport.
//!
//! Listens on `127.0.0.1:0` (OS-assigned port), accepts connections, and
//! feeds each incoming call frame to the [`Route`] capability. The returned
//! outcome becomes the reply frame: success carries the result value, any
//! failure carries the serialized error, so the two delivery paths of a
//! dispatch collapse into one write.
//!
//! # Thread Safety
//!
//! The server runs on the tokio runtime. Each connection is handled in its
//! own spawned task; the router is shared via `Arc` and must be safe for
//! concurrent routing (descriptors are immutable, so a `Router` always is).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use super::protocol::{read_frame, write_frame, CallFrame, ReplyFrame};
use crate::config::IpcConfig;
use crate::dispatch::Route;
use crate::error::{CallError, CallResult};

/// Handle to a running IPC server. Dropping shuts down the server.
pub struct IpcServerHandle {
    pub addr: SocketAddr,
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    conn_shutdown_tx: watch::Sender<bool>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl IpcServerHandle {
    /// Get the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shut down the server gracefully.
    ///
    /// Stops accepting new connections and signals all active connection
    /// handlers to close.
    pub fn shutdown(&mut self) {
        // Signal accept loop to stop
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Signal all connection handlers to close
        let _ = self.conn_shutdown_tx.send(true);
    }
}

impl Drop for IpcServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// IPC server that listens for client connections.
pub struct IpcServer;

impl IpcServer {
    /// Start the server on a random local port.
    ///
    /// Returns a handle that can be used to get the port and shut down the
    /// server. The server runs in background tokio tasks.
    pub async fn start<R: Route + 'static>(router: Arc<R>) -> CallResult<IpcServerHandle> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let port = addr.port();

        info!("IPC server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (conn_shutdown_tx, conn_shutdown_rx) = watch::channel(false);
        let active_connections = Arc::new(AtomicUsize::new(0));

        let task_handle = tokio::spawn(Self::accept_loop(
            listener,
            router,
            shutdown_rx,
            conn_shutdown_rx,
            active_connections,
        ));

        Ok(IpcServerHandle {
            addr,
            port,
            shutdown_tx: Some(shutdown_tx),
            conn_shutdown_tx,
            task_handle: Some(task_handle),
        })
    }

    async fn accept_loop<R: Route + 'static>(
        listener: TcpListener,
        router: Arc<R>,
        mut shutdown_rx: oneshot::Receiver<()>,
        conn_shutdown_rx: watch::Receiver<bool>,
        active_connections: Arc<AtomicUsize>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("IPC server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            let current = active_connections.load(Ordering::Relaxed);
                            if current >= IpcConfig::MAX_CONNECTIONS {
                                warn!(
                                    "Rejecting IPC connection from {}: at max capacity ({})",
                                    peer_addr,
                                    IpcConfig::MAX_CONNECTIONS
                                );
                                continue;
                            }

                            active_connections.fetch_add(1, Ordering::Relaxed);
                            let router = router.clone();
                            let conns = active_connections.clone();
                            let mut conn_shutdown = conn_shutdown_rx.clone();

                            tokio::spawn(async move {
                                debug!("IPC connection from {}", peer_addr);
                                if let Err(e) = Self::handle_connection(stream, &*router, &mut conn_shutdown).await {
                                    debug!("IPC connection {} ended: {}", peer_addr, e);
                                }
                                conns.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!("IPC accept error: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection<R: Route>(
        mut stream: TcpStream,
        router: &R,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> CallResult<()> {
        let (mut reader, mut writer) = stream.split();

        loop {
            // Wait for either a frame or a shutdown signal
            let frame = tokio::select! {
                result = read_frame(&mut reader) => {
                    match result? {
                        Some(f) => f,
                        None => return Ok(()), // Clean disconnect
                    }
                }
                _ = shutdown_rx.changed() => {
                    return Ok(()); // Server shutting down
                }
            };

            let reply = Self::process_frame(&frame, router).await;

            let reply_bytes = serde_json::to_vec(&reply)
                .map_err(|e| CallError::transport(format!("encoding reply frame: {}", e)))?;
            write_frame(&mut writer, &reply_bytes).await?;
        }
    }

    /// Turn one call frame into one reply frame. Malformed frames are
    /// answered (under the reserved call id), not dropped.
    async fn process_frame<R: Route>(bytes: &[u8], router: &R) -> ReplyFrame {
        let frame: CallFrame = match serde_json::from_slice(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                return ReplyFrame::failure(
                    IpcConfig::RESERVED_CALL_ID,
                    CallError::decode(format!("malformed call frame: {}", e)),
                );
            }
        };

        let id = frame.id;
        let envelope = frame.into_envelope();

        match router.route(&envelope).await {
            Ok(result) => ReplyFrame::success(id, result),
            Err(err) => {
                debug!("call {} failed ({}): {}", id, err.kind(), err);
                ReplyFrame::failure(id, err)
            }
        }
    }
}
