//! End-to-end example: a compositor interface served over the bundled IPC
//! transport and called through a generated-stub shaped client.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use parley_core::ipc::{IpcClient, IpcServer};
use parley_core::{
    CallError, CallResult, ClientProxy, Dispatcher, InterfaceDescriptor, Invoke, MethodDescriptor,
    Param, Router,
};

// Constants a stub generator would emit for:
//
//   Compositor {
//       createWindow(size: Vec2f) -> Res<Window>,
//   }
const COMPOSITOR_UID: u64 = 0x9763fd6ae0868ca0;
const CREATE_WINDOW_UID: u64 = 0x7110f2964d70557a;
const CREATE_WINDOW_PARAMS: &[Param] = &[Param {
    name: "size",
    ty: "Vec2f",
}];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Vec2f {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Window {
    handle: u64,
    size: Vec2f,
}

fn compositor_descriptor() -> Arc<InterfaceDescriptor> {
    Arc::new(
        InterfaceDescriptor::new(
            COMPOSITOR_UID,
            "Compositor",
            vec![MethodDescriptor::new(
                CREATE_WINDOW_UID,
                "createWindow",
                CREATE_WINDOW_PARAMS,
                "Window",
            )],
        )
        .expect("BUG: duplicate uid in generated interface")
    )
}

/// The concrete implementation the dispatcher routes into.
struct Compositor {
    next_handle: AtomicU64,
    open_windows: AtomicUsize,
    max_windows: usize,
}

impl Compositor {
    fn create_window(&self, size: Vec2f) -> CallResult<Window> {
        if self.open_windows.load(Ordering::SeqCst) >= self.max_windows {
            return Err(CallError::application("window limit reached"));
        }
        self.open_windows.fetch_add(1, Ordering::SeqCst);
        Ok(Window {
            handle: self.next_handle.fetch_add(1, Ordering::SeqCst),
            size,
        })
    }
}

/// The client stub a generator would emit.
struct CompositorClient<T: Invoke> {
    proxy: ClientProxy<T>,
}

impl<T: Invoke> CompositorClient<T> {
    fn new(transport: T) -> Self {
        Self {
            proxy: ClientProxy::new(compositor_descriptor(), transport),
        }
    }

    async fn create_window(&self, size: Vec2f) -> CallResult<Window> {
        self.proxy.call(CREATE_WINDOW_UID, &size).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .compact()
        .init();

    // Server side: bind the implementation and mount it.
    let implementation = Arc::new(Compositor {
        next_handle: AtomicU64::new(1),
        open_windows: AtomicUsize::new(0),
        max_windows: 2,
    });

    let mut dispatcher = Dispatcher::new(compositor_descriptor());
    dispatcher.bind(
        CREATE_WINDOW_UID,
        |imp: Arc<Compositor>, size: Vec2f| async move { imp.create_window(size) },
    )?;

    let mut router = Router::new();
    router.mount(dispatcher, implementation)?;

    let mut server = IpcServer::start(Arc::new(router)).await?;
    println!("compositor served on {}", server.addr());

    // Client side: connect and call through the stub.
    let transport = IpcClient::connect(server.addr()).await?;
    let compositor = CompositorClient::new(transport);

    for _ in 0..3 {
        match compositor.create_window(Vec2f { x: 800.0, y: 600.0 }).await {
            Ok(window) => println!(
                "created window {} at {}x{}",
                window.handle, window.size.x, window.size.y
            ),
            Err(e) => println!("createWindow failed ({}): {}", e.kind(), e),
        }
    }

    server.shutdown();
    Ok(())
}
