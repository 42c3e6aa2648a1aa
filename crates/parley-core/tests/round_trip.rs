//! End-to-end round trips through a generated-stub shaped client and a real
//! TCP server: typed call in, typed reply out, failures crossing the wire
//! unmodified.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use parley_core::ipc::{IpcClient, IpcServer, IpcServerHandle};
use parley_core::{
    CallError, CallResult, ClientProxy, Dispatcher, InterfaceDescriptor, InterfaceUid, Invoke,
    MethodDescriptor, MethodUid, Param, Router,
};

const COMPOSITOR_UID: InterfaceUid = 0x9763fd6ae0868ca0;
const CREATE_WINDOW_UID: MethodUid = 0x7110f2964d70557a;
const RESIZE_WINDOW_UID: MethodUid = 0x5a3b9c02e44d18f7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Vec2f {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Window {
    handle: u64,
    size: Vec2f,
}

fn compositor_descriptor() -> Arc<InterfaceDescriptor> {
    const CREATE_PARAMS: &[Param] = &[Param {
        name: "size",
        ty: "Vec2f",
    }];
    const RESIZE_PARAMS: &[Param] = &[
        Param {
            name: "handle",
            ty: "u64",
        },
        Param {
            name: "size",
            ty: "Vec2f",
        },
    ];

    Arc::new(
        InterfaceDescriptor::new(
            COMPOSITOR_UID,
            "Compositor",
            vec![
                MethodDescriptor::new(CREATE_WINDOW_UID, "createWindow", CREATE_PARAMS, "Window"),
                MethodDescriptor::new(RESIZE_WINDOW_UID, "resizeWindow", RESIZE_PARAMS, "Vec2f"),
            ],
        )
        .expect("compositor uids are distinct"),
    )
}

/// Server-side implementation with observable call counts.
struct TestCompositor {
    next_handle: AtomicU64,
    created: AtomicUsize,
    resized: AtomicUsize,
    max_windows: usize,
}

impl TestCompositor {
    fn new(max_windows: usize) -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            created: AtomicUsize::new(0),
            resized: AtomicUsize::new(0),
            max_windows,
        }
    }
}

/// What a generated client stub looks like: one method per declared
/// operation, each a thin wrapper over `ClientProxy::call`.
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

    async fn resize_window(&self, handle: u64, size: Vec2f) -> CallResult<Vec2f> {
        self.proxy.call(RESIZE_WINDOW_UID, &(handle, size)).await
    }
}

async fn start_compositor(
    max_windows: usize,
) -> (IpcServerHandle, IpcClient, Arc<TestCompositor>) {
    let implementation = Arc::new(TestCompositor::new(max_windows));

    let mut dispatcher = Dispatcher::new(compositor_descriptor());
    dispatcher
        .bind(
            CREATE_WINDOW_UID,
            |imp: Arc<TestCompositor>, size: Vec2f| async move {
                if imp.created.load(Ordering::SeqCst) >= imp.max_windows {
                    return Err(CallError::application("window limit reached"));
                }
                imp.created.fetch_add(1, Ordering::SeqCst);
                let handle = imp.next_handle.fetch_add(1, Ordering::SeqCst);
                Ok(Window { handle, size })
            },
        )
        .expect("createWindow is declared");
    dispatcher
        .bind(
            RESIZE_WINDOW_UID,
            |imp: Arc<TestCompositor>, (_handle, size): (u64, Vec2f)| async move {
                imp.resized.fetch_add(1, Ordering::SeqCst);
                Ok(size)
            },
        )
        .expect("resizeWindow is declared");

    let mut router = Router::new();
    router
        .mount(dispatcher, implementation.clone())
        .expect("compositor is the only mounted interface");

    let handle = IpcServer::start(Arc::new(router))
        .await
        .expect("server starts on a free port");
    let client = IpcClient::connect(handle.addr())
        .await
        .expect("client connects to fresh server");

    (handle, client, implementation)
}

#[tokio::test]
async fn test_create_window_round_trip() {
    let (mut server, client, implementation) = start_compositor(8).await;
    let compositor = CompositorClient::new(client);

    let window = compositor
        .create_window(Vec2f { x: 800.0, y: 600.0 })
        .await
        .unwrap();

    assert_eq!(window.size, Vec2f { x: 800.0, y: 600.0 });
    assert_eq!(window.handle, 1);
    assert_eq!(implementation.created.load(Ordering::SeqCst), 1);
    assert_eq!(implementation.resized.load(Ordering::SeqCst), 0);

    server.shutdown();
}

#[tokio::test]
async fn test_compound_arguments_survive_the_round_trip() {
    let (mut server, client, _implementation) = start_compositor(8).await;
    let compositor = CompositorClient::new(client);

    let window = compositor
        .create_window(Vec2f { x: 320.0, y: 240.0 })
        .await
        .unwrap();
    let size = compositor
        .resize_window(window.handle, Vec2f { x: 1024.0, y: 768.0 })
        .await
        .unwrap();

    assert_eq!(size, Vec2f { x: 1024.0, y: 768.0 });

    server.shutdown();
}

#[tokio::test]
async fn test_unknown_method_never_reaches_the_implementation() {
    let (mut server, client, implementation) = start_compositor(8).await;

    let err = client
        .invoke(COMPOSITOR_UID, 0xdeadbeef, serde_json::json!({}))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CallError::UnknownMethod {
            interface: COMPOSITOR_UID,
            method: 0xdeadbeef,
        }
    );
    assert_eq!(implementation.created.load(Ordering::SeqCst), 0);
    assert_eq!(implementation.resized.load(Ordering::SeqCst), 0);

    server.shutdown();
}

#[tokio::test]
async fn test_unknown_interface_never_reaches_the_implementation() {
    let (mut server, client, implementation) = start_compositor(8).await;

    let err = client
        .invoke(0x1111, CREATE_WINDOW_UID, serde_json::json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, CallError::UnknownInterface { interface: 0x1111 });
    assert_eq!(implementation.created.load(Ordering::SeqCst), 0);

    server.shutdown();
}

#[tokio::test]
async fn test_application_failure_reaches_the_caller_unmodified() {
    let (mut server, client, implementation) = start_compositor(1).await;
    let compositor = CompositorClient::new(client);

    compositor
        .create_window(Vec2f { x: 100.0, y: 100.0 })
        .await
        .unwrap();
    let err = compositor
        .create_window(Vec2f { x: 100.0, y: 100.0 })
        .await
        .unwrap_err();

    // The caller sees the implementation's failure, not a transport error.
    assert_eq!(err, CallError::application("window limit reached"));
    assert_eq!(implementation.created.load(Ordering::SeqCst), 1);

    server.shutdown();
}

#[tokio::test]
async fn test_malformed_arguments_are_a_decode_failure() {
    let (mut server, client, implementation) = start_compositor(8).await;

    // Well-formed envelope, wrong shape for createWindow's Vec2f.
    let err = client
        .invoke(
            COMPOSITOR_UID,
            CREATE_WINDOW_UID,
            serde_json::json!("definitely not a size"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "decode");
    assert_eq!(implementation.created.load(Ordering::SeqCst), 0);

    server.shutdown();
}
