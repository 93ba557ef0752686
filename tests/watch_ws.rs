//! End-to-end tests against a live server: REST over reqwest, the watch
//! stream over tokio-tungstenite.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use lvmd::api::build_app;
use lvmd::app_state::AppState;
use lvmd::domain::{DeviceClass, DeviceClassRegistry};
use lvmd::driver::InMemoryDriver;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const GIB: u64 = 1 << 30;

async fn spawn_server() -> (SocketAddr, AppState) {
    let registry = assert_ok!(DeviceClassRegistry::new(vec![
        DeviceClass::new("ssd", "vg-ssd").with_spare_gb(1).as_default(),
    ]));
    let driver = InMemoryDriver::new().with_pool("vg-ssd", 10 * GIB);
    let state = AppState::new(registry, Arc::new(driver), CancellationToken::new());
    let app = build_app(state.clone(), Duration::from_secs(5));

    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    tokio::spawn(async move { axum::serve(listener, app).await });
    (addr, state)
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = assert_ok!(connect_async(format!("ws://{addr}/api/v1/watch")).await);
    ws
}

/// Waits for the next text frame and parses it.
async fn next_event(ws: &mut WsClient) -> Value {
    let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await else {
        panic!("expected a watch event");
    };
    let text = assert_ok!(msg.to_text());
    assert_ok!(serde_json::from_str(text))
}

/// Asserts nothing arrives within a short window.
async fn assert_quiet(ws: &mut WsClient) {
    let waited = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(waited.is_err(), "unexpected frame: {waited:?}");
}

async fn wait_for_subscribers(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.broker.subscriber_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "subscriber count stuck at {}, expected {expected}",
        state.broker.subscriber_count()
    );
}

#[tokio::test]
async fn watch_sends_initial_then_change_events() {
    let (addr, state) = spawn_server().await;
    let mut ws = connect(addr).await;

    let initial = next_event(&mut ws).await;
    assert_eq!(initial.get("sequence"), Some(&json!(0)));
    assert_eq!(initial.get("payload"), Some(&json!({})));
    assert_quiet(&mut ws).await;
    wait_for_subscribers(&state, 1).await;

    let client = reqwest::Client::new();
    let created = assert_ok!(
        client
            .post(format!("http://{addr}/api/v1/volumes"))
            .json(&json!({"name": "v1", "size_bytes": GIB, "tags": ["a"]}))
            .send()
            .await
    );
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);

    let change = next_event(&mut ws).await;
    assert_eq!(change.get("sequence"), Some(&json!(1)));

    let listed: Value = assert_ok!(
        assert_ok!(
            client
                .get(format!("http://{addr}/api/v1/volumes"))
                .send()
                .await
        )
        .json()
        .await
    );
    assert_eq!(listed.pointer("/volumes/0/name"), Some(&json!("v1")));
    assert_eq!(listed.pointer("/volumes/0/size_gb"), Some(&json!(1)));

    let free: Value = assert_ok!(
        assert_ok!(
            client
                .get(format!("http://{addr}/api/v1/free-bytes"))
                .send()
                .await
        )
        .json()
        .await
    );
    assert_eq!(free.pointer("/free_bytes"), Some(&json!(8 * GIB)));
}

#[tokio::test]
async fn every_watcher_sees_each_change() {
    let (addr, state) = spawn_server().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    next_event(&mut first).await;
    next_event(&mut second).await;
    wait_for_subscribers(&state, 2).await;

    assert_ok!(state.volumes.create_volume("", "v1", GIB, &[]).await);

    assert_eq!(next_event(&mut first).await.get("sequence"), Some(&json!(1)));
    assert_eq!(next_event(&mut second).await.get("sequence"), Some(&json!(1)));
}

#[tokio::test]
async fn closing_the_socket_ends_the_subscription() {
    let (addr, state) = spawn_server().await;
    let mut ws = connect(addr).await;
    next_event(&mut ws).await;
    wait_for_subscribers(&state, 1).await;

    assert_ok!(ws.close(None).await);
    wait_for_subscribers(&state, 0).await;

    // Signalling with no watchers is harmless.
    state.broker.signal();
}

#[tokio::test]
async fn shutdown_closes_watchers() {
    let (addr, state) = spawn_server().await;
    let mut ws = connect(addr).await;
    next_event(&mut ws).await;
    wait_for_subscribers(&state, 1).await;

    state.shutdown.cancel();

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "connection should close on shutdown");
    wait_for_subscribers(&state, 0).await;
}
