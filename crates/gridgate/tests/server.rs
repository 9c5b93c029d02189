//! End-to-end tests: a real server on a random port, real WebSocket clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gridgate::prelude::*;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server seeded with Jane Doe and returns its address.
async fn start_server(config: LoginConfig) -> String {
    let store = Arc::new(MemoryIdentityStore::new());
    store.insert(Identity::new("Jane", "Doe", "secret"));
    let grants = GrantBuilder::new(Arc::new(MemoryInventory::new()), Arc::new(MemoryFriends::new()));

    let server = GridgateServer::builder()
        .bind("127.0.0.1:0")
        .login_config(config)
        .build(store, CredentialAuthenticator, grants)
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr").to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn exchange(ws: &mut ClientWs, request: Value) -> Value {
    ws.send(Message::Text(request.to_string().into()))
        .await
        .expect("send should succeed");
    let reply = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("reply should arrive")
        .expect("stream should stay open")
        .expect("reply should be a message");
    serde_json::from_slice(&reply.into_data()).expect("reply should be JSON")
}

fn jane() -> Value {
    json!({"first": "Jane", "last": "Doe", "passwd": "secret", "version": "viewer 1.0"})
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_login_over_websocket_is_granted() {
    let addr = start_server(LoginConfig::default()).await;
    let mut ws = connect(&addr).await;

    let reply = exchange(&mut ws, jane()).await;

    assert_eq!(reply["login"], "true");
    assert_eq!(reply["first_name"], "Jane");
}

#[tokio::test]
async fn test_retry_on_same_connection_after_conflict() {
    let addr = start_server(LoginConfig::default()).await;
    let mut first = connect(&addr).await;
    let mut second = connect(&addr).await;

    assert_eq!(exchange(&mut first, jane()).await["login"], "true");

    let conflict = exchange(&mut second, jane()).await;
    assert_eq!(conflict["kind"], "already_logged_in");

    let retry = exchange(&mut second, jane()).await;
    assert_eq!(retry["login"], "true");
}

#[tokio::test]
async fn test_structured_request_over_websocket() {
    let addr = start_server(LoginConfig::default()).await;
    let mut ws = connect(&addr).await;

    let reply = exchange(&mut ws, json!({"map": jane()})).await;

    assert_eq!(reply["map"]["login"], "true");
}

#[tokio::test]
async fn test_malformed_request_over_websocket() {
    let addr = start_server(LoginConfig::default()).await;
    let mut ws = connect(&addr).await;

    let reply = exchange(&mut ws, json!({"last": "Doe", "passwd": "secret"})).await;

    assert_eq!(reply["kind"], "malformed_request");
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_server(LoginConfig::default().request_timeout(Duration::from_millis(100))).await;
    let mut ws = connect(&addr).await;

    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("server should close the idle connection");

    assert!(
        matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))),
        "expected close, got {next:?}"
    );
}

#[tokio::test]
async fn test_stalled_handshake_does_not_block_other_clients() {
    let addr = start_server(LoginConfig::default()).await;

    // Connects but never sends the WebSocket upgrade.
    let _silent = tokio::net::TcpStream::connect(&addr).await.expect("tcp connect");

    let reply = tokio::time::timeout(Duration::from_secs(2), async {
        let mut ws = connect(&addr).await;
        exchange(&mut ws, jane()).await
    })
    .await
    .expect("a stalled client must not delay other logins");

    assert_eq!(reply["login"], "true");
}
