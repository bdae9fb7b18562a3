//! Relay Integration Tests
//!
//! Each test boots the real axum app on an ephemeral port and drives it
//! over WebSocket. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test relay_tests

use std::time::Duration;

use integration_tests::{assert_json, roster_names, TestServer, WsClient};
use reqwest::StatusCode;
use serde_json::json;
use tokio_tungstenite::tungstenite::{self, Message};

const QUIET: Duration = Duration::from_millis(300);

// ============================================================================
// HTTP Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_stats_counts_connections_and_users() {
    let server = TestServer::start().await.expect("Failed to start server");
    let _anon = WsClient::connect_registered(&server).await.unwrap();
    let mut alice = WsClient::connect_registered(&server).await.unwrap();
    alice.claim_name("Alice").await.unwrap();

    let response = server.get("/stats").await.unwrap();
    let stats = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats, json!({"connections": 2, "users": 1}));
}

// ============================================================================
// Chat Session
// ============================================================================

#[tokio::test]
async fn test_full_chat_session() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut alice = WsClient::connect_registered(&server).await.unwrap();
    let mut bob = WsClient::connect_registered(&server).await.unwrap();

    // Alice claims a name; both see the roster
    alice.set_name("  Alice ").await.unwrap();
    let reply = alice.expect_event("name set").await.unwrap();
    assert_eq!(reply["data"], json!({"success": true, "name": "Alice"}));
    let roster = alice.expect_event("users list").await.unwrap();
    assert_eq!(roster_names(&roster), vec!["Alice"]);
    let roster = bob.expect_event("users list").await.unwrap();
    assert_eq!(roster_names(&roster), vec!["Alice"]);

    // Case-insensitive duplicate is refused
    bob.set_name("ALICE").await.unwrap();
    let error = bob.expect_event("error").await.unwrap();
    assert_eq!(error["data"]["message"], "name already taken");

    let roster = bob.claim_name("Bob").await.unwrap();
    assert_eq!(roster_names(&roster), vec!["Alice", "Bob"]);
    let roster = alice.expect_event("users list").await.unwrap();
    assert_eq!(roster_names(&roster), vec!["Alice", "Bob"]);

    // Chat reaches both, sender included
    alice.chat("hello").await.unwrap();
    for client in [&mut alice, &mut bob] {
        let event = client.expect_event("chat message").await.unwrap();
        assert_eq!(event["data"]["userName"], "Alice");
        assert_eq!(event["data"]["userMessage"], "hello");
        assert!(event["data"]["timestamp"].is_i64());
        assert!(event["data"]["userId"].is_string());
    }

    // Typing reaches only the others, state follows the message type
    alice
        .send_envelope("typing", json!({"isTyping": true}))
        .await
        .unwrap();
    let typing = bob.expect_event("user typing").await.unwrap();
    assert_eq!(typing["data"], json!({"isTyping": true, "userName": "Alice"}));

    alice
        .send_envelope("stop typing", json!({"isTyping": true}))
        .await
        .unwrap();
    let typing = bob.expect_event("user typing").await.unwrap();
    assert_eq!(typing["data"]["isTyping"], false);
    alice.expect_silence(QUIET).await.unwrap();

    // Alice leaves; Bob sees the shrunken roster
    alice.close().await.unwrap();
    let roster = bob.expect_event("users list").await.unwrap();
    assert_eq!(roster_names(&roster), vec!["Bob"]);
}

#[tokio::test]
async fn test_chat_before_naming() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut watcher = WsClient::connect_registered(&server).await.unwrap();
    let mut anon = WsClient::connect_registered(&server).await.unwrap();

    anon.chat("hi").await.unwrap();
    let error = anon.expect_event("error").await.unwrap();
    assert_eq!(error["data"]["message"], "please set your name first");

    watcher.expect_silence(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_invalid_frames_keep_connection_open() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = WsClient::connect_registered(&server).await.unwrap();

    client
        .send_message(Message::Text("not json".to_string()))
        .await
        .unwrap();
    let error = client.expect_event("error").await.unwrap();
    assert_eq!(error["data"]["message"], "invalid message format");
    assert!(error["data"]["details"].is_string());

    client
        .send_envelope("bogus", json!({}))
        .await
        .unwrap();
    let error = client.expect_event("error").await.unwrap();
    assert_eq!(error["data"]["message"], "unknown message type");
    assert_eq!(error["data"]["details"], "bogus");

    // Still usable afterwards
    client.claim_name("Resilient").await.unwrap();
}

#[tokio::test]
async fn test_binary_frames_are_decoded() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut client = WsClient::connect_registered(&server).await.unwrap();

    let envelope = json!({"type": "set name", "data": {"name": "Bin"}});
    client
        .send_message(Message::Binary(envelope.to_string().into_bytes()))
        .await
        .unwrap();

    let reply = client.expect_event("name set").await.unwrap();
    assert_eq!(reply["data"]["name"], "Bin");
}

// ============================================================================
// Disconnects
// ============================================================================

#[tokio::test]
async fn test_name_released_on_disconnect() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut watcher = WsClient::connect_registered(&server).await.unwrap();
    let mut alice = WsClient::connect_registered(&server).await.unwrap();

    alice.claim_name("Alice").await.unwrap();
    watcher.expect_event("users list").await.unwrap();

    alice.close().await.unwrap();
    let roster = watcher.expect_event("users list").await.unwrap();
    assert!(roster_names(&roster).is_empty());

    let mut newcomer = WsClient::connect_registered(&server).await.unwrap();
    let roster = newcomer.claim_name("alice").await.unwrap();
    assert_eq!(roster_names(&roster), vec!["alice"]);
}

#[tokio::test]
async fn test_unnamed_disconnect_is_silent() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut watcher = WsClient::connect_registered(&server).await.unwrap();
    let anon = WsClient::connect_registered(&server).await.unwrap();

    anon.close().await.unwrap();
    watcher.expect_silence(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_oversized_frame_closes_with_1009() {
    let server = TestServer::start_with(&[("MAX_MESSAGE_BYTES", "64")])
        .await
        .expect("Failed to start server");
    let mut client = WsClient::connect_registered(&server).await.unwrap();

    let long_name = "x".repeat(100);
    client.set_name(&long_name).await.unwrap();

    assert_eq!(client.expect_close().await.unwrap(), Some(1009));
}

#[tokio::test]
async fn test_silent_client_times_out() {
    let server = TestServer::start_with(&[
        ("HEARTBEAT_INTERVAL_MS", "100"),
        ("HEARTBEAT_TIMEOUT_MS", "300"),
    ])
    .await
    .expect("Failed to start server");
    let mut client = WsClient::connect_registered(&server).await.unwrap();

    // Not reading means no pongs go back
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert_eq!(client.expect_close().await.unwrap(), Some(4000));
}

#[tokio::test]
async fn test_connection_limit_refuses_upgrade() {
    let server = TestServer::start_with(&[("MAX_CONNECTIONS", "1")])
        .await
        .expect("Failed to start server");
    let _first = WsClient::connect_registered(&server).await.unwrap();

    match tokio_tungstenite::connect_async(server.ws_url()).await {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("upgrade should have been refused"),
    }
}

#[tokio::test]
async fn test_shutdown_sends_going_away() {
    let mut server = TestServer::start().await.expect("Failed to start server");
    let mut alice = WsClient::connect_registered(&server).await.unwrap();
    alice.claim_name("Alice").await.unwrap();

    server.begin_shutdown();

    assert_eq!(alice.expect_close().await.unwrap(), Some(1001));
    server.shutdown().await.unwrap();
}
