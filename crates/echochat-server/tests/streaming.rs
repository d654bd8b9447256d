//! End-to-end tests: a real server on an ephemeral port, driven over HTTP.

use echochat_core::{ChatConsumer, ChatError, ChatRole, HttpTransport, StreamEvent};
use echochat_server::{api::AppState, config::ServerConfig, router};
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct TestServer {
    base_url: String,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn spawn_server(chunk_delay: Duration, max_message_chars: usize) -> TestServer {
    let config = ServerConfig {
        chunk_delay,
        max_message_chars,
        ..ServerConfig::default()
    };
    let shutdown = CancellationToken::new();
    let app = router(AppState::new(&config, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
            .expect("server");
    });

    TestServer {
        base_url: format!("http://{}", addr),
        shutdown,
    }
}

fn consumer_for(server: &TestServer) -> ChatConsumer<HttpTransport> {
    ChatConsumer::new(HttpTransport::new(server.base_url.clone()).expect("http client"))
}

#[tokio::test]
async fn consumer_reassembles_streamed_echo() {
    let server = spawn_server(Duration::from_millis(5), 0).await;
    let mut consumer = consumer_for(&server);
    let mut partials = Vec::new();

    let reply = consumer
        .submit("héllo 🦀", &CancellationToken::new(), |event| {
            if let StreamEvent::Chunk { partial, .. } = event {
                partials.push(partial);
            }
        })
        .await
        .expect("reply");

    assert_eq!(reply.content(), "héllo 🦀");
    assert_eq!(reply.role(), ChatRole::Assistant);
    assert_eq!(partials.last().map(String::as_str), Some("héllo 🦀"));
    for partial in &partials {
        assert!("héllo 🦀".starts_with(partial.as_str()));
    }
}

#[tokio::test]
async fn empty_message_finalizes_empty_reply() {
    let server = spawn_server(Duration::from_millis(5), 0).await;
    let mut consumer = consumer_for(&server);

    let reply = consumer
        .submit("", &CancellationToken::new(), |_| {})
        .await
        .expect("reply");

    assert_eq!(reply.content(), "");
    assert_eq!(consumer.history().replies().count(), 1);
}

#[tokio::test]
async fn sequential_submissions_keep_order() {
    let server = spawn_server(Duration::from_millis(2), 0).await;
    let mut consumer = consumer_for(&server);
    let cancel = CancellationToken::new();

    consumer.submit("one", &cancel, |_| {}).await.expect("first");
    consumer.submit("two", &cancel, |_| {}).await.expect("second");

    let replies: Vec<_> = consumer
        .history()
        .replies()
        .map(|message| message.content().to_string())
        .collect();
    assert_eq!(replies, vec!["one", "two"]);
}

#[tokio::test]
async fn raw_chunks_arrive_in_character_order() {
    let server = spawn_server(Duration::from_millis(20), 0).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", server.base_url))
        .json(&serde_json::json!({ "message": "abc" }))
        .send()
        .await
        .expect("response");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut received = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        received.extend_from_slice(&chunk.expect("chunk"));
    }
    assert_eq!(received, b"abc");
}

#[tokio::test]
async fn oversized_message_surfaces_invalid_input() {
    let server = spawn_server(Duration::from_millis(1), 4).await;
    let mut consumer = consumer_for(&server);

    let result = consumer
        .submit("too long", &CancellationToken::new(), |_| {})
        .await;

    match result {
        Err(ChatError::InvalidInput(message)) => assert!(message.contains("limit is 4")),
        other => panic!("expected invalid input, got {:?}", other.map(|m| m.content().to_string())),
    }
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let server = spawn_server(Duration::from_millis(1), 0).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", server.base_url))
        .header("content-type", "application/json")
        .body(r#"{"message": 5}"#)
        .send()
        .await
        .expect("response");

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn abandoning_a_request_cancels_the_reply() {
    let server = spawn_server(Duration::from_millis(50), 0).await;
    let mut consumer = consumer_for(&server);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let result = consumer
        .submit("a long reply", &cancel, |event| {
            if matches!(event, StreamEvent::Chunk { .. }) {
                trigger.cancel();
            }
        })
        .await;

    assert!(matches!(result, Err(ChatError::Cancelled)));
    assert_eq!(consumer.history().replies().count(), 0);

    // The server keeps serving after the client went away.
    let reply = consumer
        .submit("ok", &CancellationToken::new(), |_| {})
        .await
        .expect("reply after abandon");
    assert_eq!(reply.content(), "ok");
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut consumer =
        ChatConsumer::new(HttpTransport::new(format!("http://{}", addr)).expect("client"));
    let result = consumer.submit("hi", &CancellationToken::new(), |_| {}).await;

    assert!(matches!(result, Err(ChatError::Http(_))));
}
