//! End-to-end tests against a local websocket server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::Message;

use realtime_client::{
    BlockingDialer, BlockingOptions, CallbackHandler, Client, ClientConfig, ConnHandler,
    ConnectOptions, Context, EventHandler, RealtimeError, TungsteniteDialer, TungsteniteOptions,
};
use realtime_protocol::{ClientEvent, ResponseCreateParams, ServerEvent};

const TOKEN: &str = "test-token";
const TIMEOUT: Duration = Duration::from_secs(5);

type ServerStream = WebSocketStream<TcpStream>;

fn check_auth(req: &Request, resp: Response) -> Result<Response, ErrorResponse> {
    match req.headers().get("authorization") {
        Some(value) if value == "Bearer test-token" => Ok(resp),
        _ => {
            let mut err = ErrorResponse::new(Some("unauthorized".into()));
            *err.status_mut() = StatusCode::UNAUTHORIZED;
            Err(err)
        }
    }
}

/// Accept one connection and hand it to `script`; returns the base URL
async fn serve_once<F, Fut>(script: F) -> String
where
    F: FnOnce(ServerStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        if let Ok(ws) = accept_hdr_async(stream, check_auth).await {
            script(ws).await;
        }
    });
    format!("ws://{}/v1/realtime", addr)
}

fn client_for(url: &str, token: &str) -> Client {
    let mut config = ClientConfig::new(token);
    config.base_url = url.to_string();
    Client::with_config(config)
}

fn text(s: &str) -> Message {
    Message::Text(s.to_string().into())
}

/// Reply to every text message with an output text delta echoing its type
async fn echo_type(mut ws: ServerStream, received: Arc<Mutex<Vec<String>>>) {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(body) = message {
            let body = body.to_string();
            let value: serde_json::Value = serde_json::from_str(&body).unwrap();
            received.lock().push(body);
            let reply = serde_json::json!({
                "type": "response.output_text.delta",
                "delta": value["type"],
            });
            if ws.send(text(&reply.to_string())).await.is_err() {
                break;
            }
        }
    }
}

async fn round_trip(options: ConnectOptions) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let server_received = Arc::clone(&received);
    let url = serve_once(move |ws| echo_type(ws, server_received)).await;

    let ctx = Context::background();
    let conn = client_for(&url, TOKEN).connect(&ctx, options).await.unwrap();
    assert_eq!(conn.response().unwrap().status, 101);

    conn.send_message(&ctx, &ClientEvent::response_create(ResponseCreateParams::default()))
        .await
        .unwrap();
    let event = timeout(TIMEOUT, conn.read_message(&ctx)).await.unwrap().unwrap();

    match event {
        ServerEvent::ResponseOutputTextDelta(e) => assert_eq!(e.delta, "response.create"),
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        *received.lock(),
        vec![r#"{"type":"response.create","response":{}}"#.to_string()]
    );

    conn.ping(&ctx).await.unwrap();
    conn.close().await.unwrap();
    conn.close().await.unwrap();
}

// ==================== Round Trip Tests ====================

#[tokio::test]
async fn test_async_round_trip() {
    round_trip(ConnectOptions::new().dialer(TungsteniteDialer::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_round_trip() {
    round_trip(ConnectOptions::new().dialer(BlockingDialer::new())).await;
}

// ==================== Dial Tests ====================

#[tokio::test]
async fn test_rejected_handshake_is_dial_error() {
    let url = serve_once(|_ws| async {}).await;
    let result = client_for(&url, "wrong-token")
        .connect(&Context::background(), ConnectOptions::new())
        .await;

    match result {
        Err(RealtimeError::Dial { url: dialed, .. }) => assert!(dialed.contains("model=")),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("handshake should have been rejected"),
    }
}

// ==================== Read Tests ====================

#[tokio::test]
async fn test_oversize_message_is_permanent() {
    let url = serve_once(|mut ws| async move {
        let big = format!(
            r#"{{"type":"response.output_text.delta","delta":"{}"}}"#,
            "x".repeat(4096)
        );
        let _ = ws.send(text(&big)).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    })
    .await;

    let dialer = TungsteniteDialer::with_options(TungsteniteOptions {
        read_limit: Some(1024),
        ..Default::default()
    });
    let ctx = Context::background();
    let conn = client_for(&url, TOKEN)
        .connect(&ctx, ConnectOptions::new().dialer(dialer))
        .await
        .unwrap();

    let err = timeout(TIMEOUT, conn.read_message(&ctx)).await.unwrap().unwrap_err();
    assert!(err.is_permanent());
    assert!(matches!(err.cause(), RealtimeError::MessageTooLarge { max: 1024, .. }));
}

#[tokio::test]
async fn test_binary_frame_is_transient() {
    let url = serve_once(|mut ws| async move {
        let _ = ws.send(Message::Binary(vec![1u8, 2, 3].into())).await;
        let _ = ws
            .send(text(r#"{"type":"input_audio_buffer.cleared","event_id":"event_1"}"#))
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    })
    .await;

    let ctx = Context::background();
    let conn = client_for(&url, TOKEN)
        .connect(&ctx, ConnectOptions::new())
        .await
        .unwrap();

    let err = conn.read_message_raw(&ctx).await.unwrap_err();
    assert!(err.is_transient());

    let event = conn.read_message(&ctx).await.unwrap();
    assert_eq!(event.event_id(), Some("event_1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_deadline_leaves_conn_usable() {
    let url = serve_once(|mut ws| async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        let _ = ws
            .send(text(r#"{"type":"input_audio_buffer.cleared"}"#))
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    })
    .await;

    let dialer = BlockingDialer::with_options(BlockingOptions {
        poll_interval: Duration::from_millis(20),
        ..Default::default()
    });
    let conn = client_for(&url, TOKEN)
        .connect(&Context::background(), ConnectOptions::new().dialer(dialer))
        .await
        .unwrap();

    let short = Context::background().with_timeout(Duration::from_millis(100));
    let err = conn.read_message(&short).await.unwrap_err();
    assert!(matches!(err, RealtimeError::DeadlineExceeded));
    assert!(err.is_transient());

    let event = timeout(TIMEOUT, conn.read_message(&Context::background()))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, ServerEvent::InputAudioBufferCleared(_)));
}

#[tokio::test]
async fn test_async_cancel_leaves_conn_usable() {
    let url = serve_once(|mut ws| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = ws
            .send(text(r#"{"type":"input_audio_buffer.cleared"}"#))
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    })
    .await;

    let conn = client_for(&url, TOKEN)
        .connect(&Context::background(), ConnectOptions::new())
        .await
        .unwrap();

    let ctx = Context::background();
    let reader = ctx.with_cancel();
    let cancel = reader.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });
    let err = conn.read_message(&reader).await.unwrap_err();
    assert!(matches!(err, RealtimeError::Cancelled));

    let event = timeout(TIMEOUT, conn.read_message(&ctx)).await.unwrap().unwrap();
    assert!(matches!(event, ServerEvent::InputAudioBufferCleared(_)));
}

// ==================== Handler Tests ====================

#[tokio::test]
async fn test_handler_until_server_closes() {
    let url = serve_once(|mut ws| async move {
        for delta in ["one", "two", "three"] {
            let body = format!(r#"{{"type":"response.output_text.delta","delta":"{}"}}"#, delta);
            let _ = ws.send(text(&body)).await;
        }
        let _ = ws.close(None).await;
    })
    .await;

    let ctx = Context::background();
    let conn = Arc::new(
        client_for(&url, TOKEN)
            .connect(&ctx, ConnectOptions::new())
            .await
            .unwrap(),
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let handler: Box<dyn EventHandler> = Box::new(CallbackHandler::new(move |_ctx, event| {
        if let ServerEvent::ResponseOutputTextDelta(e) = event {
            seen_clone.lock().push(e.delta.clone());
        }
    }));

    let running = ConnHandler::new(&ctx, conn, vec![handler]).start();
    let err = timeout(TIMEOUT, running.wait()).await.unwrap().unwrap_err();

    assert!(err.is_permanent());
    assert!(matches!(err.cause(), RealtimeError::ConnectionClosed { .. }));
    assert_eq!(*seen.lock(), vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_send_while_handler_reads() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let server_received = Arc::clone(&received);
    let url = serve_once(move |ws| echo_type(ws, server_received)).await;

    let ctx = Context::background();
    let conn = Arc::new(
        client_for(&url, TOKEN)
            .connect(&ctx, ConnectOptions::new())
            .await
            .unwrap(),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handler: Box<dyn EventHandler> = Box::new(CallbackHandler::new(move |_ctx, event| {
        let _ = tx.send(event.clone());
    }));
    let running = ConnHandler::new(&ctx, Arc::clone(&conn), vec![handler]).start();

    conn.send_message(&ctx, &ClientEvent::audio_commit()).await.unwrap();
    let event = timeout(TIMEOUT, rx.recv()).await.unwrap().unwrap();
    match event {
        ServerEvent::ResponseOutputTextDelta(e) => assert_eq!(e.delta, "input_audio_buffer.commit"),
        other => panic!("unexpected event {:?}", other),
    }

    running.stop().await.unwrap();
    conn.close().await.unwrap();
}
