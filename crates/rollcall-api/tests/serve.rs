//! End-to-end check over a real socket.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rollcall_api::{AppState, Server};
use rollcall_core::{FixedClock, Identity, Timestamp};
use rollcall_ledger::AttendanceLedger;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn request(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn serves_until_shutdown() {
    let ledger = AttendanceLedger::new(Identity::new("0xowner")).unwrap();
    let clock = Arc::new(FixedClock::new(Timestamp::from_secs(1_718_000_000)));
    let state = Arc::new(AppState::new(ledger, clock, None, "x-rollcall-identity"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(state, addr);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_on(listener, async move {
        let _ = rx.await;
    }));

    let response = request(
        addr,
        "GET /v1/health HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("\"status\":\"ok\""));

    let body = r#"{"identity":"0xalice","matric_number":"CSC001","name":"Alice"}"#;
    let response = request(
        addr,
        &format!(
            "POST /v1/students HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\
             content-type: application/json\r\nx-rollcall-identity: 0xowner\r\n\
             content-length: {}\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 201"), "{response}");

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
