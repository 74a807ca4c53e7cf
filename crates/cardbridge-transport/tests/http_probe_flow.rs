use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use cardbridge_protocol::MessageKind;
use cardbridge_transport::{HttpConfig, HttpTransport, Transport};

/// One-shot HTTP stub: answers `responses.len()` sequential requests then
/// closes the listener. Returns the base URL and the received request lines.
fn serve(responses: Vec<(&'static str, String)>) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let base = format!("http://{}", listener.local_addr().expect("stub addr"));
    let handle = thread::spawn(move || {
        let mut request_lines = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = [0u8; 4096];
            let read = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..read]);
            request_lines.push(request.lines().next().unwrap_or_default().to_string());
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
        }
        request_lines
    });
    (base, handle)
}

fn transport_for(base: &str) -> HttpTransport {
    HttpTransport::new(HttpConfig {
        game_data_endpoint: format!("{base}/state"),
        actions_endpoint: format!("{base}/actions"),
        health_endpoint: format!("{base}/health"),
        headers: HashMap::new(),
        timeout_ms: Some(2000),
    })
    .expect("build http transport")
}

#[test]
fn health_probe_accepts_ok_and_not_found() {
    let (base, handle) = serve(vec![
        ("200 OK", String::new()),
        ("404 Not Found", String::new()),
        ("500 Internal Server Error", String::new()),
    ]);
    let transport = transport_for(&base);

    assert!(transport.is_available(), "200 means reachable");
    // A 404 still proves the endpoint is reachable.
    assert!(transport.is_available(), "404 means reachable");
    assert!(!transport.is_available(), "500 means unhealthy");

    let requests = handle.join().expect("stub server");
    assert!(requests.iter().all(|line| line.starts_with("GET /health")));
}

#[test]
fn probe_fails_when_nothing_is_listening() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    drop(listener);

    let transport = transport_for(&base);
    assert!(!transport.is_available());
}

#[test]
fn state_writes_post_to_the_game_data_endpoint() {
    let (base, handle) = serve(vec![("200 OK", String::new())]);
    let mut transport = transport_for(&base);

    assert!(transport.write_message(MessageKind::GameState, r#"{"sequence_id": 1}"#));

    let requests = handle.join().expect("stub server");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /state"));
}

#[test]
fn action_reads_deduplicate_by_sequence_id() {
    let envelope = r#"{"timestamp":"2026-08-29T12:00:00Z","sequence_id":4,"message_type":"action_command","data":{"action_type":"reroll_shop"}}"#;
    let (base, handle) = serve(vec![
        ("200 OK", envelope.to_string()),
        ("200 OK", envelope.to_string()),
        ("204 No Content", String::new()),
    ]);
    let mut transport = transport_for(&base);

    assert_eq!(
        transport.read_message(MessageKind::Actions),
        Some(envelope.to_string())
    );
    // Same sequence id served again must be suppressed.
    assert_eq!(transport.read_message(MessageKind::Actions), None);
    // Empty body means no pending action.
    assert_eq!(transport.read_message(MessageKind::Actions), None);

    let requests = handle.join().expect("stub server");
    assert!(requests.iter().all(|line| line.starts_with("GET /actions")));
}

#[test]
fn only_the_actions_kind_is_readable() {
    let (base, _handle) = serve(Vec::new());
    let mut transport = transport_for(&base);
    assert_eq!(transport.read_message(MessageKind::GameState), None);
    assert_eq!(transport.read_message(MessageKind::ActionResult), None);
}
