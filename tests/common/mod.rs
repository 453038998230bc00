//! Shared utilities for integration testing.

use std::io::Write as _;
use std::net::SocketAddr;
use std::time::Duration;

use courier::HandlerEvent;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Install the test tracing subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A mock backend bound to a random local port.
///
/// Every accepted connection gets the same canned response; each raw
/// request is captured on `requests`.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub requests: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Start a backend answering every connection with `response`.
pub async fn start_backend(response: Vec<u8>) -> MockBackend {
    start_backend_with_delay(response, Duration::ZERO).await
}

/// Start a backend that waits `delay` between reading the request and
/// sending the response.
pub async fn start_backend_with_delay(response: Vec<u8>, delay: Duration) -> MockBackend {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut socket).await;
                        let _ = tx.send(request);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        let _ = socket.write_all(&response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, requests: rx }
}

/// Read one HTTP/1.1 request: headers, then the body per Content-Length or
/// until the chunked terminator.
async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(end) = find_header_end(&request) {
            break end;
        }
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return request,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    };

    let chunked = is_chunked(&request[..header_end]);
    let expected = header_end + content_length(&request[..header_end]);
    loop {
        let complete = if chunked {
            request.ends_with(b"0\r\n\r\n")
        } else {
            request.len() >= expected
        };
        if complete {
            break;
        }
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    request
}

fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn header_field(headers: &[u8], name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(headers);
    for line in text.lines() {
        if let Some((field, value)) = line.split_once(':') {
            if field.trim().eq_ignore_ascii_case(name) {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

fn content_length(headers: &[u8]) -> usize {
    header_field(headers, "content-length")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn is_chunked(headers: &[u8]) -> bool {
    header_field(headers, "transfer-encoding")
        .map(|value| value.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
}

/// Assemble a raw HTTP/1.1 response.
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut response = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("Connection: close\r\n\r\n");
    let mut bytes = response.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// A 200 response with an exact Content-Length.
pub fn ok_response(body: &[u8]) -> Vec<u8> {
    let len = body.len().to_string();
    http_response("200 OK", &[("Content-Length", len.as_str())], body)
}

/// Gzip-compress `plain` for Content-Encoding tests.
#[allow(dead_code)]
pub fn gzip(plain: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(plain).unwrap();
    encoder.finish().unwrap()
}

/// Drain handler events until the finish callback or channel close.
pub async fn collect_events(rx: &mut mpsc::UnboundedReceiver<HandlerEvent>) -> Vec<HandlerEvent> {
    let mut events = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(event)) => {
                let finished = matches!(event, HandlerEvent::Finish { .. });
                events.push(event);
                if finished {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => panic!("timed out waiting for handler events"),
        }
    }
    events
}

/// Compress an event list to comparable kind tags.
#[allow(dead_code)]
pub fn kinds(events: &[HandlerEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            HandlerEvent::Send { .. } => "send",
            HandlerEvent::UploadProgress { .. } => "upload",
            HandlerEvent::DownloadProgress { .. } => "download",
            HandlerEvent::Success { .. } => "success",
            HandlerEvent::Failure { .. } => "failure",
            HandlerEvent::BeforeCallback { .. } => "before_callback",
            HandlerEvent::BeforeFinish { .. } => "before_finish",
            HandlerEvent::Finish { .. } => "finish",
        })
        .collect()
}

/// Await one captured request with a deadline.
pub async fn next_request(backend: &mut MockBackend) -> Vec<u8> {
    tokio::time::timeout(Duration::from_secs(5), backend.requests.recv())
        .await
        .expect("timed out waiting for a captured request")
        .expect("backend closed without capturing a request")
}
