//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `RestClient` and
//! `TypedRestClient` over real HTTP through the default ureq transport.
//! The echo routes report exactly what arrived on the wire, so header
//! precedence and body transmission are checked from the server's side.

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use mock_server::{digits, Echo};
use rest_core::{
    BasicAuthCredentials, EndpointConfig, HttpMethod, JsonCodec, MimeType, RestClient, RestError,
    TypedRestClient,
};
use serde::Serialize;

/// Start the mock server once for the whole test binary.
fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });

        addr
    })
}

/// Serve one connection that sends the response head at once, then each
/// body byte after its own delay.
fn dripping_server(body: &'static [u8], gaps: Vec<Duration>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len());
        stream.write_all(head.as_bytes()).unwrap();
        stream.flush().unwrap();
        for (byte, gap) in body.iter().zip(gaps) {
            thread::sleep(gap);
            // The client hangs up after a timeout.
            if stream.write_all(&[*byte]).and_then(|()| stream.flush()).is_err() {
                return;
            }
        }
    });

    addr
}

fn base_url(path: &str) -> String {
    format!("http://{}{path}", server())
}

fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[derive(Serialize)]
struct SomeObject {
    name: String,
    tags: Vec<String>,
}

#[test]
fn read_sends_credentials_codec_headers_and_caller_overrides() {
    let client = TypedRestClient::new(&base_url("/echo"), JsonCodec, 5000, 5000).unwrap();
    client.set_credentials(BasicAuthCredentials::new("u", "p").unwrap());
    let body = SomeObject {
        name: "joan".to_string(),
        tags: vec!["a".to_string()],
    };

    let echo: Echo = client
        .read(None, Some(&body), Some(&headers(&[("Accept", "application/xml")])))
        .unwrap();

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.headers["authorization"], "Basic dTpw");
    assert_eq!(echo.headers["content-type"], "application/json");
    assert_eq!(echo.headers["accept"], "application/xml");
    assert_eq!(echo.body, serde_json::to_string(&body).unwrap());
}

#[test]
fn caller_authorization_replaces_credentials() {
    let client = TypedRestClient::new(&base_url("/echo"), JsonCodec, 5000, 5000).unwrap();
    client.set_credentials(BasicAuthCredentials::new("u", "p").unwrap());

    let echo: Echo = client
        .read::<(), _>(Some("auth"), None, Some(&headers(&[("Authorization", "Bearer t0k3n")])))
        .unwrap();

    assert_eq!(echo.path, "/echo/auth");
    assert_eq!(echo.headers["authorization"], "Bearer t0k3n");
    assert_eq!(echo.headers["accept"], "*/*");
    assert!(echo.body.is_empty());
}

#[test]
fn no_authorization_without_credentials() {
    let client = TypedRestClient::new(&base_url("/echo/"), JsonCodec, 5000, 5000).unwrap();
    let echo: Echo = client.read::<(), _>(Some("/plain/"), None, None).unwrap();
    assert_eq!(echo.path, "/echo/plain");
    assert!(!echo.headers.contains_key("authorization"));
}

#[test]
fn write_methods_reach_the_server() {
    let config = EndpointConfig::new(base_url("/echo"));
    let client = TypedRestClient::from_config(&config, JsonCodec).unwrap();
    let body = SomeObject {
        name: "n".to_string(),
        tags: Vec::new(),
    };

    let created: Echo = client.create(Some("items"), Some(&body), None).unwrap();
    assert_eq!(created.method, "POST");
    assert_eq!(created.body, r#"{"name":"n","tags":[]}"#);

    let updated: Echo = client.update(Some("items/1"), Some(&body), None).unwrap();
    assert_eq!(updated.method, "PUT");
    assert_eq!(updated.path, "/echo/items/1");

    let deleted: Echo = client.delete::<(), _>(Some("items/1"), None, None).unwrap();
    assert_eq!(deleted.method, "DELETE");
}

#[test]
fn raw_request_collects_large_bodies() {
    let client = RestClient::new(&base_url(""), 5000, 5000).unwrap();
    let bytes = client
        .do_request(Some("bytes/100000"), None, HttpMethod::Get, MimeType::OctetStream, MimeType::Text, None)
        .unwrap();
    assert_eq!(bytes, digits(100_000));
}

#[test]
fn raw_request_with_body_on_delete() {
    let client = RestClient::new(&base_url(""), 5000, 5000).unwrap();
    let bytes = client
        .do_request(Some("/echo"), Some(b"gone"), HttpMethod::Delete, MimeType::Json, MimeType::Text, None)
        .unwrap();
    let echo: Echo = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(echo.method, "DELETE");
    assert_eq!(echo.body, "gone");
    assert_eq!(echo.headers["content-type"], "text/plain");
}

#[test]
fn error_status_surfaces_as_io_error() {
    let client = RestClient::new(&base_url(""), 5000, 5000).unwrap();
    let err = client
        .do_request(Some("status/500"), None, HttpMethod::Get, MimeType::All, MimeType::Json, None)
        .unwrap_err();
    assert!(matches!(err, RestError::Io(_)), "{err:?}");
}

#[test]
fn read_timeout_surfaces_as_io_error() {
    let client = RestClient::new(&base_url(""), 5000, 100).unwrap();
    let err = client
        .do_request(Some("slow/2000"), None, HttpMethod::Get, MimeType::All, MimeType::Json, None)
        .unwrap_err();
    assert_eq!(err.as_io().unwrap().kind(), ErrorKind::TimedOut, "{err:?}");
}

#[test]
fn read_timeout_applies_to_each_body_read() {
    let addr = dripping_server(b"0123456789", vec![Duration::from_millis(80); 10]);
    let client = RestClient::new(&format!("http://{addr}"), 5000, 300).unwrap();

    let started = Instant::now();
    let bytes = client
        .do_request(None, None, HttpMethod::Get, MimeType::All, MimeType::Json, None)
        .unwrap();
    assert_eq!(bytes, b"0123456789");
    assert!(started.elapsed() > Duration::from_millis(300), "body arrived faster than the read timeout");
}

#[test]
fn stalled_body_read_times_out() {
    let gaps = vec![Duration::ZERO, Duration::from_millis(1500), Duration::ZERO];
    let addr = dripping_server(b"abc", gaps);
    let client = RestClient::new(&format!("http://{addr}"), 5000, 200).unwrap();

    let err = client
        .do_request(None, None, HttpMethod::Get, MimeType::All, MimeType::Json, None)
        .unwrap_err();
    assert_eq!(err.as_io().unwrap().kind(), ErrorKind::TimedOut, "{err:?}");
}

#[test]
fn connection_refused_surfaces_as_io_error() {
    // Bind then drop to obtain a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let client = RestClient::new(&format!("http://{addr}"), 1000, 1000).unwrap();
    let err = client
        .do_request(None, None, HttpMethod::Get, MimeType::All, MimeType::Json, None)
        .unwrap_err();
    assert!(matches!(err, RestError::Io(_)), "{err:?}");
}

#[test]
fn concurrent_calls_are_independent() {
    let client = TypedRestClient::new(&base_url("/echo"), JsonCodec, 5000, 5000).unwrap();
    client.set_credentials(BasicAuthCredentials::new("u", "p").unwrap());

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = &client;
                scope.spawn(move || {
                    let resource = format!("worker/{i}");
                    let echo: Echo = client.read(Some(resource.as_str()), Some(&i), None).unwrap();
                    (i, echo)
                })
            })
            .collect();

        for handle in handles {
            let (i, echo) = handle.join().unwrap();
            assert_eq!(echo.path, format!("/echo/worker/{i}"));
            assert_eq!(echo.body, i.to_string());
            assert_eq!(echo.headers["authorization"], "Basic dTpw");
        }
    });
}
