// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport tests (URL parsing and response framing)

use super::*;
use yare::parameterized;

#[parameterized(
    with_port_and_path = { "http://backend:8000/api", "backend:8000", "/api" },
    bare_host = { "http://backend", "backend:80", "" },
    trailing_slash = { "http://backend:9000/api/v1/", "backend:9000", "/api/v1" },
)]
fn base_url_parsing(url: &str, authority: &str, base_path: &str) {
    let client = HttpBackendClient::new(url, "main", 1).unwrap();
    assert_eq!(client.authority, authority);
    assert_eq!(client.base_path, base_path);
}

#[parameterized(
    https = { "https://backend:8000" },
    no_scheme = { "backend:8000" },
    empty_host = { "http:///api" },
)]
fn invalid_base_urls_are_rejected(url: &str) {
    assert!(matches!(
        HttpBackendClient::new(url, "main", 1),
        Err(ClientError::InvalidBaseUrl(_))
    ));
}

#[test]
fn runner_paths_include_namespace_and_ident() {
    let client = HttpBackendClient::new("http://backend:8000/api", "ns1", 42).unwrap();
    assert_eq!(client.runner_path("/events/fetch"), "/api/ns1/runners/42/events/fetch");
    assert_eq!(client.ns_path("/runs/7/state"), "/api/ns1/runs/7/state");
}

#[tokio::test]
async fn response_framing_uses_content_length() {
    let body = b"{\"ok\":true}";
    let raw = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}extra",
        body.len(),
        String::from_utf8_lossy(body)
    );
    let mut reader = tokio::io::BufReader::new(raw.as_bytes());
    let read = read_http_response(&mut reader).await.unwrap();
    assert_eq!(read, body);
}

#[tokio::test]
async fn error_statuses_surface_the_body() {
    let raw = "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nnot found";
    let mut reader = tokio::io::BufReader::new(raw.as_bytes());
    let err = read_http_response(&mut reader).await.unwrap_err();
    match err {
        ClientError::Rejected { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}
