// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-over-HTTP/1.1 backend transport.
//!
//! Sends one request per RPC over a fresh TCP connection and reads the
//! response using Content-Length framing (does not depend on connection
//! close for EOF). A whole-call timeout covers connect + write + read.

use crate::{BackendClient, ClientError};
use async_trait::async_trait;
use splinter_core::{EventBundle, RunState};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend client speaking plain HTTP/1.1 with JSON bodies.
pub struct HttpBackendClient {
    authority: String,
    base_path: String,
    namespace: String,
    ident: i64,
}

impl HttpBackendClient {
    /// Build a client from a base URL like `http://host:port/api`.
    pub fn new(base_url: &str, namespace: &str, ident: i64) -> Result<Self, ClientError> {
        let rest = base_url
            .strip_prefix("http://")
            .ok_or_else(|| ClientError::InvalidBaseUrl(base_url.to_string()))?;
        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, format!("/{}", path.trim_end_matches('/'))),
            None => (rest, String::new()),
        };
        if authority.is_empty() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        let authority = if authority.contains(':') {
            authority.to_string()
        } else {
            format!("{authority}:80")
        };
        Ok(Self {
            authority,
            base_path: path,
            namespace: namespace.to_string(),
            ident,
        })
    }

    fn runner_path(&self, suffix: &str) -> String {
        format!("{}/{}/runners/{}{}", self.base_path, self.namespace, self.ident, suffix)
    }

    fn ns_path(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_path, self.namespace, suffix)
    }

    async fn post_json(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, ClientError> {
        self.request("POST", path, "application/json", body).await
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        self.request("GET", path, "application/json", &[]).await
    }

    /// Connect, send, and read with one timeout covering the entire call.
    async fn request(
        &self,
        method: &str,
        path: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        tokio::time::timeout(REQUEST_TIMEOUT, self.send_request(method, path, content_type, body))
            .await
            .map_err(|_| ClientError::Transport(format!("{method} {path} timed out")))?
    }

    async fn send_request(
        &self,
        method: &str,
        path: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        let mut stream = TcpStream::connect(&self.authority)
            .await
            .map_err(|e| ClientError::Transport(format!("connect failed: {e}")))?;

        let head = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            method,
            path,
            self.authority,
            content_type,
            body.len()
        );
        stream
            .write_all(head.as_bytes())
            .await
            .map_err(|e| ClientError::Transport(format!("write failed: {e}")))?;
        stream
            .write_all(body)
            .await
            .map_err(|e| ClientError::Transport(format!("write failed: {e}")))?;

        let mut reader = BufReader::new(&mut stream);
        read_http_response(&mut reader).await
    }
}

/// Read and parse an HTTP/1.1 response, returning the body bytes.
async fn read_http_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Vec<u8>, ClientError> {
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(|e| ClientError::Transport(format!("read status failed: {e}")))?;
    let status_code =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    let mut content_length: usize = 0;
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| ClientError::Transport(format!("read header failed: {e}")))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader
            .read_exact(&mut body)
            .await
            .map_err(|e| ClientError::Transport(format!("read body failed: {e}")))?;
    }

    if status_code >= 400 {
        return Err(ClientError::Rejected {
            status: status_code,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body)
}

fn encode_bundle(bundle: &EventBundle) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(bundle).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

fn decode_bundle(body: &[u8]) -> Result<EventBundle, ClientError> {
    if body.is_empty() {
        return Ok(EventBundle::new());
    }
    serde_json::from_slice(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn runner_started(&self, tags: &[String]) -> Result<(), ClientError> {
        let body = serde_json::to_vec(&serde_json::json!({ "tags": tags }))
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        self.post_json(&self.runner_path("/started"), &body).await?;
        Ok(())
    }

    async fn send_heartbeat(&self) -> Result<(), ClientError> {
        self.post_json(&self.runner_path("/heartbeat"), b"{}").await?;
        Ok(())
    }

    async fn fetch_events(&self, queries: EventBundle) -> Result<EventBundle, ClientError> {
        let body = self.post_json(&self.runner_path("/events/fetch"), &encode_bundle(&queries)?).await?;
        decode_bundle(&body)
    }

    async fn create_events(&self, bundle: EventBundle) -> Result<EventBundle, ClientError> {
        let body = self.post_json(&self.runner_path("/events"), &encode_bundle(&bundle)?).await?;
        decode_bundle(&body)
    }

    async fn update_events(&self, bundle: EventBundle) -> Result<(), ClientError> {
        self.post_json(&self.runner_path("/events/update"), &encode_bundle(&bundle)?).await?;
        Ok(())
    }

    async fn delete_events(&self, bundle: EventBundle) -> Result<(), ClientError> {
        self.post_json(&self.runner_path("/events/delete"), &encode_bundle(&bundle)?).await?;
        Ok(())
    }

    async fn update_run(&self, run_id: i64, state: RunState, msg: &str) -> Result<(), ClientError> {
        let body = serde_json::to_vec(&serde_json::json!({ "state": state, "message": msg }))
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        self.post_json(&self.ns_path(&format!("/runs/{run_id}/state")), &body).await?;
        Ok(())
    }

    async fn get_inst_input_artifact_raw(&self, inst_id: i64) -> Result<Vec<u8>, ClientError> {
        self.get(&self.ns_path(&format!("/instantiations/{inst_id}/input_artifact"))).await
    }

    async fn get_fragment_input_artifact_raw(
        &self,
        inst_id: i64,
        fragment_id: i64,
    ) -> Result<Vec<u8>, ClientError> {
        self.get(&self.ns_path(&format!(
            "/instantiations/{inst_id}/fragments/{fragment_id}/input_artifact"
        )))
        .await
    }

    async fn set_run_fragment_output_artifact_raw(
        &self,
        run_fragment_id: i64,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), ClientError> {
        let path =
            self.ns_path(&format!("/run_fragments/{run_fragment_id}/output_artifact/{name}"));
        self.request("POST", &path, "application/octet-stream", &data).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
