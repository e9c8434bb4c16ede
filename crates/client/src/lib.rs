// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! splinter-client: typed surface of the Splinter backend.
//!
//! The runner only ever talks to the backend through [`BackendClient`]. The
//! bundled [`HttpBackendClient`] is a deliberately small JSON-over-HTTP/1.1
//! transport; deployments with their own client stack implement the trait
//! instead.

mod http;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BackendCall, FakeBackendClient};

pub use http::HttpBackendClient;

use async_trait::async_trait;
use splinter_core::{EventBundle, RunState};
use thiserror::Error;

/// Errors from backend client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend rejected request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// Typed RPCs against the orchestration backend.
///
/// Reentrant across tasks: the pump, the router, and callback effects all
/// share one client.
#[async_trait]
pub trait BackendClient: Send + Sync + 'static {
    /// Announce this runner and advertise its executor tags.
    async fn runner_started(&self, tags: &[String]) -> Result<(), ClientError>;

    /// Liveness ping.
    async fn send_heartbeat(&self) -> Result<(), ClientError>;

    /// Pull pending work matching a bundle of queries.
    async fn fetch_events(&self, queries: EventBundle) -> Result<EventBundle, ClientError>;

    /// Create events; returns the server-assigned read shapes.
    async fn create_events(&self, bundle: EventBundle) -> Result<EventBundle, ClientError>;

    async fn update_events(&self, bundle: EventBundle) -> Result<(), ClientError>;

    async fn delete_events(&self, bundle: EventBundle) -> Result<(), ClientError>;

    /// Report the overall state of a run.
    async fn update_run(&self, run_id: i64, state: RunState, msg: &str) -> Result<(), ClientError>;

    /// Download the instantiation-wide input artifact.
    async fn get_inst_input_artifact_raw(&self, inst_id: i64) -> Result<Vec<u8>, ClientError>;

    /// Download the input artifact of one fragment.
    async fn get_fragment_input_artifact_raw(
        &self,
        inst_id: i64,
        fragment_id: i64,
    ) -> Result<Vec<u8>, ClientError>;

    /// Upload the output artifact of one run fragment as a named stream.
    async fn set_run_fragment_output_artifact_raw(
        &self,
        run_fragment_id: i64,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), ClientError>;
}
