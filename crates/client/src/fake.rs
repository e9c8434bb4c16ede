// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake backend client for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::{BackendClient, ClientError};
use async_trait::async_trait;
use parking_lot::Mutex;
use splinter_core::{EventBundle, RunState};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded call to FakeBackendClient
#[derive(Debug, Clone)]
pub enum BackendCall {
    RunnerStarted { tags: Vec<String> },
    Heartbeat,
    FetchEvents { queries: EventBundle },
    CreateEvents { bundle: EventBundle },
    UpdateEvents { bundle: EventBundle },
    DeleteEvents { bundle: EventBundle },
    UpdateRun { run_id: i64, state: RunState, msg: String },
    GetInstArtifact { inst_id: i64 },
    GetFragmentArtifact { inst_id: i64, fragment_id: i64 },
    SetOutputArtifact { run_fragment_id: i64, name: String, data: Vec<u8> },
}

/// Fake backend client for testing
///
/// Records every call and replays scripted responses. Fetch replies are a
/// queue: each `fetch_events` pops one bundle (empty once drained), which is
/// how tests feed the pump one tick of work at a time.
#[derive(Clone, Default)]
pub struct FakeBackendClient {
    inner: Arc<Mutex<FakeBackendState>>,
}

#[derive(Default)]
struct FakeBackendState {
    calls: Vec<BackendCall>,
    fetch_replies: VecDeque<EventBundle>,
    create_replies: VecDeque<EventBundle>,
    inst_artifacts: HashMap<i64, Vec<u8>>,
    fragment_artifacts: HashMap<(i64, i64), Vec<u8>>,
    fetch_error: Option<ClientError>,
    update_error: Option<ClientError>,
}

impl FakeBackendClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Queue a bundle to be returned by the next `fetch_events`.
    pub fn queue_fetch_reply(&self, bundle: EventBundle) {
        self.inner.lock().fetch_replies.push_back(bundle);
    }

    /// Queue a bundle to be returned by the next `create_events`.
    pub fn queue_create_reply(&self, bundle: EventBundle) {
        self.inner.lock().create_replies.push_back(bundle);
    }

    /// Provide the instantiation input artifact for `inst_id`.
    pub fn set_inst_artifact(&self, inst_id: i64, data: Vec<u8>) {
        self.inner.lock().inst_artifacts.insert(inst_id, data);
    }

    /// Provide the input artifact for one fragment.
    pub fn set_fragment_artifact(&self, inst_id: i64, fragment_id: i64, data: Vec<u8>) {
        self.inner.lock().fragment_artifacts.insert((inst_id, fragment_id), data);
    }

    /// Set error to return on next fetch
    pub fn set_fetch_error(&self, error: ClientError) {
        self.inner.lock().fetch_error = Some(error);
    }

    /// Set error to return on next update
    pub fn set_update_error(&self, error: ClientError) {
        self.inner.lock().update_error = Some(error);
    }

    /// All recorded `update_events` bundles, in call order.
    pub fn update_bundles(&self) -> Vec<EventBundle> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::UpdateEvents { bundle } => Some(bundle.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl BackendClient for FakeBackendClient {
    async fn runner_started(&self, tags: &[String]) -> Result<(), ClientError> {
        self.inner.lock().calls.push(BackendCall::RunnerStarted { tags: tags.to_vec() });
        Ok(())
    }

    async fn send_heartbeat(&self) -> Result<(), ClientError> {
        self.inner.lock().calls.push(BackendCall::Heartbeat);
        Ok(())
    }

    async fn fetch_events(&self, queries: EventBundle) -> Result<EventBundle, ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::FetchEvents { queries });
        if let Some(error) = inner.fetch_error.take() {
            return Err(error);
        }
        Ok(inner.fetch_replies.pop_front().unwrap_or_default())
    }

    async fn create_events(&self, bundle: EventBundle) -> Result<EventBundle, ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::CreateEvents { bundle });
        Ok(inner.create_replies.pop_front().unwrap_or_default())
    }

    async fn update_events(&self, bundle: EventBundle) -> Result<(), ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::UpdateEvents { bundle });
        if let Some(error) = inner.update_error.take() {
            return Err(error);
        }
        Ok(())
    }

    async fn delete_events(&self, bundle: EventBundle) -> Result<(), ClientError> {
        self.inner.lock().calls.push(BackendCall::DeleteEvents { bundle });
        Ok(())
    }

    async fn update_run(&self, run_id: i64, state: RunState, msg: &str) -> Result<(), ClientError> {
        self.inner.lock().calls.push(BackendCall::UpdateRun {
            run_id,
            state,
            msg: msg.to_string(),
        });
        Ok(())
    }

    async fn get_inst_input_artifact_raw(&self, inst_id: i64) -> Result<Vec<u8>, ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::GetInstArtifact { inst_id });
        inner
            .inst_artifacts
            .get(&inst_id)
            .cloned()
            .ok_or_else(|| ClientError::Rejected { status: 404, body: "no artifact".into() })
    }

    async fn get_fragment_input_artifact_raw(
        &self,
        inst_id: i64,
        fragment_id: i64,
    ) -> Result<Vec<u8>, ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::GetFragmentArtifact { inst_id, fragment_id });
        inner
            .fragment_artifacts
            .get(&(inst_id, fragment_id))
            .cloned()
            .ok_or_else(|| ClientError::Rejected { status: 404, body: "no artifact".into() })
    }

    async fn set_run_fragment_output_artifact_raw(
        &self,
        run_fragment_id: i64,
        name: &str,
        data: Vec<u8>,
    ) -> Result<(), ClientError> {
        self.inner.lock().calls.push(BackendCall::SetOutputArtifact {
            run_fragment_id,
            name: name.to_string(),
            data,
        });
        Ok(())
    }
}
