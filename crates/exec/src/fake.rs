// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake fragment executor for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::plugin::{ExecutorError, FragmentExecutor, PluginFactory};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use splinter_core::{EventBundle, EventDirection};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Fake fragment executor for testing
///
/// Records start/send/stop calls and lets tests script the batches
/// `get_events` hands to the runner's reader task.
#[derive(Clone)]
pub struct FakeExecutor {
    inner: Arc<Mutex<FakeExecutorState>>,
    outbox: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<(EventDirection, EventBundle)>>>,
}

struct FakeExecutorState {
    started_with: Option<(Value, Value)>,
    sent: Vec<(EventDirection, EventBundle)>,
    stopped: bool,
    outbox_tx: Option<mpsc::UnboundedSender<(EventDirection, EventBundle)>>,
    start_error: Option<ExecutorError>,
    send_error: Option<ExecutorError>,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Mutex::new(FakeExecutorState {
                started_with: None,
                sent: Vec::new(),
                stopped: false,
                outbox_tx: Some(tx),
                start_error: None,
                send_error: None,
            })),
            outbox: Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    /// Queue a batch for the runner's reader task to pick up.
    pub fn emit(&self, direction: EventDirection, bundle: EventBundle) {
        if let Some(tx) = &self.inner.lock().outbox_tx {
            let _ = tx.send((direction, bundle));
        }
    }

    /// Close the event stream: once queued batches drain, `get_events`
    /// fails, which is how tests simulate a dying executor.
    pub fn close_stream(&self) {
        self.inner.lock().outbox_tx.take();
    }

    /// True once `start` was called.
    pub fn started(&self) -> bool {
        self.inner.lock().started_with.is_some()
    }

    /// The `(settings, parameters)` passed to `start`.
    pub fn start_args(&self) -> Option<(Value, Value)> {
        self.inner.lock().started_with.clone()
    }

    /// All batches delivered via `send_events`, in order.
    pub fn sent(&self) -> Vec<(EventDirection, EventBundle)> {
        self.inner.lock().sent.clone()
    }

    pub fn stopped(&self) -> bool {
        self.inner.lock().stopped
    }

    /// Set error to return on next start
    pub fn set_start_error(&self, error: ExecutorError) {
        self.inner.lock().start_error = Some(error);
    }

    /// Set error to return on next send
    pub fn set_send_error(&self, error: ExecutorError) {
        self.inner.lock().send_error = Some(error);
    }
}

#[async_trait]
impl FragmentExecutor for FakeExecutor {
    async fn start(&self, settings: &Value, parameters: &Value) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.start_error.take() {
            return Err(error);
        }
        inner.started_with = Some((settings.clone(), parameters.clone()));
        Ok(())
    }

    async fn send_events(
        &self,
        bundle: EventBundle,
        direction: EventDirection,
    ) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.send_error.take() {
            return Err(error);
        }
        if inner.stopped {
            return Err(ExecutorError::SendFailed("executor stopped".into()));
        }
        inner.sent.push((direction, bundle));
        Ok(())
    }

    async fn get_events(&self) -> Result<(EventDirection, EventBundle), ExecutorError> {
        self.outbox
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| ExecutorError::StreamClosed("event stream closed".into()))
    }

    async fn stop(&self) -> Result<(), ExecutorError> {
        let mut inner = self.inner.lock();
        inner.stopped = true;
        inner.outbox_tx.take();
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Tracks every executor a [`PluginFactory`] hands out, so tests can reach
/// the instances the runner spawned.
#[derive(Clone, Default)]
pub struct FakeExecutorHub {
    created: Arc<Mutex<Vec<FakeExecutor>>>,
}

impl FakeExecutorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory that records every instance it creates.
    pub fn factory(&self) -> PluginFactory {
        let hub = self.clone();
        Arc::new(move || {
            let executor = FakeExecutor::new();
            hub.created.lock().push(executor.clone());
            Arc::new(executor) as Arc<dyn FragmentExecutor>
        })
    }

    /// Executors created so far, in spawn order.
    pub fn created(&self) -> Vec<FakeExecutor> {
        self.created.lock().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}
