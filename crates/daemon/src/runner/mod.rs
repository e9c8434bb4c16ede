// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The main runner: lifecycle, workers, and teardown
//!
//! One `MainRunner` registers with the backend under a numeric identity and
//! runs two workers: the event pump (backend → executors) and the executor
//! event router (executors → backend). Fragment executor handles come and
//! go with runs; shared state lives behind one mutex and is only touched
//! synchronously.

mod callback;
mod error;
mod handle;
mod pump;
mod registry;
mod router;
mod start;

pub use error::RunnerError;

use handle::FragmentHandle;
use parking_lot::Mutex;
use registry::RunnerState;
use router::RouterMsg;
use splinter_client::BackendClient;
use splinter_exec::ExecutorConfigs;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Capacity of the shared reader → router queue.
const ROUTER_QUEUE_DEPTH: usize = 256;

/// Long-lived agent mediating between the backend and fragment executors.
pub struct MainRunner {
    ident: i64,
    polling_delay: Duration,
    client: Arc<dyn BackendClient>,
    configs: ExecutorConfigs,
    state: Mutex<RunnerState>,
    router_tx: mpsc::Sender<RouterMsg>,
    router_rx: Mutex<Option<mpsc::Receiver<RouterMsg>>>,
    next_handle_id: AtomicU64,
    cancel: CancellationToken,
}

impl MainRunner {
    pub fn new(
        client: Arc<dyn BackendClient>,
        configs: ExecutorConfigs,
        ident: i64,
        polling_delay: Duration,
    ) -> Arc<Self> {
        let (router_tx, router_rx) = mpsc::channel(ROUTER_QUEUE_DEPTH);
        Arc::new(Self {
            ident,
            polling_delay,
            client,
            configs,
            state: Mutex::new(RunnerState::default()),
            router_tx,
            router_rx: Mutex::new(Some(router_rx)),
            next_handle_id: AtomicU64::new(1),
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops both workers when cancelled; teardown still runs.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Announce the runner, then drive the pump and the router until one of
    /// them exits. The peer is cancelled and drained before teardown, so
    /// executors are always stopped exactly once.
    pub async fn run(self: Arc<Self>) -> Result<(), RunnerError> {
        let tags = self.configs.tags();
        self.client.runner_started(&tags).await?;
        tracing::info!(ident = self.ident, ?tags, "runner registered with backend");

        let router_rx = self.router_rx.lock().take().ok_or(RunnerError::AlreadyRunning)?;

        let mut workers: JoinSet<Result<(), RunnerError>> = JoinSet::new();
        {
            let runner = Arc::clone(&self);
            workers.spawn(async move { runner.router_loop(router_rx).await });
        }
        {
            let runner = Arc::clone(&self);
            workers.spawn(async move { runner.pump_loop().await });
        }

        let mut result = match workers.join_next().await {
            Some(Ok(finished)) => finished,
            Some(Err(e)) => Err(RunnerError::Worker(e.to_string())),
            None => Ok(()),
        };
        self.cancel.cancel();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    if result.is_ok() {
                        result = Err(e);
                    } else {
                        tracing::warn!(error = %e, "worker failed during shutdown");
                    }
                }
                Err(e) => {
                    if result.is_ok() {
                        result = Err(RunnerError::Worker(e.to_string()));
                    }
                }
            }
        }

        self.teardown().await;
        result
    }

    /// Clear a set of handles out of the callback tables, then stop their
    /// executors concurrently. Callback removal precedes the stops so
    /// trailing executor output passes through instead of hitting callbacks
    /// of a dead run.
    pub(crate) async fn stop_handles(&self, handles: Vec<Arc<FragmentHandle>>) {
        if handles.is_empty() {
            return;
        }
        self.lock_state_mut(|state| {
            for handle in &handles {
                state.clear_handle_tables(handle.id);
            }
        });
        futures_util::future::join_all(handles.iter().map(|handle| handle.shutdown())).await;
    }

    /// Final cleanup: every still-live executor is stopped. The stops run
    /// as spawned tasks, so cancellation of the surrounding future cannot
    /// abort them mid-flight.
    async fn teardown(&self) {
        let handles: Vec<Arc<FragmentHandle>> = self.lock_state_mut(|state| {
            let handles = state
                .runs
                .values()
                .flat_map(|run| run.fragments.values().cloned())
                .collect::<Vec<_>>();
            state.runs.clear();
            state.tables.clear();
            state.arena.entries.clear();
            handles
        });
        if handles.is_empty() {
            return;
        }

        tracing::warn!(count = handles.len(), "stopping fragment executors during shutdown");
        let stops: Vec<_> = handles
            .into_iter()
            .map(|handle| tokio::spawn(async move { handle.shutdown().await }))
            .collect();
        for stop in stops {
            let _ = stop.await;
        }
    }

    pub(crate) fn lock_state<T>(&self, f: impl FnOnce(&RunnerState) -> T) -> T {
        f(&self.state.lock())
    }

    pub(crate) fn lock_state_mut<T>(&self, f: impl FnOnce(&mut RunnerState) -> T) -> T {
        f(&mut self.state.lock())
    }
}

#[cfg(test)]
#[path = "runner_tests/mod.rs"]
mod tests;
