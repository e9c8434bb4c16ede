// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fragment executor handles and their reader tasks

use super::router::RouterMsg;
use parking_lot::Mutex;
use splinter_core::{EventBundle, EventDirection};
use splinter_exec::{ExecutorError, FragmentExecutor};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub(crate) type HandleId = u64;

/// Owns one fragment executor instance and the task draining its output.
pub(crate) struct FragmentHandle {
    pub id: HandleId,
    /// Executor tag this handle was spawned under.
    pub name: String,
    executor: Arc<dyn FragmentExecutor>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl FragmentHandle {
    /// Wrap a started executor and launch its reader task.
    pub fn spawn(
        id: HandleId,
        name: String,
        executor: Arc<dyn FragmentExecutor>,
        router_tx: mpsc::Sender<RouterMsg>,
    ) -> Arc<Self> {
        let handle = Arc::new(Self { id, name, executor, reader: Mutex::new(None) });
        let reader = tokio::spawn(read_events(Arc::clone(&handle), router_tx));
        *handle.reader.lock() = Some(reader);
        handle
    }

    pub async fn send(
        &self,
        bundle: EventBundle,
        direction: EventDirection,
    ) -> Result<(), ExecutorError> {
        self.executor.send_events(bundle, direction).await
    }

    /// Stop sequence: kill the reader first, then the executor, so the
    /// reader never observes a half-stopped executor. Safe to call twice;
    /// the second call finds no reader and `stop` is once-safe by contract.
    pub async fn shutdown(&self) {
        let reader = self.reader.lock().take();
        if let Some(reader) = reader {
            reader.abort();
            let _ = reader.await;
        }
        if let Err(e) = self.executor.stop().await {
            tracing::warn!(executor = %self.name, error = %e, "executor stop failed");
        }
    }
}

/// Drain one executor's event stream into the shared router queue.
///
/// On a read error the executor is considered lost: the router is told so it
/// can fail the owning run, and the task exits.
async fn read_events(handle: Arc<FragmentHandle>, router_tx: mpsc::Sender<RouterMsg>) {
    loop {
        match handle.executor.get_events().await {
            Ok((direction, bundle)) => {
                let msg = RouterMsg::Events { handle: Arc::clone(&handle), direction, bundle };
                if router_tx.send(msg).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::error!(
                    executor = %handle.executor.name(),
                    error = %e,
                    "failed to read events from fragment executor"
                );
                let _ = router_tx.send(RouterMsg::ReaderFailed { handle_id: handle.id }).await;
                return;
            }
        }
    }
}
