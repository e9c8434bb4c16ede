// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor event router
//!
//! Single loop draining the shared queue all reader tasks feed. Each batch
//! goes through the originating handle's callback table; whatever survives
//! is forwarded to the backend with the direction-matching RPC, and replies
//! (create and query return events) flow back to the executor as reads.

use super::callback::CallbackEffect;
use super::error::RunnerError;
use super::handle::{FragmentHandle, HandleId};
use super::MainRunner;
use splinter_core::{EventBundle, EventDirection, RunState};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message from a reader task to the router.
pub(crate) enum RouterMsg {
    Events {
        handle: Arc<FragmentHandle>,
        direction: EventDirection,
        bundle: EventBundle,
    },
    ReaderFailed {
        handle_id: HandleId,
    },
}

impl MainRunner {
    pub(crate) async fn router_loop(
        &self,
        mut router_rx: mpsc::Receiver<RouterMsg>,
    ) -> Result<(), RunnerError> {
        loop {
            let msg = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                msg = router_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => return Ok(()),
                },
            };
            match msg {
                RouterMsg::Events { handle, direction, bundle } => {
                    self.route_executor_events(&handle, direction, bundle).await?;
                }
                RouterMsg::ReaderFailed { handle_id } => {
                    self.fail_run_of_handle(handle_id).await?;
                }
            }
        }
    }

    pub(crate) async fn route_executor_events(
        &self,
        handle: &Arc<FragmentHandle>,
        direction: EventDirection,
        bundle: EventBundle,
    ) -> Result<(), RunnerError> {
        if direction == EventDirection::Read {
            return Err(RunnerError::Protocol(format!(
                "received read events from fragment executor {}",
                handle.name
            )));
        }

        let (passthrough, effects) =
            self.lock_state_mut(|state| state.apply_callbacks(handle.id, direction, bundle))?;

        for effect in effects {
            match effect {
                CallbackEffect::SendUpdate(update) => self.client.update_events(update).await?,
                CallbackEffect::UploadArtifact { run_fragment_id, name, data } => {
                    tracing::debug!(
                        run_fragment_id,
                        name = %name,
                        bytes = data.len(),
                        "uploading fragment output artifact"
                    );
                    self.client
                        .set_run_fragment_output_artifact_raw(run_fragment_id, &name, data)
                        .await?;
                }
            }
        }

        if passthrough.is_empty() {
            return Ok(());
        }
        let reply = match direction {
            EventDirection::Create => Some(self.client.create_events(passthrough).await?),
            EventDirection::Update => {
                self.client.update_events(passthrough).await?;
                None
            }
            EventDirection::Delete => {
                self.client.delete_events(passthrough).await?;
                None
            }
            EventDirection::Query => Some(self.client.fetch_events(passthrough).await?),
            // Rejected above.
            EventDirection::Read => None,
        };

        if let Some(reply) = reply {
            if !reply.is_empty() {
                handle.send(reply, EventDirection::Read).await?;
            }
        }
        Ok(())
    }

    /// An executor's event stream died. Fail the owning run: every fragment
    /// goes to `ERROR` so the next pump sweep tears the run down, and the
    /// backend learns immediately.
    async fn fail_run_of_handle(&self, handle_id: HandleId) -> Result<(), RunnerError> {
        let run_id = self.lock_state_mut(|state| {
            let run = state.run_of_handle(handle_id)?;
            for fragment_state in run.fragment_state.values_mut() {
                *fragment_state = RunState::Error;
            }
            Some(run.run_id)
        });

        match run_id {
            Some(run_id) => {
                tracing::error!(run_id, "fragment executor lost, failing run");
                self.client
                    .update_run(run_id, RunState::Error, "fragment executor event stream failed")
                    .await?;
            }
            None => {
                tracing::debug!(handle = handle_id, "event stream of unregistered executor failed");
            }
        }
        Ok(())
    }
}
