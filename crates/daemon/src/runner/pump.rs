// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event pump
//!
//! One cooperative loop per runner: sweep finished runs, pull pending work
//! from the backend, dispatch by event-type discriminator, send the tick's
//! batched completions, sleep.

use super::error::RunnerError;
use super::registry::MainRun;
use super::MainRunner;
use serde_json::Value;
use splinter_core::{
    decode, EventBundle, EventStatus, RunEventKind, RunEventQuery, RunEventRead, RunEventUpdate,
    RunnerEventKind, RunnerEventQuery, RunnerEventRead, RunnerEventUpdate, StartRunEventQuery,
    StartRunEventRead, WireEvent,
};

impl MainRunner {
    pub(crate) async fn pump_loop(&self) -> Result<(), RunnerError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            self.tick().await?;
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.polling_delay) => {}
            }
        }
    }

    /// One pump iteration.
    pub(crate) async fn tick(&self) -> Result<(), RunnerError> {
        self.sweep_finished_runs().await;

        let fetched = self.client.fetch_events(self.query_bundle()?).await?;
        if !fetched.is_empty() {
            tracing::debug!(count = fetched.len(), "events fetched");
        }

        let mut updates = EventBundle::new();
        for (event_type, events) in fetched.into_iter() {
            match event_type.as_str() {
                RunnerEventRead::EVENT_TYPE => {
                    self.handle_runner_events(events, &mut updates).await?;
                }
                RunEventRead::EVENT_TYPE | StartRunEventRead::EVENT_TYPE => {
                    self.handle_run_events(events, &mut updates).await?;
                }
                other => {
                    tracing::warn!(event_type = other, "dropping events of unhandled type");
                }
            }
        }

        if !updates.is_empty() {
            self.client.update_events(updates).await?;
        }
        Ok(())
    }

    /// The three queries of every tick: runner-scoped events, run events
    /// other than start-run, and start-run events. Start-run events carry
    /// large payloads, so they stay a separate query.
    fn query_bundle(&self) -> Result<EventBundle, RunnerError> {
        let mut queries = EventBundle::new();
        queries.push(&RunnerEventQuery {
            runner_ids: vec![self.ident],
            event_status: vec![EventStatus::Pending],
        })?;
        queries.push(&RunEventQuery {
            runner_ids: vec![self.ident],
            event_status: vec![EventStatus::Pending],
            run_event_type: vec![RunEventKind::Kill, RunEventKind::SimulationStatus],
        })?;
        queries.push(&StartRunEventQuery {
            runner_ids: vec![self.ident],
            event_status: vec![EventStatus::Pending],
        })?;
        Ok(queries)
    }

    /// Tear down every run whose fragments all reached a terminal state.
    /// Callbacks go first, executors after, so trailing executor output is
    /// routed through empty tables instead of dangling callbacks.
    pub(crate) async fn sweep_finished_runs(&self) {
        let finished: Vec<MainRun> = self.lock_state_mut(|state| {
            let run_ids: Vec<i64> = state
                .runs
                .iter()
                .filter(|(_, run)| run.is_finished())
                .map(|(run_id, _)| *run_id)
                .collect();
            run_ids
                .into_iter()
                .filter_map(|run_id| {
                    let run = state.runs.remove(&run_id)?;
                    if let Some(callback) = run.state_callback {
                        state.remove_callback(callback);
                    }
                    if let Some(callback) = run.artifact_callback {
                        state.remove_callback(callback);
                    }
                    Some(run)
                })
                .collect()
        });

        for run in finished {
            self.stop_handles(run.handles()).await;
            tracing::debug!(run_id = run.run_id, "removed finished run");
        }
    }

    async fn handle_runner_events(
        &self,
        events: Vec<Value>,
        updates: &mut EventBundle,
    ) -> Result<(), RunnerError> {
        for event in events {
            let read: RunnerEventRead = match decode(&event) {
                Ok(read) => read,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed runner event");
                    continue;
                }
            };
            let mut update = RunnerEventUpdate {
                id: read.id,
                runner_id: self.ident,
                event_status: EventStatus::Pending,
            };
            match read.runner_event_type {
                RunnerEventKind::Heartbeat => {
                    self.client.send_heartbeat().await?;
                    update.event_status = EventStatus::Completed;
                    tracing::debug!("sent heartbeat");
                }
            }
            updates.push(&update)?;
            tracing::info!(event_id = read.id, "handled runner event");
        }
        Ok(())
    }

    async fn handle_run_events(
        &self,
        events: Vec<Value>,
        updates: &mut EventBundle,
    ) -> Result<(), RunnerError> {
        for event in events {
            let read: RunEventRead = match decode(&event) {
                Ok(read) => read,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed run event");
                    continue;
                }
            };
            let mut update = RunEventUpdate {
                id: read.id,
                runner_id: self.ident,
                run_id: read.run_id,
                event_status: EventStatus::Pending,
            };

            match read.run_event_type {
                RunEventKind::Kill | RunEventKind::SimulationStatus => {
                    let broadcast = self
                        .broadcast_run_event(read.run_id, RunEventRead::EVENT_TYPE, &event, update.clone())
                        .await?;
                    if broadcast {
                        tracing::debug!(
                            run_id = read.run_id,
                            kind = ?read.run_event_type,
                            "broadcast run event to fragment executors"
                        );
                    } else {
                        update.event_status = EventStatus::Cancelled;
                        updates.push(&update)?;
                    }
                }
                RunEventKind::StartRun => {
                    self.handle_start_run(&event, read.run_id, update, updates).await?;
                }
            }
            tracing::info!(event_id = read.id, run_id = read.run_id, "handled run event");
        }
        Ok(())
    }

    async fn handle_start_run(
        &self,
        event: &Value,
        run_id: i64,
        mut update: RunEventUpdate,
        updates: &mut EventBundle,
    ) -> Result<(), RunnerError> {
        if self.lock_state(|state| state.contains_run(run_id)) {
            tracing::debug!(run_id, "cannot start run, already being executed");
            update.event_status = EventStatus::Cancelled;
            updates.push(&update)?;
            return Ok(());
        }

        let start = match decode::<StartRunEventRead>(event) {
            Ok(start) => Ok(start),
            Err(e) => Err(RunnerError::MalformedEvent(e.to_string())),
        };
        let started = match start {
            Ok(start) => self.start_run(event, start, update.clone()).await,
            Err(e) => Err(e),
        };

        match started {
            Ok(()) => {
                tracing::debug!(run_id, "started run");
            }
            Err(e) => {
                tracing::error!(run_id, error = %e, "could not start run");
                self.client.update_run(run_id, splinter_core::RunState::Error, "").await?;
                update.event_status = EventStatus::Error;
                updates.push(&update)?;
            }
        }
        Ok(())
    }
}
