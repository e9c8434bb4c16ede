// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run start and run-event broadcast

use super::callback::{CallbackKind, TableKey, UpdateAggregator};
use super::error::RunnerError;
use super::handle::FragmentHandle;
use super::registry::MainRun;
use super::MainRunner;
use base64::prelude::{Engine, BASE64_STANDARD};
use futures_util::future::try_join_all;
use serde_json::Value;
use splinter_core::{
    EventBundle, EventDirection, InstantiationView, RunEventUpdate, RunFragmentOutputArtifactEventCreate,
    RunFragmentStateEventCreate, StartRunEventRead, WireEvent,
};
use splinter_exec::FragmentExecutorConfig;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::Ordering;

impl MainRunner {
    /// Handle a start-run event: spawn one fragment executor per declared
    /// run fragment, install the run's callbacks, and dispatch a restricted
    /// copy of the start event to each executor.
    ///
    /// Any failure after the first executor spawn cleans up completely:
    /// spawned executors are stopped, the run and its callbacks leave the
    /// registry, and the caller reports the error to the backend.
    pub(crate) async fn start_run(
        &self,
        payload: &Value,
        event: StartRunEventRead,
        update: RunEventUpdate,
    ) -> Result<(), RunnerError> {
        let run_id = event.run_id;

        let inst: InstantiationView = serde_json::from_str(&event.inst.blob)
            .map_err(|e| RunnerError::InvalidInstantiation(e.to_string()))?;
        let parameters: HashMap<i64, Value> = inst
            .fragments
            .iter()
            .map(|fragment| (fragment.id, Value::Object(fragment.parameters.clone())))
            .collect();
        let fragments_with_artifacts: HashSet<i64> = inst
            .fragments
            .iter()
            .filter(|fragment| !fragment.input_artifact_paths.is_empty())
            .map(|fragment| fragment.id)
            .collect();

        // Fetched once per run, embedded in every per-fragment start bundle.
        let inst_artifact = if inst.input_artifact_paths.is_empty() {
            None
        } else {
            Some(self.client.get_inst_input_artifact_raw(event.inst.id).await?)
        };

        let mut fragments: HashMap<i64, Arc<FragmentHandle>> = HashMap::new();
        for run_fragment in &event.fragments {
            let tag = run_fragment
                .fragment
                .fragment_executor_tag
                .as_deref()
                .unwrap_or_else(|| self.configs.default_tag());
            let Some(config) = self.configs.get(tag) else {
                self.stop_handles(fragments.into_values().collect()).await;
                return Err(RunnerError::UnknownExecutorTag(tag.to_string()));
            };
            let Some(params) = parameters.get(&run_fragment.fragment.object_id) else {
                self.stop_handles(fragments.into_values().collect()).await;
                return Err(RunnerError::UnknownFragment {
                    run_id,
                    object_id: run_fragment.fragment.object_id,
                });
            };
            match self.spawn_fragment_executor(config, params).await {
                Ok(handle) => {
                    fragments.insert(run_fragment.id, handle);
                }
                Err(e) => {
                    self.stop_handles(fragments.into_values().collect()).await;
                    return Err(e);
                }
            }
        }

        // Register the run with its three callbacks: the start-run update
        // aggregator, the state tracker, and the artifact uploader, each
        // spanning every fragment executor of the run.
        self.lock_state_mut(|state| {
            let mut run = MainRun::new(run_id, fragments.clone());
            let handles = run.handles();

            let aggregator_keys = handles
                .iter()
                .map(|handle| {
                    TableKey::new(handle.id, EventDirection::Update, RunEventUpdate::EVENT_TYPE)
                })
                .collect();
            state.insert_callback(
                CallbackKind::UpdateAggregator(UpdateAggregator::new(
                    event.id,
                    handles.len(),
                    update,
                )),
                aggregator_keys,
            );

            let tracker_keys = handles
                .iter()
                .map(|handle| {
                    TableKey::new(
                        handle.id,
                        EventDirection::Create,
                        RunFragmentStateEventCreate::EVENT_TYPE,
                    )
                })
                .collect();
            run.state_callback =
                Some(state.insert_callback(CallbackKind::FragmentStateTracker { run_id }, tracker_keys));

            let uploader_keys = handles
                .iter()
                .map(|handle| {
                    TableKey::new(
                        handle.id,
                        EventDirection::Create,
                        RunFragmentOutputArtifactEventCreate::EVENT_TYPE,
                    )
                })
                .collect();
            run.artifact_callback =
                Some(state.insert_callback(CallbackKind::ArtifactUploader { run_id }, uploader_keys));

            state.runs.insert(run_id, run);
        });

        match self
            .dispatch_start(payload, &event, inst_artifact, &fragments_with_artifacts, &fragments)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                self.abort_start(run_id).await;
                Err(e)
            }
        }
    }

    /// Send each executor its restricted copy of the start event: the
    /// fragment list narrowed to its one fragment, plus any input artifacts
    /// as base64.
    async fn dispatch_start(
        &self,
        payload: &Value,
        event: &StartRunEventRead,
        inst_artifact: Option<Vec<u8>>,
        fragments_with_artifacts: &HashSet<i64>,
        fragments: &HashMap<i64, Arc<FragmentHandle>>,
    ) -> Result<(), RunnerError> {
        let raw_fragments = payload
            .get("fragments")
            .and_then(Value::as_array)
            .ok_or_else(|| RunnerError::MalformedEvent("start-run event has no fragments".into()))?;
        let inst_artifact = inst_artifact.map(|data| BASE64_STANDARD.encode(data));

        let mut sends = Vec::new();
        for (index, run_fragment) in event.fragments.iter().enumerate() {
            let mut fragment_payload = payload.clone();
            let Some(object) = fragment_payload.as_object_mut() else {
                return Err(RunnerError::MalformedEvent("start-run event is not an object".into()));
            };
            let raw_fragment = raw_fragments.get(index).cloned().ok_or_else(|| {
                RunnerError::MalformedEvent("start-run fragment list out of sync".into())
            })?;
            object.insert("fragments".into(), Value::Array(vec![raw_fragment]));
            if let Some(artifact) = &inst_artifact {
                object.insert("inst_input_artifact".into(), Value::String(artifact.clone()));
            }
            if fragments_with_artifacts.contains(&run_fragment.fragment.object_id) {
                let data = self
                    .client
                    .get_fragment_input_artifact_raw(event.inst.id, run_fragment.fragment.id)
                    .await?;
                object.insert(
                    "fragment_input_artifact".into(),
                    Value::String(BASE64_STANDARD.encode(data)),
                );
            }

            let mut bundle = EventBundle::new();
            bundle.push_raw(StartRunEventRead::EVENT_TYPE, fragment_payload);
            let Some(handle) = fragments.get(&run_fragment.id) else { continue };
            let handle = Arc::clone(handle);
            sends.push(async move { handle.send(bundle, EventDirection::Read).await });
        }

        // Dropping the joined future cancels every in-flight send.
        try_join_all(sends).await?;
        Ok(())
    }

    /// Undo a partially started run: remove it and its callbacks from the
    /// registry, then stop whatever executors were already spawned.
    async fn abort_start(&self, run_id: i64) {
        let handles = self.lock_state_mut(|state| {
            let Some(run) = state.runs.remove(&run_id) else { return Vec::new() };
            if let Some(callback) = run.state_callback {
                state.remove_callback(callback);
            }
            if let Some(callback) = run.artifact_callback {
                state.remove_callback(callback);
            }
            run.handles()
        });
        self.stop_handles(handles).await;
    }

    /// Broadcast a kill or status event to every fragment of a run, with an
    /// aggregator collecting the per-fragment replies into one update.
    ///
    /// Returns false when the run is not registered; the caller answers the
    /// backend with `CANCELLED` instead.
    pub(crate) async fn broadcast_run_event(
        &self,
        run_id: i64,
        event_type: &str,
        payload: &Value,
        update: RunEventUpdate,
    ) -> Result<bool, RunnerError> {
        let handles = self.lock_state_mut(|state| {
            if !state.contains_run(run_id) {
                return None;
            }
            let run = state.runs.get(&run_id)?;
            let handles = run.handles();
            let keys = handles
                .iter()
                .map(|handle| {
                    TableKey::new(handle.id, EventDirection::Update, RunEventUpdate::EVENT_TYPE)
                })
                .collect();
            state.insert_callback(
                CallbackKind::UpdateAggregator(UpdateAggregator::new(
                    update.id,
                    handles.len(),
                    update,
                )),
                keys,
            );
            Some(handles)
        });
        let Some(handles) = handles else { return Ok(false) };

        let mut bundle = EventBundle::new();
        bundle.push_raw(event_type, payload.clone());
        try_join_all(
            handles.iter().map(|handle| handle.send(bundle.clone(), EventDirection::Read)),
        )
        .await?;
        Ok(true)
    }

    async fn spawn_fragment_executor(
        &self,
        config: &FragmentExecutorConfig,
        parameters: &Value,
    ) -> Result<Arc<FragmentHandle>, RunnerError> {
        let executor = config.instantiate();
        executor.start(&config.settings, parameters).await?;
        let id = self.next_handle_id.fetch_add(1, Ordering::Relaxed);
        let handle =
            FragmentHandle::spawn(id, config.name.clone(), executor, self.router_tx.clone());
        tracing::debug!(executor = %config.name, handle = id, "started fragment executor");
        Ok(handle)
    }
}
