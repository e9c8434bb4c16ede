// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner scenario tests
//!
//! Each test drives the pump by hand (`tick`) while the router worker runs
//! in the background, with a fake backend feeding events in and fake
//! executors on the other side.

mod control;
mod lifecycle;
mod routing;
mod start;
mod sweep;

use super::*;
use serde_json::{json, Value};
use splinter_client::{BackendCall, FakeBackendClient};
use splinter_core::{EventBundle, EventDirection, RunState};
use splinter_exec::{ExecutorConfigs, FakeExecutor, FakeExecutorHub, PluginRegistry};
use std::time::Duration;

const IDENT: i64 = 1;
const INST_ID: i64 = 300;

pub(crate) struct TestContext {
    pub runner: Arc<MainRunner>,
    pub backend: FakeBackendClient,
    pub hub: FakeExecutorHub,
    router: tokio::task::JoinHandle<Result<(), RunnerError>>,
}

const DEFAULT_CONFIG: &str = "
fragment_executors:
  - local:
      plugin: splinter.plugins.fake
      settings:
        flavor: local
  - docker:
      plugin: splinter.plugins.fake
";

/// Build a runner over fake backend and executors and launch its router.
pub(crate) async fn setup() -> TestContext {
    setup_with(DEFAULT_CONFIG).await
}

/// Build a runner over fake backend and executors, leaving its workers to
/// the caller.
pub(crate) fn build(config_yaml: &str) -> (Arc<MainRunner>, FakeBackendClient, FakeExecutorHub) {
    let hub = FakeExecutorHub::new();
    let mut registry = PluginRegistry::new();
    registry.register("splinter.plugins.fake", {
        let factory = hub.factory();
        move || (*factory)()
    });
    let configs = ExecutorConfigs::parse(config_yaml, &registry).unwrap();

    let backend = FakeBackendClient::new();
    let runner =
        MainRunner::new(Arc::new(backend.clone()), configs, IDENT, Duration::from_secs(1));
    (runner, backend, hub)
}

pub(crate) async fn setup_with(config_yaml: &str) -> TestContext {
    let (runner, backend, hub) = build(config_yaml);

    let router_rx = runner.router_rx.lock().take().unwrap();
    let router = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.router_loop(router_rx).await })
    };

    TestContext { runner, backend, hub, router }
}

impl TestContext {
    /// Queue one fetched event under its discriminator and run a tick.
    pub async fn tick_with(&self, event_type: &str, event: Value) {
        let mut bundle = EventBundle::new();
        bundle.push_raw(event_type, event);
        self.backend.queue_fetch_reply(bundle);
        self.runner.tick().await.unwrap();
    }

    /// Fragment states of a registered run.
    pub fn fragment_states(&self, run_id: i64) -> Option<Vec<RunState>> {
        self.runner.lock_state(|state| {
            state.runs.get(&run_id).map(|run| {
                let mut fragment_ids: Vec<i64> = run.fragment_state.keys().copied().collect();
                fragment_ids.sort_unstable();
                fragment_ids.iter().map(|id| run.fragment_state[id]).collect()
            })
        })
    }

    pub fn run_count(&self) -> usize {
        self.runner.lock_state(|state| state.runs.len())
    }

    /// Stop the router and assert it exited cleanly.
    pub async fn shutdown_router(self) {
        self.runner.cancel.cancel();
        self.router.await.unwrap().unwrap();
    }
}

/// Poll until `cond` holds; the router runs concurrently, so effects land
/// a few scheduler turns after the executor emits.
pub(crate) async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Start-run event payload with the given `(run_fragment_id, object_id,
/// executor tag)` triples.
pub(crate) fn start_run_event(
    event_id: i64,
    run_id: i64,
    fragments: &[(i64, i64, Option<&str>)],
    inst_blob: Value,
) -> Value {
    let fragment_entries: Vec<Value> = fragments
        .iter()
        .map(|(run_fragment_id, object_id, tag)| {
            json!({
                "id": run_fragment_id,
                "fragment": {
                    "id": object_id + 1000,
                    "object_id": object_id,
                    "fragment_executor_tag": tag,
                },
            })
        })
        .collect();
    json!({
        "id": event_id,
        "runner_id": IDENT,
        "run_id": run_id,
        "run_event_type": "START_RUN",
        "system": {"id": 1, "blob": "{}"},
        "simulation": {"id": 2, "blob": "{}"},
        "inst": {"id": INST_ID, "blob": inst_blob.to_string()},
        "fragments": fragment_entries,
    })
}

/// Instantiation blob declaring the given fragment object ids.
pub(crate) fn inst_blob(object_ids: &[i64]) -> Value {
    json!({
        "fragments": object_ids
            .iter()
            .map(|id| json!({"id": id, "parameters": {"object": id}}))
            .collect::<Vec<_>>(),
    })
}

/// Executor-side update reply for a dispatched run event.
pub(crate) fn reply_update(executor: &FakeExecutor, event_id: i64, status: &str) {
    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunEventUpdate",
        json!({"id": event_id, "runner_id": IDENT, "event_status": status}),
    );
    executor.emit(EventDirection::Update, bundle);
}

/// Executor-side fragment state report.
pub(crate) fn report_state(executor: &FakeExecutor, run_id: i64, fragment_id: i64, state: &str) {
    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunFragmentStateEventCreate",
        json!({"run_id": run_id, "run_fragment_id": fragment_id, "run_state": state}),
    );
    executor.emit(EventDirection::Create, bundle);
}

/// The single aggregated update for `event_id`, once it arrived.
pub(crate) fn aggregated_updates(backend: &FakeBackendClient, event_id: i64) -> Vec<Value> {
    backend
        .update_bundles()
        .iter()
        .flat_map(|bundle| bundle.get("ApiRunEventUpdate").to_vec())
        .filter(|event| event["id"] == event_id)
        .collect()
}
