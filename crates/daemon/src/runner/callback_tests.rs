// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback table tests

use super::*;
use crate::runner::handle::FragmentHandle;
use crate::runner::registry::MainRun;
use serde_json::json;
use splinter_core::RunState;
use splinter_exec::FakeExecutor;
use std::sync::Arc;
use tokio::sync::mpsc;

fn test_handle(id: HandleId) -> Arc<FragmentHandle> {
    let (router_tx, _router_rx) = mpsc::channel(8);
    FragmentHandle::spawn(id, "local".into(), Arc::new(FakeExecutor::new()), router_tx)
}

fn update_stub(event_id: i64, run_id: i64) -> RunEventUpdate {
    RunEventUpdate { id: event_id, runner_id: 1, run_id, event_status: EventStatus::Pending }
}

fn aggregator(event_id: i64, arity: usize) -> CallbackKind {
    CallbackKind::UpdateAggregator(UpdateAggregator::new(event_id, arity, update_stub(event_id, 7)))
}

fn update_event(event_id: i64, status: &str) -> EventBundle {
    let mut bundle = EventBundle::new();
    bundle.push_raw("ApiRunEventUpdate", json!({"id": event_id, "event_status": status}));
    bundle
}

fn update_keys(handles: &[&Arc<FragmentHandle>]) -> Vec<TableKey> {
    handles
        .iter()
        .map(|handle| TableKey::new(handle.id, EventDirection::Update, "ApiRunEventUpdate"))
        .collect()
}

#[tokio::test]
async fn aggregator_sends_one_update_after_the_last_reply() {
    let mut state = RunnerState::default();
    let (a, b) = (test_handle(1), test_handle(2));
    state.insert_callback(aggregator(50, 2), update_keys(&[&a, &b]));

    let (passthrough, effects) = state
        .apply_callbacks(a.id, EventDirection::Update, update_event(50, "COMPLETED"))
        .unwrap();
    assert!(passthrough.is_empty());
    assert!(effects.is_empty());

    let (passthrough, mut effects) = state
        .apply_callbacks(b.id, EventDirection::Update, update_event(50, "COMPLETED"))
        .unwrap();
    assert!(passthrough.is_empty());
    assert_eq!(effects.len(), 1);
    match effects.pop() {
        Some(CallbackEffect::SendUpdate(update)) => {
            let events = update.get("ApiRunEventUpdate");
            assert_eq!(events.len(), 1);
            assert_eq!(events[0]["id"], 50);
            assert_eq!(events[0]["event_status"], "COMPLETED");
        }
        _ => panic!("expected SendUpdate"),
    }

    // Gone from the arena and from every table.
    assert!(state.arena.entries.is_empty());
    assert!(state.tables.is_empty());
}

#[tokio::test]
async fn aggregator_reports_error_if_any_reply_failed() {
    let mut state = RunnerState::default();
    let (a, b) = (test_handle(1), test_handle(2));
    state.insert_callback(aggregator(50, 2), update_keys(&[&a, &b]));

    state.apply_callbacks(a.id, EventDirection::Update, update_event(50, "ERROR")).unwrap();
    let (_, effects) = state
        .apply_callbacks(b.id, EventDirection::Update, update_event(50, "COMPLETED"))
        .unwrap();

    match effects.first() {
        Some(CallbackEffect::SendUpdate(update)) => {
            assert_eq!(update.get("ApiRunEventUpdate")[0]["event_status"], "ERROR");
        }
        _ => panic!("expected SendUpdate"),
    }
}

#[tokio::test]
async fn aggregator_ignores_updates_for_other_events() {
    let mut state = RunnerState::default();
    let a = test_handle(1);
    state.insert_callback(aggregator(50, 1), update_keys(&[&a]));

    let (passthrough, effects) = state
        .apply_callbacks(a.id, EventDirection::Update, update_event(99, "COMPLETED"))
        .unwrap();

    // Unmatched events are forwarded to the backend unchanged.
    assert_eq!(passthrough.get("ApiRunEventUpdate").len(), 1);
    assert!(effects.is_empty());
    assert_eq!(state.arena.entries.len(), 1);
}

#[tokio::test]
async fn state_tracker_updates_the_run_and_passes_through() {
    let mut state = RunnerState::default();
    let a = test_handle(1);
    let run_id = 7;
    let fragments = [(10, Arc::clone(&a))].into_iter().collect();
    state.runs.insert(run_id, MainRun::new(run_id, fragments));
    state.insert_callback(
        CallbackKind::FragmentStateTracker { run_id },
        vec![TableKey::new(a.id, EventDirection::Create, "ApiRunFragmentStateEventCreate")],
    );

    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunFragmentStateEventCreate",
        json!({"run_id": 7, "run_fragment_id": 10, "run_state": "RUNNING"}),
    );
    let (passthrough, effects) = state.apply_callbacks(a.id, EventDirection::Create, bundle).unwrap();

    assert_eq!(passthrough.get("ApiRunFragmentStateEventCreate").len(), 1);
    assert!(effects.is_empty());
    assert_eq!(state.runs[&run_id].fragment_state[&10], RunState::Running);
}

#[tokio::test]
async fn state_tracker_skips_other_runs() {
    let mut state = RunnerState::default();
    let a = test_handle(1);
    state.insert_callback(
        CallbackKind::FragmentStateTracker { run_id: 7 },
        vec![TableKey::new(a.id, EventDirection::Create, "ApiRunFragmentStateEventCreate")],
    );

    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunFragmentStateEventCreate",
        json!({"run_id": 8, "run_fragment_id": 10, "run_state": "RUNNING"}),
    );
    let (passthrough, _) = state.apply_callbacks(a.id, EventDirection::Create, bundle).unwrap();

    // No callback matched, so the event still reaches the backend.
    assert_eq!(passthrough.get("ApiRunFragmentStateEventCreate").len(), 1);
}

#[tokio::test]
async fn artifact_uploader_consumes_the_event_and_decodes_the_payload() {
    let mut state = RunnerState::default();
    let a = test_handle(1);
    state.insert_callback(
        CallbackKind::ArtifactUploader { run_id: 7 },
        vec![TableKey::new(a.id, EventDirection::Create, "ApiRunFragmentOutputArtifactEventCreate")],
    );

    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunFragmentOutputArtifactEventCreate",
        json!({
            "run_id": 7,
            "run_fragment_id": 10,
            "output_artifact": BASE64_STANDARD.encode(b"hello"),
            "output_artifact_name": "out.bin",
        }),
    );
    let (passthrough, effects) = state.apply_callbacks(a.id, EventDirection::Create, bundle).unwrap();

    assert!(passthrough.is_empty());
    match effects.first() {
        Some(CallbackEffect::UploadArtifact { run_fragment_id, name, data }) => {
            assert_eq!(*run_fragment_id, 10);
            assert_eq!(name, "out.bin");
            assert_eq!(data, b"hello");
        }
        _ => panic!("expected UploadArtifact"),
    }
}

#[tokio::test]
async fn artifact_uploader_rejects_invalid_base64() {
    let mut state = RunnerState::default();
    let a = test_handle(1);
    state.insert_callback(
        CallbackKind::ArtifactUploader { run_id: 7 },
        vec![TableKey::new(a.id, EventDirection::Create, "ApiRunFragmentOutputArtifactEventCreate")],
    );

    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunFragmentOutputArtifactEventCreate",
        json!({
            "run_id": 7,
            "run_fragment_id": 10,
            "output_artifact": "%%% not base64 %%%",
            "output_artifact_name": "out.bin",
        }),
    );
    let err = state.apply_callbacks(a.id, EventDirection::Create, bundle).unwrap_err();
    assert!(matches!(err, RunnerError::InvalidArtifact(_)));
}

#[tokio::test]
async fn events_without_any_table_row_pass_through() {
    let mut state = RunnerState::default();
    let a = test_handle(1);

    let mut bundle = EventBundle::new();
    bundle.push_raw("SomeExecutorEvent", json!({"anything": [1, 2, 3]}));
    let (passthrough, effects) = state.apply_callbacks(a.id, EventDirection::Create, bundle).unwrap();

    assert_eq!(passthrough.get("SomeExecutorEvent")[0]["anything"], json!([1, 2, 3]));
    assert!(effects.is_empty());
}

#[tokio::test]
async fn remove_callback_is_idempotent() {
    let mut state = RunnerState::default();
    let (a, b) = (test_handle(1), test_handle(2));
    let id = state.insert_callback(aggregator(50, 2), update_keys(&[&a, &b]));

    state.remove_callback(id);
    assert!(state.arena.entries.is_empty());
    assert!(state.tables.is_empty());
    state.remove_callback(id);
}

#[tokio::test]
async fn clearing_handle_tables_drops_fully_unregistered_callbacks() {
    let mut state = RunnerState::default();
    let (a, b) = (test_handle(1), test_handle(2));
    state.insert_callback(aggregator(50, 2), update_keys(&[&a, &b]));

    state.clear_handle_tables(a.id);
    // Still registered through handle b.
    assert_eq!(state.arena.entries.len(), 1);

    state.clear_handle_tables(b.id);
    assert!(state.arena.entries.is_empty());
    assert!(state.tables.is_empty());
}
