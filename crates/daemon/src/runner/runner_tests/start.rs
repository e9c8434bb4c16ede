// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-run scenarios

use super::*;
use base64::prelude::{Engine, BASE64_STANDARD};

#[tokio::test]
async fn two_fragment_run_spawns_two_executors_and_aggregates_one_update() {
    let ctx = setup().await;
    let event = start_run_event(50, 7, &[(10, 1, None), (11, 2, Some("local"))], inst_blob(&[1, 2]));
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    // Two executors, both started, run registered with every fragment SPAWNED.
    assert_eq!(ctx.hub.created_count(), 2);
    let executors = ctx.hub.created();
    for executor in &executors {
        assert!(executor.started());
    }
    assert_eq!(
        ctx.fragment_states(7),
        Some(vec![RunState::Spawned, RunState::Spawned])
    );

    // Each executor got exactly its own fragment in the start bundle.
    for (executor, fragment_id) in executors.iter().zip([10, 11]) {
        let sent = executor.sent();
        assert_eq!(sent.len(), 1);
        let (direction, bundle) = &sent[0];
        assert_eq!(*direction, EventDirection::Read);
        let events = bundle.get("ApiRunEventStartRunRead");
        assert_eq!(events.len(), 1);
        let fragments = events[0]["fragments"].as_array().unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0]["id"], fragment_id);
    }

    // No start update until both executors answered.
    assert!(aggregated_updates(&ctx.backend, 50).is_empty());
    reply_update(&executors[0], 50, "COMPLETED");
    reply_update(&executors[1], 50, "COMPLETED");
    wait_for("aggregated start update", || !aggregated_updates(&ctx.backend, 50).is_empty()).await;

    let updates = aggregated_updates(&ctx.backend, 50);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["event_status"], "COMPLETED");
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn fragment_parameters_come_from_the_instantiation() {
    let ctx = setup().await;
    let event = start_run_event(50, 7, &[(10, 1, None)], inst_blob(&[1]));
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    let executor = &ctx.hub.created()[0];
    let (settings, parameters) = executor.start_args().unwrap();
    assert_eq!(settings["flavor"], "local");
    assert_eq!(parameters["object"], 1);
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn unknown_tag_fails_the_start_and_leaks_nothing() {
    let ctx = setup_with(
        "
fragment_executors:
  - local:
      plugin: splinter.plugins.fake
",
    )
    .await;
    let event =
        start_run_event(50, 7, &[(10, 1, None), (11, 2, Some("docker"))], inst_blob(&[1, 2]));
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    // The run failed outright and the backend heard about it.
    assert!(ctx
        .backend
        .calls()
        .iter()
        .any(|call| matches!(call, BackendCall::UpdateRun { run_id: 7, state: RunState::Error, .. })));
    let updates = aggregated_updates(&ctx.backend, 50);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["event_status"], "ERROR");

    // The already-spawned executor for fragment 10 was stopped again.
    assert_eq!(ctx.run_count(), 0);
    assert_eq!(ctx.hub.created_count(), 1);
    assert!(ctx.hub.created()[0].stopped());
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn duplicate_start_for_a_registered_run_is_cancelled() {
    let ctx = setup().await;
    let event = start_run_event(50, 7, &[(10, 1, None)], inst_blob(&[1]));
    ctx.tick_with("ApiRunEventStartRunRead", event.clone()).await;
    assert_eq!(ctx.run_count(), 1);

    let refetched = start_run_event(51, 7, &[(10, 1, None)], inst_blob(&[1]));
    ctx.tick_with("ApiRunEventStartRunRead", refetched).await;

    let updates = aggregated_updates(&ctx.backend, 51);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["event_status"], "CANCELLED");
    // Still exactly one executor: the duplicate spawned nothing.
    assert_eq!(ctx.hub.created_count(), 1);
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn malformed_instantiation_fails_the_start() {
    let ctx = setup().await;
    let mut event = start_run_event(50, 7, &[(10, 1, None)], inst_blob(&[1]));
    event["inst"]["blob"] = serde_json::Value::String("not json".into());
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    assert_eq!(ctx.run_count(), 0);
    let updates = aggregated_updates(&ctx.backend, 50);
    assert_eq!(updates[0]["event_status"], "ERROR");
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn inst_artifact_is_fetched_once_and_broadcast_to_every_fragment() {
    let ctx = setup().await;
    ctx.backend.set_inst_artifact(INST_ID, b"inst artifact".to_vec());
    let blob = serde_json::json!({
        "input_artifact_paths": ["inputs/"],
        "fragments": [
            {"id": 1, "parameters": {}},
            {"id": 2, "parameters": {}},
        ],
    });
    let event = start_run_event(50, 7, &[(10, 1, None), (11, 2, None)], blob);
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    let fetches = ctx
        .backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::GetInstArtifact { inst_id } if *inst_id == INST_ID))
        .count();
    assert_eq!(fetches, 1);

    let expected = BASE64_STANDARD.encode(b"inst artifact");
    for executor in ctx.hub.created() {
        let sent = executor.sent();
        let events = sent[0].1.get("ApiRunEventStartRunRead");
        assert_eq!(events[0]["inst_input_artifact"], expected);
    }
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn fragment_artifacts_only_reach_their_own_fragment() {
    let ctx = setup().await;
    // Run-fragment 11 binds fragment object 2, whose wire id is object+1000.
    ctx.backend.set_fragment_artifact(INST_ID, 1002, b"frag".to_vec());
    let blob = serde_json::json!({
        "fragments": [
            {"id": 1, "parameters": {}},
            {"id": 2, "parameters": {}, "input_artifact_paths": ["inputs/"]},
        ],
    });
    let event = start_run_event(50, 7, &[(10, 1, None), (11, 2, None)], blob);
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    let executors = ctx.hub.created();
    let first = executors[0].sent()[0].1.clone();
    assert!(first.get("ApiRunEventStartRunRead")[0].get("fragment_input_artifact").is_none());
    let second = executors[1].sent()[0].1.clone();
    assert_eq!(
        second.get("ApiRunEventStartRunRead")[0]["fragment_input_artifact"],
        BASE64_STANDARD.encode(b"frag")
    );
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn missing_instantiation_fragment_fails_the_start() {
    let ctx = setup().await;
    // Object id 1 is not declared by the instantiation blob.
    let event = start_run_event(50, 7, &[(10, 1, None)], serde_json::json!({"fragments": []}));
    ctx.tick_with("ApiRunEventStartRunRead", event).await;

    assert_eq!(ctx.run_count(), 0);
    let updates = aggregated_updates(&ctx.backend, 50);
    assert_eq!(updates[0]["event_status"], "ERROR");
    ctx.shutdown_router().await;
}
