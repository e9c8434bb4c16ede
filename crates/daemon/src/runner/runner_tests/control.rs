// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kill, status, and heartbeat scenarios

use super::*;

fn run_event(event_id: i64, run_id: i64, kind: &str) -> Value {
    json!({
        "id": event_id,
        "runner_id": IDENT,
        "run_id": run_id,
        "run_event_type": kind,
    })
}

#[tokio::test]
async fn kill_for_an_unknown_run_is_cancelled_without_executor_traffic() {
    let ctx = setup().await;
    ctx.tick_with("ApiRunEventRead", run_event(60, 999, "KILL")).await;

    let updates = aggregated_updates(&ctx.backend, 60);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["event_status"], "CANCELLED");
    assert_eq!(ctx.hub.created_count(), 0);
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn kill_is_broadcast_and_replies_are_aggregated() {
    let ctx = setup().await;
    let start = start_run_event(50, 7, &[(10, 1, None), (11, 2, None)], inst_blob(&[1, 2]));
    ctx.tick_with("ApiRunEventStartRunRead", start).await;

    ctx.tick_with("ApiRunEventRead", run_event(60, 7, "KILL")).await;

    // Every fragment executor saw the kill as a read bundle.
    let executors = ctx.hub.created();
    for executor in &executors {
        let sent = executor.sent();
        assert_eq!(sent.len(), 2);
        let (direction, bundle) = &sent[1];
        assert_eq!(*direction, EventDirection::Read);
        assert_eq!(bundle.get("ApiRunEventRead")[0]["run_event_type"], "KILL");
    }

    // One reply failed, so the aggregate is an error.
    reply_update(&executors[0], 60, "COMPLETED");
    reply_update(&executors[1], 60, "ERROR");
    wait_for("aggregated kill update", || !aggregated_updates(&ctx.backend, 60).is_empty()).await;

    let updates = aggregated_updates(&ctx.backend, 60);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["event_status"], "ERROR");
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn status_requests_follow_the_same_broadcast_path() {
    let ctx = setup().await;
    let start = start_run_event(50, 7, &[(10, 1, None)], inst_blob(&[1]));
    ctx.tick_with("ApiRunEventStartRunRead", start).await;

    ctx.tick_with("ApiRunEventRead", run_event(61, 7, "SIMULATION_STATUS")).await;

    let executor = &ctx.hub.created()[0];
    reply_update(executor, 61, "COMPLETED");
    wait_for("aggregated status update", || !aggregated_updates(&ctx.backend, 61).is_empty()).await;
    assert_eq!(aggregated_updates(&ctx.backend, 61)[0]["event_status"], "COMPLETED");
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn heartbeat_pings_the_backend_and_completes_in_the_same_tick() {
    let ctx = setup().await;
    ctx.tick_with(
        "ApiRunnerEventRead",
        json!({"id": 70, "runner_id": IDENT, "runner_event_type": "heartbeat"}),
    )
    .await;

    let calls = ctx.backend.calls();
    assert!(calls.iter().any(|call| matches!(call, BackendCall::Heartbeat)));

    let updates: Vec<Value> = ctx
        .backend
        .update_bundles()
        .iter()
        .flat_map(|bundle| bundle.get("ApiRunnerEventUpdate").to_vec())
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["id"], 70);
    assert_eq!(updates[0]["event_status"], "COMPLETED");
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn unknown_event_types_are_dropped_not_fatal() {
    let ctx = setup().await;
    ctx.tick_with("ApiSomethingElseRead", json!({"id": 1})).await;

    // Nothing handled, nothing updated, pump still healthy.
    assert!(ctx.backend.update_bundles().is_empty());
    ctx.runner.tick().await.unwrap();
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn every_tick_queries_runner_run_and_start_run_events() {
    let ctx = setup().await;
    ctx.runner.tick().await.unwrap();

    let queries = match &ctx.backend.calls()[0] {
        BackendCall::FetchEvents { queries } => queries.clone(),
        other => panic!("expected FetchEvents, got {other:?}"),
    };
    assert_eq!(queries.get("ApiRunnerEventQuery").len(), 1);
    let run_query = &queries.get("ApiRunEventQuery")[0];
    assert_eq!(run_query["run_event_type"], json!(["KILL", "SIMULATION_STATUS"]));
    assert_eq!(queries.get("ApiRunEventStartRunQuery").len(), 1);
    assert_eq!(queries.get("ApiRunEventStartRunQuery")[0]["event_status"], json!(["PENDING"]));
    ctx.shutdown_router().await;
}
