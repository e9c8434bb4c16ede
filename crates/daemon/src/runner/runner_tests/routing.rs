// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor event routing scenarios

use super::*;
use base64::prelude::{Engine, BASE64_STANDARD};

async fn setup_with_run(run_id: i64) -> (TestContext, FakeExecutor) {
    let ctx = setup().await;
    let start = start_run_event(50, run_id, &[(10, 1, None)], inst_blob(&[1]));
    ctx.tick_with("ApiRunEventStartRunRead", start).await;
    let executor = ctx.hub.created()[0].clone();
    (ctx, executor)
}

#[tokio::test]
async fn output_artifacts_are_uploaded_and_never_forwarded() {
    let (ctx, executor) = setup_with_run(7).await;

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
    executor.emit(EventDirection::Create, bundle);

    wait_for("artifact upload", || {
        ctx.backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::SetOutputArtifact { .. }))
    })
    .await;

    let calls = ctx.backend.calls();
    let upload = calls
        .iter()
        .find_map(|call| match call {
            BackendCall::SetOutputArtifact { run_fragment_id, name, data } => {
                Some((*run_fragment_id, name.clone(), data.clone()))
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(upload, (10, "out.bin".to_string(), b"hello".to_vec()));

    // The blob never travels through the event channel.
    assert!(!calls.iter().any(|call| matches!(call, BackendCall::CreateEvents { .. })));
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn unmatched_creates_pass_through_and_replies_return_to_the_executor() {
    let (ctx, executor) = setup_with_run(7).await;

    let mut reply = EventBundle::new();
    reply.push_raw("ApiProxyEventRead", json!({"id": 900}));
    ctx.backend.queue_create_reply(reply);

    let mut bundle = EventBundle::new();
    bundle.push_raw("ApiProxyEventCreate", json!({"payload": "opaque"}));
    executor.emit(EventDirection::Create, bundle);

    wait_for("create passthrough", || {
        ctx.backend
            .calls()
            .iter()
            .any(|call| matches!(call, BackendCall::CreateEvents { .. }))
    })
    .await;
    // The executor got the server-assigned read events back.
    wait_for("read reply", || executor.sent().len() > 1).await;
    let sent = executor.sent();
    let (direction, reply) = &sent[1];
    assert_eq!(*direction, EventDirection::Read);
    assert_eq!(reply.get("ApiProxyEventRead")[0]["id"], 900);
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn update_passthrough_returns_nothing_to_the_executor() {
    let (ctx, executor) = setup_with_run(7).await;

    let mut bundle = EventBundle::new();
    bundle.push_raw("ApiProxyEventUpdate", json!({"id": 5, "event_status": "COMPLETED"}));
    executor.emit(EventDirection::Update, bundle);

    wait_for("update passthrough", || !ctx.backend.update_bundles().is_empty()).await;
    assert_eq!(executor.sent().len(), 1);
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn read_events_from_an_executor_kill_the_router() {
    let (ctx, executor) = setup_with_run(7).await;

    executor.emit(EventDirection::Read, EventBundle::new());

    let result = ctx.router.await.unwrap();
    assert!(matches!(result, Err(RunnerError::Protocol(_))));
}

#[tokio::test]
async fn a_lost_executor_fails_its_run_and_the_sweep_reaps_it() {
    let (ctx, executor) = setup_with_run(7).await;

    executor.close_stream();

    wait_for("run failure report", || {
        ctx.backend.calls().iter().any(|call| {
            matches!(call, BackendCall::UpdateRun { run_id: 7, state: RunState::Error, .. })
        })
    })
    .await;
    assert_eq!(ctx.fragment_states(7), Some(vec![RunState::Error]));

    // Next tick sweeps the failed run and stops the executor.
    ctx.runner.tick().await.unwrap();
    assert_eq!(ctx.run_count(), 0);
    assert!(executor.stopped());
    ctx.shutdown_router().await;
}
