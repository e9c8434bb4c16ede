// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner lifecycle scenarios: announce, cancel, teardown

use super::*;

#[tokio::test]
async fn run_announces_the_configured_tags_and_honors_cancellation() {
    let (runner, backend, _hub) = build(DEFAULT_CONFIG);

    let worker = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run().await })
    };
    wait_for("runner announce", || {
        backend.calls().iter().any(|call| matches!(call, BackendCall::RunnerStarted { .. }))
    })
    .await;

    let tags = backend
        .calls()
        .iter()
        .find_map(|call| match call {
            BackendCall::RunnerStarted { tags } => Some(tags.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(tags, vec!["local".to_string(), "docker".to_string()]);

    runner.cancel_token().cancel();
    worker.await.unwrap().unwrap();
}

#[tokio::test]
async fn cancellation_stops_live_executors_during_teardown() {
    let (runner, backend, hub) = build(DEFAULT_CONFIG);

    // The first pump tick inside run() picks this up and starts the run.
    let mut bundle = EventBundle::new();
    bundle.push_raw(
        "ApiRunEventStartRunRead",
        start_run_event(50, 7, &[(10, 1, None)], inst_blob(&[1])),
    );
    backend.queue_fetch_reply(bundle);

    let worker = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run().await })
    };
    wait_for("executor spawned", || hub.created_count() == 1).await;

    runner.cancel_token().cancel();
    worker.await.unwrap().unwrap();
    assert!(hub.created()[0].stopped());
    runner.lock_state(|state| assert!(state.runs.is_empty()));
}

#[tokio::test]
async fn a_runner_cannot_be_run_twice() {
    let (runner, _backend, _hub) = build(DEFAULT_CONFIG);
    runner.cancel_token().cancel();
    Arc::clone(&runner).run().await.unwrap();

    let result = runner.run().await;
    assert!(matches!(result, Err(RunnerError::AlreadyRunning)));
}
