// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry sweep scenarios

use super::*;

#[tokio::test]
async fn completed_runs_are_torn_down_on_the_next_tick() {
    let ctx = setup().await;
    let start = start_run_event(50, 7, &[(10, 1, None), (11, 2, None)], inst_blob(&[1, 2]));
    ctx.tick_with("ApiRunEventStartRunRead", start).await;

    let executors = ctx.hub.created();
    report_state(&executors[0], 7, 10, "COMPLETED");
    report_state(&executors[1], 7, 11, "COMPLETED");
    wait_for("both fragments completed", || {
        ctx.fragment_states(7) == Some(vec![RunState::Completed, RunState::Completed])
    })
    .await;

    // State creates pass through to the backend as well.
    let forwarded: usize = ctx
        .backend
        .calls()
        .iter()
        .filter_map(|call| match call {
            BackendCall::CreateEvents { bundle } => {
                Some(bundle.get("ApiRunFragmentStateEventCreate").len())
            }
            _ => None,
        })
        .sum();
    assert_eq!(forwarded, 2);

    // Run is still registered until the pump sweeps it.
    assert_eq!(ctx.run_count(), 1);
    ctx.runner.tick().await.unwrap();

    assert_eq!(ctx.run_count(), 0);
    for executor in &executors {
        assert!(executor.stopped());
    }
    // Callback tables are empty again: nothing left to leak.
    ctx.runner.lock_state(|state| {
        assert!(state.tables.is_empty());
        assert!(state.arena.entries.is_empty());
    });
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn runs_with_a_non_terminal_fragment_stay_registered() {
    let ctx = setup().await;
    let start = start_run_event(50, 7, &[(10, 1, None), (11, 2, None)], inst_blob(&[1, 2]));
    ctx.tick_with("ApiRunEventStartRunRead", start).await;

    let executors = ctx.hub.created();
    report_state(&executors[0], 7, 10, "COMPLETED");
    report_state(&executors[1], 7, 11, "RUNNING");
    wait_for("fragment states tracked", || {
        ctx.fragment_states(7) == Some(vec![RunState::Completed, RunState::Running])
    })
    .await;

    ctx.runner.tick().await.unwrap();
    assert_eq!(ctx.run_count(), 1);
    for executor in &executors {
        assert!(!executor.stopped());
    }
    ctx.shutdown_router().await;
}

#[tokio::test]
async fn mixed_terminal_states_still_finish_the_run() {
    let ctx = setup().await;
    let start = start_run_event(50, 7, &[(10, 1, None), (11, 2, None)], inst_blob(&[1, 2]));
    ctx.tick_with("ApiRunEventStartRunRead", start).await;

    let executors = ctx.hub.created();
    report_state(&executors[0], 7, 10, "ERROR");
    report_state(&executors[1], 7, 11, "CANCELLED");
    wait_for("both fragments terminal", || {
        ctx.fragment_states(7) == Some(vec![RunState::Error, RunState::Cancelled])
    })
    .await;

    ctx.runner.tick().await.unwrap();
    assert_eq!(ctx.run_count(), 0);
    ctx.shutdown_router().await;
}
