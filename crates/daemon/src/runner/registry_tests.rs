// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run registry tests

use super::*;
use crate::runner::router::RouterMsg;
use splinter_exec::FakeExecutor;
use tokio::sync::mpsc;
use yare::parameterized;

fn run_with_states(states: &[(i64, RunState)]) -> MainRun {
    let (router_tx, _router_rx) = mpsc::channel::<RouterMsg>(8);
    let fragments: HashMap<i64, Arc<FragmentHandle>> = states
        .iter()
        .map(|(fragment_id, _)| {
            let handle = FragmentHandle::spawn(
                *fragment_id as HandleId,
                "local".into(),
                Arc::new(FakeExecutor::new()),
                router_tx.clone(),
            );
            (*fragment_id, handle)
        })
        .collect();
    let mut run = MainRun::new(7, fragments);
    for (fragment_id, state) in states {
        run.fragment_state.insert(*fragment_id, *state);
    }
    run
}

#[tokio::test]
async fn new_runs_start_every_fragment_as_spawned() {
    let run = run_with_states(&[(10, RunState::Spawned), (11, RunState::Spawned)]);
    assert_eq!(run.fragments.len(), run.fragment_state.len());
    assert!(!run.is_finished());
}

#[parameterized(
    all_completed = { &[(10, RunState::Completed), (11, RunState::Completed)], true },
    mixed_terminal = { &[(10, RunState::Error), (11, RunState::Cancelled)], true },
    one_still_running = { &[(10, RunState::Completed), (11, RunState::Running)], false },
    still_starting = { &[(10, RunState::Starting)], false },
)]
#[test_macro(tokio::test)]
async fn finished_means_every_fragment_terminal(states: &[(i64, RunState)], finished: bool) {
    assert_eq!(run_with_states(states).is_finished(), finished);
}

#[tokio::test]
async fn run_of_handle_finds_the_owning_run() {
    let mut state = RunnerState::default();
    let run = run_with_states(&[(10, RunState::Spawned)]);
    let handle_id = run.fragments[&10].id;
    state.runs.insert(7, run);

    assert_eq!(state.run_of_handle(handle_id).map(|run| run.run_id), Some(7));
    assert!(state.run_of_handle(999).is_none());
}
