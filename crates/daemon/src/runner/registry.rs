// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active-run registry and shared runner state

use super::callback::{CallbackArena, CallbackId, TableKey};
use super::handle::{FragmentHandle, HandleId};
use splinter_core::RunState;
use std::collections::HashMap;
use std::sync::Arc;

/// One active run: its fragment executors and their last reported states.
pub(crate) struct MainRun {
    pub run_id: i64,
    /// run_fragment_id → executor handle. Fixed at construction; the state
    /// map always holds exactly the same keys.
    pub fragments: HashMap<i64, Arc<FragmentHandle>>,
    pub fragment_state: HashMap<i64, RunState>,
    pub state_callback: Option<CallbackId>,
    pub artifact_callback: Option<CallbackId>,
}

impl MainRun {
    pub fn new(run_id: i64, fragments: HashMap<i64, Arc<FragmentHandle>>) -> Self {
        let fragment_state =
            fragments.keys().map(|fragment_id| (*fragment_id, RunState::Spawned)).collect();
        Self {
            run_id,
            fragments,
            fragment_state,
            state_callback: None,
            artifact_callback: None,
        }
    }

    /// A run is finished once every fragment reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.fragment_state.values().all(|state| state.is_terminal())
    }

    pub fn handles(&self) -> Vec<Arc<FragmentHandle>> {
        self.fragments.values().cloned().collect()
    }
}

/// Everything the pump and the router share, behind one mutex.
///
/// The lock is only ever held for synchronous work; backend and executor
/// calls happen outside it.
#[derive(Default)]
pub(crate) struct RunnerState {
    pub runs: HashMap<i64, MainRun>,
    pub arena: CallbackArena,
    pub tables: HashMap<TableKey, Vec<CallbackId>>,
}

impl RunnerState {
    pub fn contains_run(&self, run_id: i64) -> bool {
        self.runs.contains_key(&run_id)
    }

    /// Find the run owning a fragment executor handle.
    pub fn run_of_handle(&mut self, handle: HandleId) -> Option<&mut MainRun> {
        self.runs
            .values_mut()
            .find(|run| run.fragments.values().any(|fragment| fragment.id == handle))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
