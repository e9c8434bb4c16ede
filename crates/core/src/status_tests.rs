// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status enum tests

use super::*;
use yare::parameterized;

#[parameterized(
    spawned = { RunState::Spawned, false },
    starting = { RunState::Starting, false },
    running = { RunState::Running, false },
    completed = { RunState::Completed, true },
    error = { RunState::Error, true },
    cancelled = { RunState::Cancelled, true },
)]
fn terminal_states(state: RunState, terminal: bool) {
    assert_eq!(state.is_terminal(), terminal);
}

#[test]
fn run_state_ordering_puts_terminal_states_last() {
    assert!(RunState::Spawned < RunState::Running);
    assert!(RunState::Running < RunState::Completed);
    assert!(RunState::Completed < RunState::Error);
    assert!(RunState::Error < RunState::Cancelled);
}

#[test]
fn run_state_wire_names_are_screaming_snake() {
    let json = serde_json::to_string(&RunState::Completed).unwrap();
    assert_eq!(json, "\"COMPLETED\"");
    let state: RunState = serde_json::from_str("\"SPAWNED\"").unwrap();
    assert_eq!(state, RunState::Spawned);
}

#[test]
fn event_status_round_trips() {
    let json = serde_json::to_string(&EventStatus::Pending).unwrap();
    assert_eq!(json, "\"PENDING\"");
    let status: EventStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
    assert_eq!(status, EventStatus::Cancelled);
}
