// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event and run status enums

use serde::{Deserialize, Serialize};

/// Backend-side lifecycle of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Pending,
    Completed,
    Error,
    Cancelled,
}

/// Per-fragment run state as reported by fragment executors.
///
/// The variant order is meaningful: every state `>= Completed` is terminal,
/// which is what the registry sweep checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Spawned,
    Starting,
    Running,
    Completed,
    Error,
    Cancelled,
}

impl RunState {
    /// True once a fragment can make no further progress.
    pub fn is_terminal(self) -> bool {
        self >= RunState::Completed
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
