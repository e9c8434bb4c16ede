// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner-scoped events: work addressed to the runner itself, independent
//! of any run.

use crate::bundle::WireEvent;
use crate::status::EventStatus;
use serde::{Deserialize, Serialize};

/// Subtype of a runner-scoped event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerEventKind {
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

/// A pending runner-scoped event fetched from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerEventRead {
    pub id: i64,
    pub runner_id: i64,
    pub runner_event_type: RunnerEventKind,
}

impl WireEvent for RunnerEventRead {
    const EVENT_TYPE: &'static str = "ApiRunnerEventRead";
}

/// Completion report for a runner-scoped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerEventUpdate {
    pub id: i64,
    pub runner_id: i64,
    pub event_status: EventStatus,
}

impl WireEvent for RunnerEventUpdate {
    const EVENT_TYPE: &'static str = "ApiRunnerEventUpdate";
}

/// Query for pending runner-scoped events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerEventQuery {
    pub runner_ids: Vec<i64>,
    pub event_status: Vec<EventStatus>,
}

impl WireEvent for RunnerEventQuery {
    const EVENT_TYPE: &'static str = "ApiRunnerEventQuery";
}
