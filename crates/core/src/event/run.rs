// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-scoped events: kill, status, and start-run dispatch.

use crate::bundle::WireEvent;
use crate::status::EventStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Subtype of a run-scoped event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunEventKind {
    Kill,
    SimulationStatus,
    StartRun,
}

/// Common head of every run-scoped event fetched from the backend.
///
/// Start-run events carry much more; this view is what the pump needs to
/// route by subtype before deciding whether to decode the full shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEventRead {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_id: Option<i64>,
    pub run_id: i64,
    pub run_event_type: RunEventKind,
}

impl WireEvent for RunEventRead {
    const EVENT_TYPE: &'static str = "ApiRunEventRead";
}

/// Completion report for a run-scoped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEventUpdate {
    pub id: i64,
    pub runner_id: i64,
    pub run_id: i64,
    pub event_status: EventStatus,
}

impl WireEvent for RunEventUpdate {
    const EVENT_TYPE: &'static str = "ApiRunEventUpdate";
}

/// An opaque domain object: a backend id plus its serialized JSON payload.
///
/// The runner never interprets the payload beyond the instantiation view
/// parse; executors receive it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonBlob {
    pub id: i64,
    pub blob: String,
}

/// One fragment declaration inside a start-run event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentRead {
    pub id: i64,
    /// Id of the fragment object inside the instantiation payload.
    pub object_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_executor_tag: Option<String>,
}

/// Binding of a run fragment to its fragment declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFragmentRead {
    pub id: i64,
    pub fragment: FragmentRead,
}

/// Full shape of a start-run event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunEventRead {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_id: Option<i64>,
    pub run_id: i64,
    pub run_event_type: RunEventKind,
    pub system: JsonBlob,
    pub simulation: JsonBlob,
    pub inst: JsonBlob,
    pub fragments: Vec<RunFragmentRead>,
    /// Base64 instantiation input artifact, attached at dispatch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_input_artifact: Option<String>,
    /// Base64 per-fragment input artifact, attached at dispatch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_input_artifact: Option<String>,
}

impl WireEvent for StartRunEventRead {
    const EVENT_TYPE: &'static str = "ApiRunEventStartRunRead";
}

/// Query for pending run events, filtered by subtype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEventQuery {
    pub runner_ids: Vec<i64>,
    pub event_status: Vec<EventStatus>,
    pub run_event_type: Vec<RunEventKind>,
}

impl WireEvent for RunEventQuery {
    const EVENT_TYPE: &'static str = "ApiRunEventQuery";
}

/// Query for pending start-run events.
///
/// Kept separate from [`RunEventQuery`] because start-run events carry large
/// JSON payloads and may be paginated differently by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunEventQuery {
    pub runner_ids: Vec<i64>,
    pub event_status: Vec<EventStatus>,
}

impl WireEvent for StartRunEventQuery {
    const EVENT_TYPE: &'static str = "ApiRunEventStartRunQuery";
}

/// Narrow view of an instantiation payload.
///
/// Only the fields the runner needs: which fragments exist, their executor
/// parameters, and whether input artifacts are declared. Everything else in
/// the payload is executor business.
#[derive(Debug, Clone, Deserialize)]
pub struct InstantiationView {
    #[serde(default)]
    pub input_artifact_paths: Vec<String>,
    #[serde(default)]
    pub fragments: Vec<InstantiationFragmentView>,
}

/// Per-fragment slice of the instantiation view.
#[derive(Debug, Clone, Deserialize)]
pub struct InstantiationFragmentView {
    pub id: i64,
    #[serde(default)]
    pub parameters: serde_json::Map<String, Value>,
    #[serde(default)]
    pub input_artifact_paths: Vec<String>,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
