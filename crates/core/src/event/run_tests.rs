// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run event wire-shape tests

use super::*;
use crate::bundle::decode;
use serde_json::json;

#[test]
fn start_run_events_decode_from_the_run_event_head() {
    let payload = json!({
        "id": 50,
        "runner_id": 1,
        "run_id": 7,
        "run_event_type": "START_RUN",
        "system": {"id": 1, "blob": "{}"},
        "simulation": {"id": 2, "blob": "{}"},
        "inst": {"id": 3, "blob": "{\"fragments\": []}"},
        "fragments": [
            {"id": 10, "fragment": {"id": 1001, "object_id": 1, "fragment_executor_tag": null}},
        ],
    });

    // The pump first routes on the head, then decodes the full shape.
    let head: RunEventRead = decode(&payload).unwrap();
    assert_eq!(head.run_event_type, RunEventKind::StartRun);

    let start: StartRunEventRead = decode(&payload).unwrap();
    assert_eq!(start.inst.id, 3);
    assert_eq!(start.fragments.len(), 1);
    assert_eq!(start.fragments[0].fragment.object_id, 1);
    assert!(start.fragments[0].fragment.fragment_executor_tag.is_none());
    assert!(start.inst_input_artifact.is_none());
}

#[test]
fn instantiation_views_ignore_everything_they_do_not_need() {
    let blob = json!({
        "proxies": {"opaque": true},
        "input_artifact_paths": ["inputs/"],
        "fragments": [
            {"id": 1, "parameters": {"cores": 4}, "input_artifact_paths": [], "extra": 1},
            {"id": 2},
        ],
    })
    .to_string();

    let view: InstantiationView = serde_json::from_str(&blob).unwrap();
    assert_eq!(view.input_artifact_paths, vec!["inputs/".to_string()]);
    assert_eq!(view.fragments.len(), 2);
    assert_eq!(view.fragments[0].parameters["cores"], 4);
    assert!(view.fragments[1].parameters.is_empty());
}

#[test]
fn run_event_kinds_use_their_wire_names() {
    assert_eq!(serde_json::to_string(&RunEventKind::Kill).unwrap(), "\"KILL\"");
    assert_eq!(
        serde_json::to_string(&RunEventKind::SimulationStatus).unwrap(),
        "\"SIMULATION_STATUS\""
    );
    let kind: RunEventKind = serde_json::from_str("\"START_RUN\"").unwrap();
    assert_eq!(kind, RunEventKind::StartRun);
}
