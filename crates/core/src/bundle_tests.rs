// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bundle tests

use super::*;
use crate::event::{RunnerEventQuery, RunnerEventUpdate};
use crate::status::EventStatus;
use serde_json::json;

#[test]
fn push_files_events_under_their_discriminator() {
    let mut bundle = EventBundle::new();
    bundle
        .push(&RunnerEventUpdate { id: 7, runner_id: 1, event_status: EventStatus::Completed })
        .unwrap();

    assert_eq!(bundle.len(), 1);
    let events = bundle.get("ApiRunnerEventUpdate");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], 7);
}

#[test]
fn raw_payloads_survive_unchanged() {
    let payload = json!({"id": 3, "custom_field": {"nested": [1, 2, 3]}});
    let mut bundle = EventBundle::new();
    bundle.push_raw("SomeExecutorEvent", payload.clone());

    let serialized = serde_json::to_value(&bundle).unwrap();
    assert_eq!(serialized["SomeExecutorEvent"][0], payload);
}

#[test]
fn empty_checks_count_events_not_keys() {
    let mut bundle = EventBundle::new();
    assert!(bundle.is_empty());
    bundle.extend_raw("SomeEvent", Vec::new());
    assert!(bundle.is_empty());
    bundle.push_raw("SomeEvent", json!({}));
    assert!(!bundle.is_empty());
}

#[test]
fn wire_shape_is_a_bare_map() {
    let mut bundle = EventBundle::new();
    bundle
        .push(&RunnerEventQuery { runner_ids: vec![42], event_status: vec![EventStatus::Pending] })
        .unwrap();

    let wire = serde_json::to_string(&bundle).unwrap();
    assert_eq!(
        wire,
        r#"{"ApiRunnerEventQuery":[{"runner_ids":[42],"event_status":["PENDING"]}]}"#
    );

    let parsed: EventBundle = serde_json::from_str(&wire).unwrap();
    assert_eq!(parsed, bundle);
}

#[test]
fn decode_tolerates_extra_fields() {
    let payload = json!({"id": 9, "runner_id": 4, "event_status": "ERROR", "extra": true});
    let update: RunnerEventUpdate = decode(&payload).unwrap();
    assert_eq!(update.id, 9);
    assert_eq!(update.event_status, EventStatus::Error);
}

#[test]
fn decode_reports_the_event_type_on_failure() {
    let payload = json!({"id": "not a number"});
    let err = decode::<RunnerEventUpdate>(&payload).unwrap_err();
    assert!(err.to_string().contains("ApiRunnerEventUpdate"));
}
