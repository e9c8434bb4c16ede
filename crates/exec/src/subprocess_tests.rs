// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess executor tests

use super::*;
use serde_json::json;

#[tokio::test]
async fn frames_round_trip_through_a_cat_child() {
    let executor = SubprocessExecutor::new();
    // `cat` echoes every frame back unchanged.
    executor
        .start(&json!({"command": "cat"}), &json!({"cores": 2}))
        .await
        .unwrap();

    let mut bundle = EventBundle::new();
    bundle.push_raw("SomeEvent", json!({"id": 1}));
    executor.send_events(bundle.clone(), EventDirection::Read).await.unwrap();

    let (direction, received) = executor.get_events().await.unwrap();
    assert_eq!(direction, EventDirection::Read);
    assert_eq!(received, bundle);

    executor.stop().await.unwrap();
}

#[tokio::test]
async fn missing_command_is_an_invalid_settings_error() {
    let executor = SubprocessExecutor::new();
    let err = executor.start(&json!({}), &json!({})).await.unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidSettings(_)));
}

#[tokio::test]
async fn get_events_fails_once_the_child_exits() {
    let executor = SubprocessExecutor::new();
    executor.start(&json!({"command": "true"}), &json!({})).await.unwrap();
    let err = executor.get_events().await.unwrap_err();
    assert!(matches!(err, ExecutorError::StreamClosed(_)));
}

#[tokio::test]
async fn stop_is_safe_before_start() {
    let executor = SubprocessExecutor::new();
    executor.stop().await.unwrap();
}
