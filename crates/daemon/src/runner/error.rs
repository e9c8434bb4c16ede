// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner error types

use splinter_client::ClientError;
use splinter_core::EventError;
use splinter_exec::ExecutorError;
use thiserror::Error;

/// Errors from the runner's pump, router, and run lifecycle
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("backend client error: {0}")]
    Client(#[from] ClientError),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("event error: {0}")]
    Event(#[from] EventError),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("unsupported fragment executor tag {0}")]
    UnknownExecutorTag(String),
    #[error("run {run_id} references unknown instantiation fragment {object_id}")]
    UnknownFragment { run_id: i64, object_id: i64 },
    #[error("invalid instantiation payload: {0}")]
    InvalidInstantiation(String),
    #[error("malformed event payload: {0}")]
    MalformedEvent(String),
    #[error("invalid artifact payload: {0}")]
    InvalidArtifact(String),
    #[error("runner is already running")]
    AlreadyRunning,
    #[error("worker task failed: {0}")]
    Worker(String),
}
