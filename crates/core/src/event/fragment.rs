// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor-originated fragment events the runner intercepts.

use crate::bundle::WireEvent;
use crate::status::RunState;
use serde::{Deserialize, Serialize};

/// State transition of one run fragment, reported by its executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFragmentStateEventCreate {
    pub run_id: i64,
    pub run_fragment_id: i64,
    pub run_state: RunState,
}

impl WireEvent for RunFragmentStateEventCreate {
    const EVENT_TYPE: &'static str = "ApiRunFragmentStateEventCreate";
}

/// Output artifact produced by one run fragment.
///
/// The artifact bytes travel base64-encoded in `output_artifact`; the runner
/// uploads them out-of-band and never forwards this event to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFragmentOutputArtifactEventCreate {
    pub run_id: i64,
    pub run_fragment_id: i64,
    pub output_artifact: String,
    pub output_artifact_name: String,
}

impl WireEvent for RunFragmentOutputArtifactEventCreate {
    const EVENT_TYPE: &'static str = "ApiRunFragmentOutputArtifactEventCreate";
}
