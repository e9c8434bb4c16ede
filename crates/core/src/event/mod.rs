// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed event shapes and their canonical wire discriminators

mod fragment;
mod run;
mod runner;

pub use fragment::{RunFragmentOutputArtifactEventCreate, RunFragmentStateEventCreate};
pub use run::{
    FragmentRead, InstantiationFragmentView, InstantiationView, JsonBlob, RunEventKind,
    RunEventQuery, RunEventRead, RunEventUpdate, RunFragmentRead, StartRunEventQuery,
    StartRunEventRead,
};
pub use runner::{RunnerEventKind, RunnerEventQuery, RunnerEventRead, RunnerEventUpdate};

use crate::status::EventStatus;
use serde::{Deserialize, Serialize};

/// Direction of an event batch between runner and executor/backend.
///
/// Create/update/delete/query originate from executors and map onto the
/// matching backend RPC; read batches flow from the runner to executors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventDirection {
    #[serde(rename = "ApiEventCreate")]
    Create,
    #[serde(rename = "ApiEventUpdate")]
    Update,
    #[serde(rename = "ApiEventDelete")]
    Delete,
    #[serde(rename = "ApiEventQuery")]
    Query,
    #[serde(rename = "ApiEventRead")]
    Read,
}

impl std::fmt::Display for EventDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventDirection::Create => "create",
            EventDirection::Update => "update",
            EventDirection::Delete => "delete",
            EventDirection::Query => "query",
            EventDirection::Read => "read",
        };
        f.write_str(name)
    }
}

/// The two fields every update-direction event carries, whatever its type.
///
/// Used by the update aggregator, which matches on `id` and folds
/// `event_status` without caring about the rest of the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHead {
    pub id: i64,
    pub event_status: EventStatus,
}

impl crate::bundle::WireEvent for UpdateHead {
    const EVENT_TYPE: &'static str = "ApiEventUpdate";
}
