// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! splinter-core: wire-level event model for the Splinter runner
//!
//! Everything the backend and the fragment executors exchange is an *event
//! bundle*: a map from a canonical event-type discriminator to a list of
//! event payloads. This crate defines the bundle, the discriminators, the
//! status enums, and the typed shapes of the events the runner itself
//! inspects. Payloads the runner only routes stay as raw JSON so they reach
//! the backend byte-for-byte.

pub mod bundle;
pub mod event;
pub mod status;

pub use bundle::{decode, EventBundle, EventError, WireEvent};
pub use event::{
    EventDirection, FragmentRead, InstantiationFragmentView, InstantiationView, JsonBlob,
    RunEventKind, RunEventQuery, RunEventRead, RunEventUpdate,
    RunFragmentOutputArtifactEventCreate, RunFragmentRead, RunFragmentStateEventCreate,
    RunnerEventKind, RunnerEventQuery, RunnerEventRead, RunnerEventUpdate, StartRunEventQuery,
    StartRunEventRead, UpdateHead,
};
pub use status::{EventStatus, RunState};
