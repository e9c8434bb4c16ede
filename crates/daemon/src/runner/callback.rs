// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback tables for executor-originated events.
//!
//! Callbacks live in an arena keyed by id; the per-executor tables hold ids,
//! not the callbacks themselves. A callback spanning N executors is one
//! arena entry registered in N table rows, so removing it is one arena
//! delete plus N row edits — no aliasing, idempotent if repeated during
//! teardown.
//!
//! Matching is a synchronous decision under the state lock. Anything that
//! needs the backend (the aggregated update, an artifact upload) is returned
//! as a [`CallbackEffect`] and performed by the router after the lock is
//! released.

use super::error::RunnerError;
use super::handle::HandleId;
use super::registry::RunnerState;
use base64::prelude::{Engine, BASE64_STANDARD};
use splinter_core::{
    decode, EventBundle, EventDirection, EventStatus, RunEventUpdate,
    RunFragmentOutputArtifactEventCreate, RunFragmentStateEventCreate, UpdateHead,
};
use std::collections::HashMap;

pub(crate) type CallbackId = u64;

/// Address of one table row: a handle's table for one direction and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TableKey {
    pub handle: HandleId,
    pub direction: EventDirection,
    pub event_type: String,
}

impl TableKey {
    pub fn new(handle: HandleId, direction: EventDirection, event_type: &str) -> Self {
        Self { handle, direction, event_type: event_type.to_string() }
    }
}

/// The closed set of callback behaviors.
pub(crate) enum CallbackKind {
    UpdateAggregator(UpdateAggregator),
    FragmentStateTracker { run_id: i64 },
    ArtifactUploader { run_id: i64 },
}

/// Collates the per-fragment replies to one dispatched run event into a
/// single backend update. Consumes matches; never passes through.
pub(crate) struct UpdateAggregator {
    event_id: i64,
    arity: usize,
    received: usize,
    success: bool,
    update: RunEventUpdate,
}

impl UpdateAggregator {
    pub fn new(event_id: i64, arity: usize, update: RunEventUpdate) -> Self {
        Self { event_id, arity, received: 0, success: true, update }
    }
}

pub(crate) struct CallbackEntry {
    pub kind: CallbackKind,
    pub registrations: Vec<TableKey>,
}

#[derive(Default)]
pub(crate) struct CallbackArena {
    next_id: CallbackId,
    pub entries: HashMap<CallbackId, CallbackEntry>,
}

/// Deferred backend work decided by a callback match.
#[derive(Debug)]
pub(crate) enum CallbackEffect {
    SendUpdate(EventBundle),
    UploadArtifact {
        run_fragment_id: i64,
        name: String,
        data: Vec<u8>,
    },
}

enum Match {
    No,
    Consumed,
    Passthrough,
}

impl RunnerState {
    /// Register a callback in every given table row.
    pub fn insert_callback(&mut self, kind: CallbackKind, keys: Vec<TableKey>) -> CallbackId {
        let id = self.arena.next_id;
        self.arena.next_id += 1;
        for key in &keys {
            self.tables.entry(key.clone()).or_default().push(id);
        }
        self.arena.entries.insert(id, CallbackEntry { kind, registrations: keys });
        id
    }

    /// Remove a callback from the arena and every table it was registered
    /// in. Safe to call twice.
    pub fn remove_callback(&mut self, id: CallbackId) {
        remove_callback_entries(&mut self.tables, &mut self.arena, id);
    }

    /// Drop every table row of a handle. Callbacks left with no remaining
    /// registrations are removed from the arena as well.
    pub fn clear_handle_tables(&mut self, handle: HandleId) {
        let keys: Vec<TableKey> =
            self.tables.keys().filter(|key| key.handle == handle).cloned().collect();
        for key in keys {
            let Some(ids) = self.tables.remove(&key) else { continue };
            for id in ids {
                if let Some(entry) = self.arena.entries.get_mut(&id) {
                    entry.registrations.retain(|registration| *registration != key);
                    if entry.registrations.is_empty() {
                        self.arena.entries.remove(&id);
                    }
                }
            }
        }
    }

    /// Run a bundle of executor-originated events through a handle's table.
    ///
    /// For each event, callbacks registered for its type run in insertion
    /// order until one matches; a matching callback consumes the event, and
    /// only passthrough-matching callbacks let it continue to the backend.
    /// Unmatched events pass through unchanged.
    pub fn apply_callbacks(
        &mut self,
        handle: HandleId,
        direction: EventDirection,
        bundle: EventBundle,
    ) -> Result<(EventBundle, Vec<CallbackEffect>), RunnerError> {
        let RunnerState { runs, arena, tables } = self;
        let mut passthrough = EventBundle::new();
        let mut effects = Vec::new();

        for (event_type, events) in bundle.into_iter() {
            let key = TableKey { handle, direction, event_type: event_type.clone() };
            let ids = tables.get(&key).cloned().unwrap_or_default();
            if ids.is_empty() {
                passthrough.extend_raw(&event_type, events);
                continue;
            }

            for event in events {
                let mut outcome = Match::No;
                for id in &ids {
                    // The row snapshot may be stale: a callback earlier in
                    // this batch can have removed itself.
                    let Some(entry) = arena.entries.get_mut(id) else { continue };
                    let mut finished = false;

                    match &mut entry.kind {
                        CallbackKind::UpdateAggregator(agg) => {
                            let Ok(head) = decode::<UpdateHead>(&event) else { continue };
                            if head.id != agg.event_id {
                                continue;
                            }
                            agg.received += 1;
                            if head.event_status != EventStatus::Completed {
                                agg.success = false;
                            }
                            if agg.received >= agg.arity {
                                let mut update = agg.update.clone();
                                update.event_status = if agg.success {
                                    EventStatus::Completed
                                } else {
                                    EventStatus::Error
                                };
                                let mut final_update = EventBundle::new();
                                final_update.push(&update)?;
                                effects.push(CallbackEffect::SendUpdate(final_update));
                                finished = true;
                            }
                            outcome = Match::Consumed;
                        }
                        CallbackKind::FragmentStateTracker { run_id } => {
                            let Ok(ev) = decode::<RunFragmentStateEventCreate>(&event) else {
                                continue;
                            };
                            if ev.run_id != *run_id {
                                continue;
                            }
                            if let Some(run) = runs.get_mut(run_id) {
                                if let Some(state) = run.fragment_state.get_mut(&ev.run_fragment_id)
                                {
                                    tracing::debug!(
                                        run_id = ev.run_id,
                                        run_fragment_id = ev.run_fragment_id,
                                        state = ?ev.run_state,
                                        "fragment state changed"
                                    );
                                    *state = ev.run_state;
                                }
                            }
                            outcome = Match::Passthrough;
                        }
                        CallbackKind::ArtifactUploader { run_id } => {
                            let Ok(ev) = decode::<RunFragmentOutputArtifactEventCreate>(&event)
                            else {
                                continue;
                            };
                            if ev.run_id != *run_id {
                                continue;
                            }
                            let data = BASE64_STANDARD
                                .decode(ev.output_artifact.as_bytes())
                                .map_err(|e| RunnerError::InvalidArtifact(e.to_string()))?;
                            effects.push(CallbackEffect::UploadArtifact {
                                run_fragment_id: ev.run_fragment_id,
                                name: ev.output_artifact_name,
                                data,
                            });
                            outcome = Match::Consumed;
                        }
                    }

                    if finished {
                        remove_callback_entries(tables, arena, *id);
                    }
                    break;
                }

                match outcome {
                    Match::No => passthrough.push_raw(&event_type, event),
                    Match::Consumed => {}
                    Match::Passthrough => passthrough.push_raw(&event_type, event),
                }
            }
        }

        Ok((passthrough, effects))
    }
}

fn remove_callback_entries(
    tables: &mut HashMap<TableKey, Vec<CallbackId>>,
    arena: &mut CallbackArena,
    id: CallbackId,
) {
    let Some(entry) = arena.entries.remove(&id) else { return };
    for key in entry.registrations {
        if let Some(row) = tables.get_mut(&key) {
            row.retain(|registered| *registered != id);
            if row.is_empty() {
                tables.remove(&key);
            }
        }
    }
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;
