// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bundles: the unit of every backend and executor exchange.
//!
//! Wire shape: `{ "<event type name>": [event, …], … }`. The map key is the
//! canonical discriminator; payloads are kept as raw [`serde_json::Value`]
//! so events the runner merely routes are forwarded unchanged.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from encoding or decoding bundle payloads
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to encode {event_type} event: {source}")]
    Encode {
        event_type: &'static str,
        source: serde_json::Error,
    },
    #[error("failed to decode {event_type} event: {source}")]
    Decode {
        event_type: &'static str,
        source: serde_json::Error,
    },
}

/// A typed event with a canonical wire discriminator.
pub trait WireEvent: Serialize {
    /// Discriminator string used as the bundle key.
    const EVENT_TYPE: &'static str;
}

/// Decode a raw bundle payload into a typed event shape.
///
/// Unknown fields are ignored, so a view decode of a larger payload is fine.
pub fn decode<T: WireEvent + DeserializeOwned>(payload: &Value) -> Result<T, EventError> {
    serde_json::from_value(payload.clone()).map_err(|source| EventError::Decode {
        event_type: T::EVENT_TYPE,
        source,
    })
}

/// Grouped-by-type collection of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBundle {
    events: IndexMap<String, Vec<Value>>,
}

impl EventBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a typed event and add it under its canonical discriminator.
    pub fn push<T: WireEvent>(&mut self, event: &T) -> Result<(), EventError> {
        let payload = serde_json::to_value(event).map_err(|source| EventError::Encode {
            event_type: T::EVENT_TYPE,
            source,
        })?;
        self.push_raw(T::EVENT_TYPE, payload);
        Ok(())
    }

    /// Add a raw payload under the given discriminator.
    pub fn push_raw(&mut self, event_type: &str, payload: Value) {
        self.events.entry(event_type.to_string()).or_default().push(payload);
    }

    /// Add a batch of raw payloads under the given discriminator.
    pub fn extend_raw(&mut self, event_type: &str, payloads: impl IntoIterator<Item = Value>) {
        self.events.entry(event_type.to_string()).or_default().extend(payloads);
    }

    pub fn is_empty(&self) -> bool {
        self.events.values().all(|events| events.is_empty())
    }

    /// Total number of events across all types.
    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn get(&self, event_type: &str) -> &[Value] {
        self.events.get(event_type).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.events.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Consume the bundle, yielding `(event type, events)` in insertion order.
    pub fn into_iter(self) -> impl Iterator<Item = (String, Vec<Value>)> {
        self.events.into_iter()
    }
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
