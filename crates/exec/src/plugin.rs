// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fragment executor contract and plugin registry

use async_trait::async_trait;
use serde_json::Value;
use splinter_core::{EventBundle, EventDirection};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from fragment executor operations
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor start failed: {0}")]
    StartFailed(String),
    #[error("executor send failed: {0}")]
    SendFailed(String),
    #[error("executor event stream closed: {0}")]
    StreamClosed(String),
    #[error("executor stop failed: {0}")]
    StopFailed(String),
    #[error("invalid executor settings: {0}")]
    InvalidSettings(String),
}

/// One fragment executor instance.
///
/// Implementations multiplex their own transport; the runner only sees
/// event bundles going in and out. All methods take `&self` — an executor
/// is shared between the runner (sends) and its reader task (receives).
#[async_trait]
pub trait FragmentExecutor: Send + Sync + 'static {
    /// Prepare the executor for a single fragment.
    async fn start(&self, settings: &Value, parameters: &Value) -> Result<(), ExecutorError>;

    /// Deliver a batch of events from the runner.
    async fn send_events(
        &self,
        bundle: EventBundle,
        direction: EventDirection,
    ) -> Result<(), ExecutorError>;

    /// Block until the executor produces its next batch.
    async fn get_events(&self) -> Result<(EventDirection, EventBundle), ExecutorError>;

    /// Release resources. Safe to call once.
    async fn stop(&self) -> Result<(), ExecutorError>;

    /// Identifier for diagnostics.
    fn name(&self) -> &str;
}

/// Constructor for executor instances; one call per spawned fragment.
pub type PluginFactory = Arc<dyn Fn() -> Arc<dyn FragmentExecutor> + Send + Sync>;

/// Registry of available executor plugins, keyed by plugin path.
///
/// Resolution happens once per configuration entry at startup; the shared
/// factory is what "loaded once and cached by path" means here.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its path.
    pub fn register<F>(&mut self, path: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn FragmentExecutor> + Send + Sync + 'static,
    {
        self.factories.insert(path.into(), Arc::new(factory));
    }

    pub fn resolve(&self, path: &str) -> Option<PluginFactory> {
        self.factories.get(path).cloned()
    }
}
