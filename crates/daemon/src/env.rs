// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from reading runner settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Runner settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend base URL, e.g. `http://backend:8000/api`.
    pub base_url: String,
    /// Backend namespace this runner lives in.
    pub namespace: String,
    /// Identity this runner is registered under.
    pub runner_id: i64,
    /// Pump period.
    pub polling_delay: Duration,
    /// Executor configuration file; may also come from the command line.
    pub config_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let base_url = std::env::var("SPLINTER_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string());
        let namespace =
            std::env::var("SPLINTER_NAMESPACE").unwrap_or_else(|_| "main".to_string());
        let runner_id = std::env::var("SPLINTER_RUNNER_ID")
            .map_err(|_| SettingsError::Missing("SPLINTER_RUNNER_ID"))?;
        let runner_id = runner_id
            .parse::<i64>()
            .map_err(|_| SettingsError::Invalid("SPLINTER_RUNNER_ID", runner_id.clone()))?;
        let polling_delay = match std::env::var("SPLINTER_POLL_DELAY_SEC") {
            Ok(value) => Duration::from_secs(
                value
                    .parse::<u64>()
                    .map_err(|_| SettingsError::Invalid("SPLINTER_POLL_DELAY_SEC", value.clone()))?,
            ),
            Err(_) => Duration::from_secs(5),
        };
        let config_path = std::env::var("SPLINTER_EXECUTOR_CONFIG").ok().map(PathBuf::from);

        Ok(Self { base_url, namespace, runner_id, polling_delay, config_path })
    }
}
