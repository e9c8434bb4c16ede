// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! splinterd: the Splinter main runner daemon.
//!
//! Registers with the orchestration backend under `SPLINTER_RUNNER_ID`,
//! polls for run events, and drives one fragment executor per run fragment.
//! Executors come from the YAML configuration file given as the first
//! argument (or `SPLINTER_EXECUTOR_CONFIG`).

mod env;
mod runner;

use runner::MainRunner;
use splinter_client::HttpBackendClient;
use splinter_exec::{subprocess, ExecutorConfigs, PluginRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Settings(#[from] env::SettingsError),
    #[error(transparent)]
    Config(#[from] splinter_exec::ConfigError),
    #[error(transparent)]
    Client(#[from] splinter_client::ClientError),
    #[error(transparent)]
    Runner(#[from] runner::RunnerError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), MainError> {
    let settings = env::Settings::from_env()?;
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.config_path.clone())
        .ok_or(env::SettingsError::Missing("SPLINTER_EXECUTOR_CONFIG"))?;

    let mut registry = PluginRegistry::new();
    subprocess::register(&mut registry);
    let configs = ExecutorConfigs::load(&config_path, &registry)?;

    let client =
        HttpBackendClient::new(&settings.base_url, &settings.namespace, settings.runner_id)?;
    let runner = MainRunner::new(
        Arc::new(client),
        configs,
        settings.runner_id,
        settings.polling_delay,
    );

    let cancel = runner.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt, shutting down");
            cancel.cancel();
        }
    });

    runner.run().await?;
    tracing::info!("bye");
    Ok(())
}
