// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess executor plugin.
//!
//! Runs the fragment executor as a child process and exchanges event
//! bundles over its stdio. Wire format per direction: 4-byte length prefix
//! (big-endian) + JSON frame `{"event_type": ..., "events": {...}}`.
//!
//! Settings:
//! - `command` (required): shell command to launch
//! - `cwd` (optional): working directory
//! - `env` (optional): extra environment variables
//!
//! The fragment parameters are handed to the child via the
//! `SPLINTER_FRAGMENT_PARAMETERS` environment variable as JSON.

use crate::plugin::{ExecutorError, FragmentExecutor, PluginRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use splinter_core::{EventBundle, EventDirection};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// Registry path of the built-in subprocess plugin.
pub const PLUGIN_PATH: &str = "splinter.plugins.subprocess";

/// Register the subprocess plugin under [`PLUGIN_PATH`].
pub fn register(registry: &mut PluginRegistry) {
    registry.register(PLUGIN_PATH, || {
        Arc::new(SubprocessExecutor::new()) as Arc<dyn FragmentExecutor>
    });
}

#[derive(Serialize, Deserialize)]
struct Frame {
    event_type: EventDirection,
    events: EventBundle,
}

/// A fragment executor running as a local child process.
pub struct SubprocessExecutor {
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<ChildStdout>>,
}

impl SubprocessExecutor {
    pub fn new() -> Self {
        Self {
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            stdout: Mutex::new(None),
        }
    }
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FragmentExecutor for SubprocessExecutor {
    async fn start(&self, settings: &Value, parameters: &Value) -> Result<(), ExecutorError> {
        let command = settings
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutorError::InvalidSettings("missing `command` string".into()))?;

        let parameters_json = serde_json::to_string(parameters)
            .map_err(|e| ExecutorError::StartFailed(e.to_string()))?;

        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(command)
            .env("SPLINTER_FRAGMENT_PARAMETERS", parameters_json)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = settings.get("cwd").and_then(Value::as_str) {
            cmd.current_dir(cwd);
        }
        if let Some(env) = settings.get("env").and_then(Value::as_object) {
            for (key, value) in env {
                if let Some(value) = value.as_str() {
                    cmd.env(key, value);
                }
            }
        }

        tracing::info!(%command, "starting subprocess executor");
        let mut child = cmd.spawn().map_err(|e| ExecutorError::StartFailed(e.to_string()))?;
        *self.stdin.lock().await = child.stdin.take();
        *self.stdout.lock().await = child.stdout.take();
        *self.child.lock().await = Some(child);
        Ok(())
    }

    async fn send_events(
        &self,
        bundle: EventBundle,
        direction: EventDirection,
    ) -> Result<(), ExecutorError> {
        let frame = Frame { event_type: direction, events: bundle };
        let payload =
            serde_json::to_vec(&frame).map_err(|e| ExecutorError::SendFailed(e.to_string()))?;

        let mut stdin = self.stdin.lock().await;
        let stdin = stdin
            .as_mut()
            .ok_or_else(|| ExecutorError::SendFailed("executor not started".into()))?;
        stdin
            .write_all(&(payload.len() as u32).to_be_bytes())
            .await
            .map_err(|e| ExecutorError::SendFailed(e.to_string()))?;
        stdin
            .write_all(&payload)
            .await
            .map_err(|e| ExecutorError::SendFailed(e.to_string()))?;
        stdin.flush().await.map_err(|e| ExecutorError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn get_events(&self) -> Result<(EventDirection, EventBundle), ExecutorError> {
        let mut stdout = self.stdout.lock().await;
        let stdout = stdout
            .as_mut()
            .ok_or_else(|| ExecutorError::StreamClosed("executor not started".into()))?;

        let mut len_buf = [0u8; 4];
        stdout
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| ExecutorError::StreamClosed(e.to_string()))?;
        let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        stdout
            .read_exact(&mut payload)
            .await
            .map_err(|e| ExecutorError::StreamClosed(e.to_string()))?;

        let frame: Frame = serde_json::from_slice(&payload)
            .map_err(|e| ExecutorError::StreamClosed(format!("malformed frame: {e}")))?;
        Ok((frame.event_type, frame.events))
    }

    async fn stop(&self) -> Result<(), ExecutorError> {
        // Closing stdin signals the child to drain and exit.
        self.stdin.lock().await.take();
        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill subprocess executor");
            }
            let _ = child.wait().await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "subprocess"
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
