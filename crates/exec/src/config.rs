// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML executor configuration
//!
//! Schema:
//! ```yaml
//! fragment_executors:
//!   - local:
//!       plugin: splinter.plugins.subprocess
//!       settings: { command: "run-local-executor" }
//!   - docker:
//!       plugin: splinter.plugins.subprocess
//!       settings: { command: "run-docker-executor" }
//! ```
//!
//! The first entry in file order is the default tag for fragments that do
//! not name one. Every rule is enforced strictly: one executor per list
//! entry, unique names, known plugins, at least one executor.

use crate::plugin::{FragmentExecutor, PluginFactory, PluginRegistry};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors from loading the executor configuration. All fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),
    #[error("fragment executor configuration {0} already exists")]
    DuplicateExecutor(String),
    #[error("unknown executor plugin {plugin} for executor {name}")]
    UnknownPlugin { name: String, plugin: String },
    #[error("no fragment executor configurations loaded")]
    NoExecutors,
}

/// One configured fragment executor.
pub struct FragmentExecutorConfig {
    pub name: String,
    pub plugin: String,
    pub settings: Value,
    factory: PluginFactory,
}

impl std::fmt::Debug for FragmentExecutorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentExecutorConfig")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl FragmentExecutorConfig {
    /// Construct a fresh executor instance for one fragment.
    pub fn instantiate(&self) -> Arc<dyn FragmentExecutor> {
        (*self.factory)()
    }
}

/// The full set of configured executors, in file order.
#[derive(Debug)]
pub struct ExecutorConfigs {
    configs: IndexMap<String, FragmentExecutorConfig>,
    default: String,
}

impl ExecutorConfigs {
    /// Load and validate the configuration file.
    pub fn load(path: &Path, registry: &PluginRegistry) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, registry)
    }

    /// Parse and validate configuration YAML.
    pub fn parse(yaml: &str, registry: &PluginRegistry) -> Result<Self, ConfigError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        if !root.is_mapping() {
            return Err(ConfigError::InvalidFormat(
                "top level must be a mapping with key `fragment_executors`".into(),
            ));
        }
        let executors = root
            .get("fragment_executors")
            .ok_or_else(|| {
                ConfigError::InvalidFormat("top level must be a mapping with key `fragment_executors`".into())
            })?
            .as_sequence()
            .ok_or_else(|| ConfigError::InvalidFormat("`fragment_executors` must be a sequence".into()))?;

        let mut configs: IndexMap<String, FragmentExecutorConfig> = IndexMap::new();
        for entry in executors {
            let entry = entry.as_mapping().ok_or_else(|| {
                ConfigError::InvalidFormat("each executor entry must be a mapping".into())
            })?;
            if entry.len() != 1 {
                return Err(ConfigError::InvalidFormat(
                    "each executor entry must contain exactly one executor".into(),
                ));
            }
            let (name, data) = match entry.iter().next() {
                Some((key, data)) => {
                    let name = key.as_str().ok_or_else(|| {
                        ConfigError::InvalidFormat("executor names must be strings".into())
                    })?;
                    (name.to_string(), data)
                }
                None => continue,
            };

            if !data.is_mapping() {
                return Err(ConfigError::InvalidFormat(format!(
                    "executor {name} must map to a mapping"
                )));
            }
            let plugin = data
                .get("plugin")
                .and_then(|p| p.as_str())
                .ok_or_else(|| {
                    ConfigError::InvalidFormat(format!("executor {name} is missing a `plugin` string"))
                })?
                .to_string();

            let settings = match data.get("settings") {
                Some(settings) => {
                    if !settings.is_mapping() {
                        return Err(ConfigError::InvalidFormat(format!(
                            "settings of executor {name} must be a mapping"
                        )));
                    }
                    serde_json::to_value(settings)
                        .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?
                }
                None => Value::Object(serde_json::Map::new()),
            };

            let factory = registry.resolve(&plugin).ok_or_else(|| ConfigError::UnknownPlugin {
                name: name.clone(),
                plugin: plugin.clone(),
            })?;

            if configs.contains_key(&name) {
                return Err(ConfigError::DuplicateExecutor(name));
            }
            tracing::debug!(executor = %name, plugin = %plugin, "loaded fragment executor configuration");
            configs.insert(name.clone(), FragmentExecutorConfig { name, plugin, settings, factory });
        }

        let default = match configs.keys().next() {
            Some(first) => first.clone(),
            None => return Err(ConfigError::NoExecutors),
        };
        Ok(Self { configs, default })
    }

    pub fn get(&self, tag: &str) -> Option<&FragmentExecutorConfig> {
        self.configs.get(tag)
    }

    /// Tag assigned to fragments that do not name an executor: the first
    /// configured executor in file order.
    pub fn default_tag(&self) -> &str {
        &self.default
    }

    /// Configured executor names, in file order.
    pub fn tags(&self) -> Vec<String> {
        self.configs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
