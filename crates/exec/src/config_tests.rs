// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor configuration tests

use super::*;
use crate::fake::FakeExecutorHub;
use crate::plugin::PluginRegistry;
use yare::parameterized;

fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register("splinter.plugins.fake", {
        let hub = FakeExecutorHub::new();
        let factory = hub.factory();
        move || (*factory)()
    });
    registry
}

const VALID: &str = "
fragment_executors:
  - local:
      plugin: splinter.plugins.fake
      settings:
        command: run-local
  - docker:
      plugin: splinter.plugins.fake
";

#[test]
fn loads_executors_in_file_order() {
    let configs = ExecutorConfigs::parse(VALID, &registry()).unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs.tags(), vec!["local".to_string(), "docker".to_string()]);
    assert_eq!(configs.default_tag(), "local");

    let local = configs.get("local").unwrap();
    assert_eq!(local.plugin, "splinter.plugins.fake");
    assert_eq!(local.settings["command"], "run-local");

    let docker = configs.get("docker").unwrap();
    assert!(docker.settings.as_object().unwrap().is_empty());
}

#[test]
fn instantiate_builds_a_fresh_executor() {
    let hub = FakeExecutorHub::new();
    let mut registry = PluginRegistry::new();
    registry.register("splinter.plugins.fake", {
        let hub = hub.clone();
        move || (*hub.factory())()
    });
    let configs = ExecutorConfigs::parse(VALID, &registry).unwrap();

    let _a = configs.get("local").unwrap().instantiate();
    let _b = configs.get("local").unwrap().instantiate();
    assert_eq!(hub.created_count(), 2);
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("executors.yaml");
    std::fs::write(&path, VALID).unwrap();

    let configs = ExecutorConfigs::load(&path, &registry()).unwrap();
    assert_eq!(configs.default_tag(), "local");
}

#[test]
fn missing_file_is_fatal() {
    let err = ExecutorConfigs::load(std::path::Path::new("/nonexistent.yaml"), &registry())
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn duplicate_names_are_fatal() {
    let yaml = "
fragment_executors:
  - local:
      plugin: splinter.plugins.fake
  - local:
      plugin: splinter.plugins.fake
";
    let err = ExecutorConfigs::parse(yaml, &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateExecutor(name) if name == "local"));
}

#[test]
fn unknown_plugins_are_fatal() {
    let yaml = "
fragment_executors:
  - local:
      plugin: no.such.plugin
";
    let err = ExecutorConfigs::parse(yaml, &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownPlugin { plugin, .. } if plugin == "no.such.plugin"));
}

#[test]
fn zero_executors_are_fatal() {
    let err = ExecutorConfigs::parse("fragment_executors: []", &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::NoExecutors));
}

#[parameterized(
    top_level_list = { "- local:\n    plugin: p\n" },
    missing_key = { "executors: []\n" },
    scalar_entries = { "fragment_executors:\n  - local\n" },
    two_executors_per_entry = { "
fragment_executors:
  - local:
      plugin: splinter.plugins.fake
    docker:
      plugin: splinter.plugins.fake
" },
    missing_plugin = { "
fragment_executors:
  - local:
      settings: {}
" },
    scalar_settings = { "
fragment_executors:
  - local:
      plugin: splinter.plugins.fake
      settings: fast
" },
)]
fn invalid_formats_are_fatal(yaml: &str) {
    let err = ExecutorConfigs::parse(yaml, &registry()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidFormat(_)), "got: {err:?}");
}
