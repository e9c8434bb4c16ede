// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! splinter-exec: fragment executor plugins.
//!
//! A fragment executor performs the actual simulation work for one run
//! fragment. The runner treats it as opaque: start it, exchange event
//! bundles, stop it. This crate defines that contract, the plugin registry
//! configurations resolve against, the YAML executor configuration, and the
//! built-in subprocess plugin.

mod config;
mod plugin;
pub mod subprocess;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeExecutor, FakeExecutorHub};

pub use config::{ConfigError, ExecutorConfigs, FragmentExecutorConfig};
pub use plugin::{ExecutorError, FragmentExecutor, PluginFactory, PluginRegistry};
