//! Workflow definitions and runtime state
//!
//! This module contains:
//! - `config` - `WorkflowConfig` and the named presets
//! - `context` - `ExecutionContext` shared by the tasks of a run
//! - `registry` - Task type name to factory mapping
//! - `loader` - Build graphs from JSON workflow documents
//! - `runner_config` - Settings file for the command-line runner

pub mod config;
pub mod context;
pub mod loader;
pub mod registry;
pub mod runner_config;

pub use config::{get_preset_config, ConfigError, WorkflowConfig, PRESET_NAMES};
pub use context::{ExecutionContext, WORKFLOW_CONFIG_KEY};
pub use loader::{LoadError, LoadedWorkflow, WorkflowInfo, WorkflowLoader};
pub use registry::{TaskFactory, TaskRegistry};
pub use runner_config::{RunnerSettings, DEFAULT_SETTINGS_FILE};
