//! Workflow execution configuration
//!
//! Controls the executor's pre/post hooks and whether tasks reconcile
//! against existing actors. Four named presets cover the common modes:
//!
//! | preset        | clear | upsert | save |
//! |---------------|-------|--------|------|
//! | `default`     | no    | no     | no   |
//! | `clean_slate` | yes   | no     | no   |
//! | `incremental` | no    | yes    | no   |
//! | `production`  | yes   | no     | yes  |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_ACTOR_ID_PREFIX: &str = "workflow_";

pub const PRESET_NAMES: &[&str] = &["default", "clean_slate", "incremental", "production"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown preset '{name}'. Available: {}", .available.join(", "))]
    UnknownPreset { name: String, available: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Remove all non-essential actors before the first task runs
    pub clear_before_execute: bool,

    /// Update actors found by id instead of always spawning new ones
    pub upsert_mode: bool,

    /// Label namespace for actors tracked by id
    pub actor_id_prefix: String,

    /// Save the level once every task has been attempted
    pub save_level_after: bool,

    pub metadata: Map<String, Value>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            clear_before_execute: false,
            upsert_mode: false,
            actor_id_prefix: DEFAULT_ACTOR_ID_PREFIX.to_string(),
            save_level_after: false,
            metadata: Map::new(),
        }
    }
}

impl WorkflowConfig {
    /// Look up a named preset
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let base = Self::default();
        match name {
            "default" => Ok(base),
            "clean_slate" => Ok(Self {
                clear_before_execute: true,
                ..base
            }),
            "incremental" => Ok(Self {
                upsert_mode: true,
                ..base
            }),
            "production" => Ok(Self {
                clear_before_execute: true,
                save_level_after: true,
                ..base
            }),
            _ => Err(ConfigError::UnknownPreset {
                name: name.to_string(),
                available: PRESET_NAMES.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "clear_before_execute": self.clear_before_execute,
            "upsert_mode": self.upsert_mode,
            "actor_id_prefix": self.actor_id_prefix,
            "save_level_after": self.save_level_after,
            "metadata": self.metadata,
        })
    }

    /// Build from a (possibly partial) JSON object; absent or mistyped
    /// fields fall back to their defaults
    pub fn from_json(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(obj) = value.as_object() else {
            return defaults;
        };
        let flag = |key: &str, fallback: bool| obj.get(key).and_then(Value::as_bool).unwrap_or(fallback);

        Self {
            clear_before_execute: flag("clear_before_execute", defaults.clear_before_execute),
            upsert_mode: flag("upsert_mode", defaults.upsert_mode),
            actor_id_prefix: obj
                .get("actor_id_prefix")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(defaults.actor_id_prefix),
            save_level_after: flag("save_level_after", defaults.save_level_after),
            metadata: obj
                .get("metadata")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Look up a named preset
pub fn get_preset_config(name: &str) -> Result<WorkflowConfig, ConfigError> {
    WorkflowConfig::preset(name)
}

impl fmt::Display for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkflowConfig(clear={}, upsert={}, save={})",
            self.clear_before_execute, self.upsert_mode, self.save_level_after
        )
    }
}
