//! Runner settings
//!
//! Optional settings for the command-line runner, loaded from
//! `scene-workflows.yaml`:
//!
//! ```yaml
//! workflows_dir: content/workflows
//! preset: incremental
//! log_filter: scene_workflows=debug
//! ```
//!
//! A missing file means defaults. `preset`, when set, replaces the config
//! embedded in each workflow document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config::WorkflowConfig;
use super::loader::LoadError;

pub const DEFAULT_SETTINGS_FILE: &str = "scene-workflows.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Directory searched for workflow JSON files
    #[serde(default = "default_workflows_dir")]
    pub workflows_dir: PathBuf,

    /// Preset applied instead of each document's own config
    #[serde(default)]
    pub preset: Option<String>,

    /// Tracing filter directive, e.g. `scene_workflows=debug`
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_workflows_dir() -> PathBuf {
    PathBuf::from("workflows")
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            workflows_dir: default_workflows_dir(),
            preset: None,
            log_filter: None,
        }
    }
}

impl RunnerSettings {
    /// Load settings from `path`, or defaults when the file does not exist
    ///
    /// An unknown preset name is reported here rather than at run time.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: RunnerSettings =
            serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
                file: path.display().to_string(),
                error: e,
            })?;
        settings.preset_config()?;
        Ok(settings)
    }

    /// Config from the configured preset, if any
    pub fn preset_config(&self) -> Result<Option<WorkflowConfig>, LoadError> {
        match &self.preset {
            Some(name) => Ok(Some(WorkflowConfig::preset(name)?)),
            None => Ok(None),
        }
    }
}
