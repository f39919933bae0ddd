//! Workflow document loader
//!
//! Turns a JSON workflow document into a [`WorkflowGraph`] plus its
//! [`WorkflowConfig`]:
//!
//! ```json
//! {
//!   "name": "grid",
//!   "config": { "upsert_mode": true },
//!   "tasks": [
//!     { "name": "clear", "type": "ClearLevelTask" },
//!     { "name": "grid", "type": "SpawnGridTask",
//!       "params": { "rows": 5, "cols": 5 }, "depends_on": ["clear"] }
//!   ]
//! }
//! ```
//!
//! Tasks are added in document order, so an entry must come after every
//! task it depends on. Entries with `"enabled": false` are dropped.
//! Unknown fields are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::config::{ConfigError, WorkflowConfig};
use super::registry::TaskRegistry;
use crate::engine::error::TaskError;
use crate::engine::executor::WorkflowExecutor;
use crate::engine::task::{Params, Task};
use crate::engine::workflow_graph::{GraphError, WorkflowGraph};

const UNNAMED: &str = "Unnamed";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Workflow file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid workflow JSON in {origin}: {error}")]
    Json {
        origin: String,
        error: serde_json::Error,
    },

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },

    #[error("Task definition missing 'name': {0}")]
    MissingName(String),

    #[error("Task definition missing 'type': {0}")]
    MissingType(String),

    #[error("Task '{task}' has invalid '{field}': expected {expected}")]
    InvalidField {
        task: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Unknown task type '{task_type}'. Available types: {}", .available.join(", "))]
    UnknownTaskType {
        task_type: String,
        available: Vec<String>,
    },

    #[error("Error creating task '{task}' of type '{task_type}': {source}")]
    TaskCreation {
        task: String,
        task_type: String,
        source: TaskError,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Deserialize)]
struct WorkflowDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    tasks: Vec<Value>,
}

/// A parsed, ready-to-run workflow
#[derive(Debug)]
pub struct LoadedWorkflow {
    pub name: String,
    pub description: String,
    pub config: WorkflowConfig,
    pub graph: WorkflowGraph,
}

impl LoadedWorkflow {
    /// Executor over this workflow's graph and config
    pub fn into_executor(self) -> WorkflowExecutor {
        WorkflowExecutor::new(self.graph).with_config(self.config)
    }
}

/// Metadata read from a workflow file without building any task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowInfo {
    pub name: String,
    pub description: String,
    pub task_count: usize,
    pub config: Value,
    pub file: String,
}

pub struct WorkflowLoader {
    workflows_dir: PathBuf,
    registry: TaskRegistry,
}

impl WorkflowLoader {
    /// Loader over a workflows directory using the built-in task types
    pub fn new(workflows_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflows_dir: workflows_dir.into(),
            registry: TaskRegistry::builtin(),
        }
    }

    pub fn with_registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn workflows_dir(&self) -> &Path {
        &self.workflows_dir
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TaskRegistry {
        &mut self.registry
    }

    /// Path of a workflow file, adding `.json` when missing
    pub fn resolve_path(&self, workflow_file: &str) -> PathBuf {
        let file = if workflow_file.ends_with(".json") {
            workflow_file.to_string()
        } else {
            format!("{}.json", workflow_file)
        };
        self.workflows_dir.join(file)
    }

    fn read_document(&self, workflow_file: &str) -> Result<(PathBuf, Value), LoadError> {
        let path = self.resolve_path(workflow_file);
        if !path.is_file() {
            return Err(LoadError::NotFound(path));
        }

        let content = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content).map_err(|e| LoadError::Json {
            origin: path.display().to_string(),
            error: e,
        })?;
        Ok((path, value))
    }

    /// Load and build a workflow file from the workflows directory
    pub fn load(&self, workflow_file: &str) -> Result<LoadedWorkflow, LoadError> {
        let (path, value) = self.read_document(workflow_file)?;
        debug!(path = %path.display(), "Loading workflow");
        self.build_from(&value, &path.display().to_string())
    }

    /// Build a workflow from JSON text
    pub fn load_str(&self, json: &str) -> Result<LoadedWorkflow, LoadError> {
        let value = serde_json::from_str(json).map_err(|e| LoadError::Json {
            origin: "<inline>".to_string(),
            error: e,
        })?;
        self.build(&value)
    }

    /// Build a workflow from an already-parsed document
    pub fn build(&self, definition: &Value) -> Result<LoadedWorkflow, LoadError> {
        self.build_from(definition, "<inline>")
    }

    fn build_from(&self, definition: &Value, origin: &str) -> Result<LoadedWorkflow, LoadError> {
        let document: WorkflowDocument =
            serde_json::from_value(definition.clone()).map_err(|e| LoadError::Json {
                origin: origin.to_string(),
                error: e,
            })?;

        let config = WorkflowConfig::from_json(&document.config);
        let mut graph = WorkflowGraph::new();

        for entry in &document.tasks {
            if entry.get("enabled").and_then(Value::as_bool) == Some(false) {
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("unnamed");
                info!(task = %name, "Skipping disabled task");
                continue;
            }

            let (name, depends_on, task) = self.create_task(entry)?;
            debug!(task = %name, kind = task.type_name(), "Adding task");
            graph.add_task_with_deps(task, depends_on)?;
        }

        Ok(LoadedWorkflow {
            name: document.name.unwrap_or_else(|| UNNAMED.to_string()),
            description: document.description.unwrap_or_default(),
            config,
            graph,
        })
    }

    fn create_task(
        &self,
        entry: &Value,
    ) -> Result<(String, Vec<String>, Box<dyn Task>), LoadError> {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| LoadError::MissingName(entry.to_string()))?;

        let task_type = entry
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LoadError::MissingType(entry.to_string()))?;

        let params: Params = match entry.get("params") {
            None | Some(Value::Null) => Params::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(LoadError::InvalidField {
                    task: name.to_string(),
                    field: "params",
                    expected: "an object",
                })
            }
        };

        let depends_on = match entry.get("depends_on") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|d| d.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| LoadError::InvalidField {
                    task: name.to_string(),
                    field: "depends_on",
                    expected: "a list of task names",
                })?,
            Some(_) => {
                return Err(LoadError::InvalidField {
                    task: name.to_string(),
                    field: "depends_on",
                    expected: "a list of task names",
                })
            }
        };

        let task = self
            .registry
            .create(task_type, name, &params)
            .ok_or_else(|| LoadError::UnknownTaskType {
                task_type: task_type.to_string(),
                available: self.registry.type_names(),
            })?
            .map_err(|source| LoadError::TaskCreation {
                task: name.to_string(),
                task_type: task_type.to_string(),
                source,
            })?;

        Ok((name.to_string(), depends_on, task))
    }

    /// Workflow file names in the workflows directory, sorted
    pub fn list_workflows(&self) -> Result<Vec<String>, LoadError> {
        if !self.workflows_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.workflows_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read name, description, task count and raw config without building tasks
    pub fn get_workflow_info(&self, workflow_file: &str) -> Result<WorkflowInfo, LoadError> {
        let (path, value) = self.read_document(workflow_file)?;
        let file = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(workflow_file)
            .to_string();

        Ok(WorkflowInfo {
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(UNNAMED)
                .to_string(),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            task_count: value
                .get("tasks")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            config: value
                .get("config")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            file,
        })
    }
}
