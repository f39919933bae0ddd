//! Execution context shared by every task in a run
//!
//! A flat key/value store: task outputs land under the task's name, the
//! active configuration sits under [`WORKFLOW_CONFIG_KEY`], and tasks may
//! publish extra keys (such as `grid_points`) for later tasks to pick up by
//! convention. The context also carries the scene handle so tasks can reach
//! the host.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::WorkflowConfig;
use crate::engine::actor_registry::ActorRegistry;
use crate::scene::{MemoryScene, Scene};

/// Reserved key holding the active [`WorkflowConfig`] as JSON
pub const WORKFLOW_CONFIG_KEY: &str = "workflow_config";

pub struct ExecutionContext {
    values: HashMap<String, Value>,
    scene: Arc<dyn Scene>,
    run_id: String,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("run_id", &self.run_id)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Empty context over a fresh in-memory scene
    pub fn new() -> Self {
        Self::with_scene(MemoryScene::shared())
    }

    pub fn with_scene(scene: Arc<dyn Scene>) -> Self {
        Self {
            values: HashMap::new(),
            scene,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Replace all values and start a new run id, keeping the scene
    pub fn reset(&mut self, values: HashMap<String, Value>) {
        self.values = values;
        self.run_id = uuid::Uuid::new_v4().to_string();
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub fn scene_handle(&self) -> Arc<dyn Scene> {
        self.scene.clone()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Deserialize a value; `Ok(None)` when the key is absent
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.values
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store the active configuration under the reserved key
    pub fn set_config(&mut self, config: &WorkflowConfig) {
        self.values
            .insert(WORKFLOW_CONFIG_KEY.to_string(), config.to_json());
    }

    /// Active configuration, or the default when none was stored
    pub fn config(&self) -> WorkflowConfig {
        self.values
            .get(WORKFLOW_CONFIG_KEY)
            .map(WorkflowConfig::from_json)
            .unwrap_or_default()
    }

    /// Fresh actor registry over the scene, using the configured id prefix
    pub fn registry(&self) -> ActorRegistry {
        ActorRegistry::new(self.scene(), self.config().actor_id_prefix)
    }

    /// Resolve a reference: an exact key first, then a dotted path
    /// `key.field.subfield` through nested objects
    pub fn resolve(&self, reference: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(reference) {
            return Some(value);
        }

        let mut parts = reference.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}
