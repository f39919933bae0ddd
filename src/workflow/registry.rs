//! Task type registry
//!
//! Maps the `type` string of a workflow task entry to a factory that builds
//! the task from its name and raw params.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::error::TaskError;
use crate::engine::task::{Params, Task};

pub type TaskFactory =
    Arc<dyn Fn(&str, &Params) -> Result<Box<dyn Task>, TaskError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct TaskRegistry {
    factories: BTreeMap<String, TaskFactory>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

impl TaskRegistry {
    /// Registry with no task types
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in task type
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::tasks::register_builtin(&mut registry);
        registry
    }

    /// Register or replace a task type
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &Params) -> Result<Box<dyn Task>, TaskError> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Build a task; `None` when the type is not registered
    pub fn create(
        &self,
        type_name: &str,
        name: &str,
        params: &Params,
    ) -> Option<Result<Box<dyn Task>, TaskError>> {
        self.factories
            .get(type_name)
            .map(|factory| factory(name, params))
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
