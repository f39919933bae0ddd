//! Task dependency graph
//!
//! Tasks are added one at a time with the names of tasks they depend on.
//! Dependencies must already be present when a task is added, so documents
//! list prerequisites first. Execution order is a Kahn topological sort that
//! seeds and refills its ready queue in insertion order, which keeps the
//! order stable for a given graph.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::result::TaskResult;
use super::task::Task;

const RULE_WIDTH: usize = 60;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Task '{0}' already exists in workflow")]
    DuplicateTask(String),

    #[error("Task '{task}' depends on '{dependency}' which hasn't been added to workflow yet")]
    UnknownDependency { task: String, dependency: String },

    #[error("Task '{task}' depends on non-existent task '{dependency}'")]
    DependencyNotFound { task: String, dependency: String },

    #[error("Circular dependency detected in workflow among: {}", .0.join(", "))]
    CircularDependency(Vec<String>),
}

struct TaskEntry {
    task: Box<dyn Task>,
    result: Option<TaskResult>,
}

#[derive(Default)]
pub struct WorkflowGraph {
    tasks: HashMap<String, TaskEntry>,
    dependencies: HashMap<String, Vec<String>>,
    insertion_order: Vec<String>,
}

impl fmt::Debug for WorkflowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowGraph")
            .field("tasks", &self.insertion_order)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task depending on already-added tasks
    ///
    /// On error the graph is left unchanged.
    pub fn add_task(&mut self, task: Box<dyn Task>, depends_on: &[&str]) -> Result<(), GraphError> {
        let deps = depends_on.iter().map(|d| d.to_string()).collect();
        self.add_task_with_deps(task, deps)
    }

    pub fn add_task_with_deps(
        &mut self,
        task: Box<dyn Task>,
        depends_on: Vec<String>,
    ) -> Result<(), GraphError> {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(GraphError::DuplicateTask(name));
        }
        if let Some(missing) = depends_on.iter().find(|d| !self.tasks.contains_key(*d)) {
            return Err(GraphError::UnknownDependency {
                task: name,
                dependency: missing.clone(),
            });
        }

        self.tasks.insert(name.clone(), TaskEntry { task, result: None });
        self.dependencies.insert(name.clone(), depends_on);
        self.insertion_order.push(name);
        Ok(())
    }

    /// Replace a task's dependency list without the add-time checks
    ///
    /// Returns `false` if the task is unknown. Call [`validate`](Self::validate)
    /// afterwards; this is the only way a graph can reference missing tasks or
    /// contain a cycle.
    pub fn set_dependencies(&mut self, task: &str, depends_on: Vec<String>) -> bool {
        match self.dependencies.get_mut(task) {
            Some(deps) => {
                *deps = depends_on;
                true
            }
            None => false,
        }
    }

    fn check_dependencies_exist(&self) -> Result<(), GraphError> {
        for name in &self.insertion_order {
            for dep in self.dependencies_of(name) {
                if !self.tasks.contains_key(dep) {
                    return Err(GraphError::DependencyNotFound {
                        task: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Topologically sorted task names
    pub fn execution_order(&self) -> Result<Vec<String>, GraphError> {
        self.check_dependencies_exist()?;

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for name in &self.insertion_order {
            let deps = self.dependencies_of(name);
            in_degree.insert(name.as_str(), deps.len());
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut queue: VecDeque<&str> = self
            .insertion_order
            .iter()
            .map(String::as_str)
            .filter(|name| in_degree.get(name) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());

        while let Some(current) = queue.pop_front() {
            order.push(current.to_string());

            for &dependent in dependents.get(current).map(Vec::as_slice).unwrap_or_default() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if order.len() != self.tasks.len() {
            let stuck = self
                .insertion_order
                .iter()
                .filter(|name| in_degree.get(name.as_str()).is_some_and(|d| *d > 0))
                .cloned()
                .collect();
            return Err(GraphError::CircularDependency(stuck));
        }

        Ok(order)
    }

    /// Check every dependency exists and the graph is acyclic
    pub fn validate(&self) -> Result<bool, GraphError> {
        self.execution_order().map(|_| true)
    }

    /// Human-readable listing in execution order
    pub fn visualize(&self) -> Result<String, GraphError> {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec!["Workflow Graph:".to_string(), rule.clone()];

        for name in self.execution_order()? {
            let deps = self.dependencies_of(&name);
            if deps.is_empty() {
                lines.push(format!("{} (root)", name));
            } else {
                lines.push(format!("{} <- [{}]", name, deps.join(", ")));
            }
        }

        lines.push(rule);
        Ok(lines.join("\n"))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Task> {
        self.tasks.get(name).map(|e| e.task.as_ref())
    }

    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn dependencies(&self) -> &HashMap<String, Vec<String>> {
        &self.dependencies
    }

    /// Task names in the order they were added
    pub fn task_names(&self) -> &[String] {
        &self.insertion_order
    }

    /// Result of the task's most recent run
    pub fn result(&self, name: &str) -> Option<&TaskResult> {
        self.tasks.get(name)?.result.as_ref()
    }

    pub(crate) fn record_result(&mut self, name: &str, result: TaskResult) {
        if let Some(entry) = self.tasks.get_mut(name) {
            entry.result = Some(result);
        }
    }

    pub(crate) fn clear_results(&mut self) {
        for entry in self.tasks.values_mut() {
            entry.result = None;
        }
    }
}
