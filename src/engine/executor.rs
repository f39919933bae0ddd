//! Workflow executor
//!
//! Runs a [`WorkflowGraph`] against one shared [`ExecutionContext`]:
//! 1. Seeds the context and stores the config under the reserved key
//! 2. Optionally clears the level (failure is logged, not fatal)
//! 3. Validates the graph and computes its execution order
//! 4. Runs each task whose dependencies all succeeded, skipping the rest
//! 5. Publishes successful outputs into the context under the task name
//! 6. Optionally saves the level (failure is logged, not fatal)
//!
//! Tasks run strictly one after another, including independent branches,
//! so later tasks observe every earlier write to the context.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, instrument, warn, Span};

use super::error::ExecutorError;
use super::result::{RunSummary, TaskResult, DEPENDENCY_FAILED};
use super::task::run_task;
use super::workflow_graph::WorkflowGraph;
use crate::scene::Scene;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::context::ExecutionContext;

pub struct WorkflowExecutor {
    graph: WorkflowGraph,
    config: WorkflowConfig,
    context: ExecutionContext,
    results: HashMap<String, TaskResult>,
}

impl WorkflowExecutor {
    /// Executor with the default config over a fresh in-memory scene
    pub fn new(graph: WorkflowGraph) -> Self {
        Self {
            graph,
            config: WorkflowConfig::default(),
            context: ExecutionContext::new(),
            results: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Run against the given scene instead of an in-memory one
    pub fn with_scene(mut self, scene: Arc<dyn Scene>) -> Self {
        self.context = ExecutionContext::with_scene(scene);
        self
    }

    /// Execute every task in dependency order
    ///
    /// Only graph validation errors abort the run. Individual task failures
    /// are recorded in the returned map and cause their dependents to be
    /// skipped.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn execute(
        &mut self,
        initial_context: Option<HashMap<String, Value>>,
    ) -> Result<HashMap<String, TaskResult>, ExecutorError> {
        self.context.reset(initial_context.unwrap_or_default());
        Span::current().record("run_id", self.context.run_id());
        self.context.set_config(&self.config);
        self.results.clear();
        self.graph.clear_results();

        if self.config.clear_before_execute {
            info!("Config: clearing level before execution");
            self.clear_level();
        }

        self.graph.validate()?;
        let execution_order = self.graph.execution_order()?;

        info!(
            started_at = %Utc::now().to_rfc3339(),
            config = %self.config,
            tasks = execution_order.len(),
            "Starting workflow execution"
        );
        info!("Order: {}", execution_order.join(" → "));

        for task_name in &execution_order {
            let result = self.run_step(task_name).await;
            self.graph.record_result(task_name, result.clone());
            self.results.insert(task_name.clone(), result);
        }

        if self.config.save_level_after {
            info!("Config: saving level after execution");
            self.save_level();
        }

        self.log_summary();
        Ok(self.results.clone())
    }

    /// Run one task, or skip it when a dependency did not succeed
    async fn run_step(&mut self, task_name: &str) -> TaskResult {
        let deps_ok = self
            .graph
            .dependencies_of(task_name)
            .iter()
            .all(|dep| self.results.get(dep).is_some_and(TaskResult::is_success));

        if !deps_ok {
            warn!(task = %task_name, "Skipped (dependency failed)");
            return TaskResult::skipped(DEPENDENCY_FAILED);
        }

        let Some(task) = self.graph.get(task_name) else {
            error!(task = %task_name, "Task missing from graph");
            return TaskResult::failed(format!("Task '{}' missing from graph", task_name));
        };
        let result = run_task(task, &mut self.context).await;

        if result.is_success() {
            if let Some(output) = &result.output {
                self.context.insert(task_name.to_string(), output.clone());
            }
        }
        result
    }

    fn clear_level(&self) {
        let scene = self.context.scene();
        let initial = scene.actor_count();
        match scene.clear() {
            Ok(deleted) => info!(
                deleted,
                initial,
                remaining = scene.actor_count(),
                "Cleared actors from level"
            ),
            Err(e) => error!("Failed to clear level: {}", e),
        }
    }

    fn save_level(&self) {
        match self.context.scene().save() {
            Ok(()) => info!("Level saved"),
            Err(e) => error!("Failed to save level: {}", e),
        }
    }

    fn log_summary(&self) {
        let summary = self.summary();
        info!(
            total = summary.total,
            success = summary.success,
            failed = summary.failed,
            skipped = summary.skipped,
            total_time = %format!("{:.3}s", summary.total_time.as_secs_f64()),
            "Workflow execution summary"
        );
    }

    /// Output a task published to the context, if it succeeded
    pub fn get_task_output(&self, task_name: &str) -> Option<&Value> {
        self.context.get(task_name)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results)
    }

    pub fn results(&self) -> &HashMap<String, TaskResult> {
        &self.results
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        self.context.run_id()
    }
}
