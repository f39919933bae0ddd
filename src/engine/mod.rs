//! Workflow execution engine
//!
//! This module contains:
//! - `task` - The `Task` trait and the `run_task` wrapper
//! - `workflow_graph` - Task DAG with ordering, validation and rendering
//! - `executor` - Runs a graph against a scene with config hooks
//! - `actor_registry` - Label-based identity for idempotent upserts
//! - `result` - Task results, statuses and run summaries
//! - `error` - Executor and task error types

pub mod actor_registry;
pub mod error;
pub mod executor;
pub mod result;
pub mod task;
pub mod workflow_graph;

pub use actor_registry::ActorRegistry;
pub use error::{ExecutorError, TaskError};
pub use executor::WorkflowExecutor;
pub use result::{RunSummary, TaskResult, TaskStatus, DEPENDENCY_FAILED};
pub use task::{parse_params, run_task, to_params, Params, Task};
pub use workflow_graph::{GraphError, WorkflowGraph};
