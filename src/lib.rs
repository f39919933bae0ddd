//! # Scene Workflows
//!
//! A declarative DAG workflow engine for populating 3D scenes. Workflows are
//! JSON documents naming tasks, their parameters and their dependencies; the
//! engine orders them, runs them one by one against a shared context and
//! talks to the host editor only through the [`scene::Scene`] and
//! [`scene::Actor`] traits.
//!
//! ## Features
//!
//! - **Dependency graph** - cycle and missing-dependency detection, Kahn
//!   ordering that keeps document order among independent tasks
//! - **Failure isolation** - a failed task skips its dependents only
//! - **Config presets** - clear before / save after / upsert mode
//! - **Idempotent upserts** - actors tracked by label so re-runs update in place
//! - **Built-in tasks** - patterns, colours, materials, lights, cameras,
//!   model import and data generators
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_workflows::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let loader = WorkflowLoader::new("workflows");
//!     let workflow = loader.load_str(r#"{
//!         "name": "grid",
//!         "config": { "upsert_mode": true },
//!         "tasks": [
//!             { "name": "clear", "type": "ClearLevelTask" },
//!             { "name": "grid", "type": "SpawnGridTask",
//!               "params": { "rows": 3, "cols": 3 }, "depends_on": ["clear"] }
//!         ]
//!     }"#)?;
//!
//!     let mut executor = workflow.into_executor();
//!     let results = executor.execute(None).await?;
//!     println!("{}", executor.summary());
//!     assert_eq!(results.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod scene;
pub mod tasks;
pub mod workflow;

pub use engine::{
    run_task, ActorRegistry, ExecutorError, GraphError, Params, RunSummary, Task, TaskError,
    TaskResult, TaskStatus, WorkflowExecutor, WorkflowGraph,
};
pub use scene::{Actor, ActorKind, ActorRef, MemoryScene, Scene, SceneError};
pub use workflow::{
    get_preset_config, ExecutionContext, LoadError, LoadedWorkflow, RunnerSettings, TaskRegistry,
    WorkflowConfig, WorkflowInfo, WorkflowLoader,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{
        run_task, ExecutorError, Params, RunSummary, Task, TaskError, TaskResult, TaskStatus,
        WorkflowExecutor, WorkflowGraph,
    };
    pub use crate::scene::{Actor, ActorRef, MemoryScene, Scene};
    pub use crate::workflow::{
        ExecutionContext, LoadError, RunnerSettings, TaskRegistry, WorkflowConfig, WorkflowLoader,
    };
}
