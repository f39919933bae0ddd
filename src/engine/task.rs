//! Task contract and run harness
//!
//! A task is a named unit of work with immutable parameters. Task bodies
//! implement [`Task::execute`]; the executor only ever calls [`run_task`],
//! which times the body and turns errors and panics into FAILED results.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::error::TaskError;
use super::result::{TaskResult, TaskStatus};
use crate::workflow::context::ExecutionContext;

/// Raw task parameters as written in a workflow document
pub type Params = Map<String, Value>;

#[async_trait]
pub trait Task: Send + Sync {
    /// Unique name within a graph; also the context key for this task's output
    fn name(&self) -> &str;

    /// Registry type name, e.g. `SpawnGridTask`
    fn type_name(&self) -> &'static str;

    /// Parameters exactly as supplied at construction
    fn params(&self) -> &Params;

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError>;
}

/// Run a task with timing and failure capture
///
/// Never fails: an `Err` from the body or a panic becomes a FAILED result
/// whose `error` is the message, and `execution_time` is always set.
pub async fn run_task(task: &dyn Task, ctx: &mut ExecutionContext) -> TaskResult {
    debug!(task = %task.name(), kind = task.type_name(), "Starting task");
    let start = Instant::now();

    let outcome = AssertUnwindSafe(task.execute(ctx)).catch_unwind().await;
    let elapsed = start.elapsed();

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => TaskResult::failed(e.to_string()),
        Err(panic) => TaskResult::failed(panic_message(panic.as_ref())),
    }
    .with_execution_time(elapsed);

    match result.status {
        TaskStatus::Success => info!(task = %task.name(), "{}", result),
        _ => warn!(task = %task.name(), "{}", result),
    }
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Deserialize raw params into a typed parameter struct
pub fn parse_params<T: DeserializeOwned>(params: &Params) -> Result<T, TaskError> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| TaskError::InvalidParams(e.to_string()))
}

/// Convert a JSON value into a params map; anything but an object yields an empty map
pub fn to_params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
