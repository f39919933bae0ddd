#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use scene_workflows::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn write_workflow(dir: &Path, filename: &str, content: &str) {
    fs::write(dir.join(filename), content).expect("Failed to write workflow file");
}

/// Adds `amount` to the integer under `counter` in the context
pub struct CounterTask {
    name: String,
    params: Params,
    amount: i64,
}

impl CounterTask {
    pub fn boxed(name: &str, amount: i64) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            params: Params::new(),
            amount,
        })
    }
}

#[async_trait]
impl Task for CounterTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "CounterTask"
    }

    fn params(&self) -> &Params {
        &self.params
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let current = ctx.get("counter").and_then(Value::as_i64).unwrap_or(0);
        let next = current + self.amount;
        ctx.insert("counter", json!(next));
        Ok(TaskResult::success(json!({ "counter": next })))
    }
}

/// Always returns a FAILED result
pub struct FailingTask {
    name: String,
    params: Params,
}

impl FailingTask {
    pub fn boxed(name: &str) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            params: Params::new(),
        })
    }
}

#[async_trait]
impl Task for FailingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "FailingTask"
    }

    fn params(&self) -> &Params {
        &self.params
    }

    async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        Err(TaskError::Other(format!("{} failed on purpose", self.name)))
    }
}

pub struct PanickingTask {
    name: String,
    params: Params,
}

impl PanickingTask {
    pub fn boxed(name: &str) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            params: Params::new(),
        })
    }
}

#[async_trait]
impl Task for PanickingTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "PanickingTask"
    }

    fn params(&self) -> &Params {
        &self.params
    }

    async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        panic!("{} blew up", self.name);
    }
}

/// Counts its executions through a shared counter
pub struct FlagTask {
    name: String,
    params: Params,
    runs: Arc<AtomicUsize>,
}

impl FlagTask {
    pub fn boxed(name: &str, runs: Arc<AtomicUsize>) -> Box<dyn Task> {
        Box::new(Self {
            name: name.to_string(),
            params: Params::new(),
            runs,
        })
    }
}

#[async_trait]
impl Task for FlagTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "FlagTask"
    }

    fn params(&self) -> &Params {
        &self.params
    }

    async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(TaskResult::success_empty())
    }
}

/// Ordering of a `Vec<String>` as `&str`s for terse assertions
pub fn names(order: &[String]) -> Vec<&str> {
    order.iter().map(String::as_str).collect()
}
