//! Execution result types

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Marker stored in `error` when a task is skipped because a dependency did not succeed
pub const DEPENDENCY_FAILED: &str = "Dependency failed";

/// Lifecycle state of one task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Result of one task execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    pub metadata: Map<String, Value>,
}

impl TaskResult {
    fn with_status(status: TaskStatus) -> Self {
        Self {
            status,
            output: None,
            error: None,
            execution_time: Duration::ZERO,
            metadata: Map::new(),
        }
    }

    pub fn success(output: Value) -> Self {
        Self {
            output: Some(output),
            ..Self::with_status(TaskStatus::Success)
        }
    }

    /// Success without an output payload; nothing is written to the context
    pub fn success_empty() -> Self {
        Self::with_status(TaskStatus::Success)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(TaskStatus::Failed)
        }
    }

    /// Failure that still reports partial output
    pub fn failed_with_output(error: impl Into<String>, output: Value) -> Self {
        Self {
            output: Some(output),
            ..Self::failed(error)
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::with_status(TaskStatus::Skipped)
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_execution_time(mut self, elapsed: Duration) -> Self {
        self.execution_time = elapsed;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            TaskStatus::Success => write!(
                f,
                "✓ Success (in {:.3}s)",
                self.execution_time.as_secs_f64()
            ),
            TaskStatus::Failed => write!(
                f,
                "✗ Failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
            status => write!(f, "{}", status),
        }
    }
}

/// Aggregate counts for one executor run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub total_time: Duration,
}

impl RunSummary {
    pub fn from_results(results: &HashMap<String, TaskResult>) -> Self {
        let count = |status: TaskStatus| results.values().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            success: count(TaskStatus::Success),
            failed: count(TaskStatus::Failed),
            skipped: count(TaskStatus::Skipped),
            total_time: results.values().map(|r| r.execution_time).sum(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.success == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tasks: {} succeeded, {} failed, {} skipped in {:.3}s",
            self.total,
            self.success,
            self.failed,
            self.skipped,
            self.total_time.as_secs_f64()
        )
    }
}
