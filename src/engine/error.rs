//! Engine error types

use super::workflow_graph::GraphError;
use crate::scene::SceneError;

/// Errors that abort a whole `execute` call
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Workflow validation failed: {0}")]
    Validation(#[from] GraphError),
}

/// Errors a task body may return; the run harness turns them into a FAILED result
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
