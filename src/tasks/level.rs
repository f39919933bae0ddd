//! Level-wide tasks

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::workflow::context::ExecutionContext;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClearLevelParams {}

/// Destroy every non-essential actor in the level
pub struct ClearLevelTask {
    name: String,
    raw: Params,
}

impl ClearLevelTask {
    pub const TYPE: &'static str = "ClearLevelTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        let _: ClearLevelParams = parse_params(&raw)?;
        Ok(Self {
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for ClearLevelTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let scene = ctx.scene();
        let initial = scene.actor_count();
        scene.clear()?;
        let remaining = scene.actor_count();

        Ok(TaskResult::success(json!({ "deleted_count": initial - remaining }))
            .with_metadata("initial_actors", initial)
            .with_metadata("final_actors", remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::{run_task, to_params};
    use crate::scene::{ActorKind, MemoryScene, Scene, Shape, Transform};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_clear_reports_counts() {
        let scene = Arc::new(MemoryScene::with_essentials());
        for _ in 0..3 {
            scene
                .spawn(ActorKind::Shape { shape: Shape::Cube }, Transform::default())
                .unwrap();
        }
        let mut ctx = ExecutionContext::with_scene(scene.clone());

        let task = ClearLevelTask::new("clear", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(result.is_success());
        assert_eq!(result.output, Some(json!({"deleted_count": 3})));
        assert_eq!(result.metadata["initial_actors"], 5);
        assert_eq!(result.metadata["final_actors"], 2);
        assert_eq!(scene.actor_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_failure_fails_task() {
        let scene = Arc::new(MemoryScene::new());
        scene.fail_clear_with("level is locked");
        let mut ctx = ExecutionContext::with_scene(scene);

        let task = ClearLevelTask::new("clear", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(!result.is_success());
        assert!(result.error.unwrap().contains("level is locked"));
    }

    #[test]
    fn test_rejects_params() {
        assert!(ClearLevelTask::new("clear", to_params(json!({"force": true}))).is_err());
    }
}
