use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::place_actor;
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{ActorKind, Rotator, Transform, Vec3};
use crate::tasks::actor_value;
use crate::workflow::context::ExecutionContext;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CreateCameraParams {
    location: Vec3,
    rotation: Rotator,
    fov: f64,
    actor_id: Option<String>,
    use_registry: bool,
}

impl Default for CreateCameraParams {
    fn default() -> Self {
        Self {
            location: Vec3::new(0.0, 0.0, 200.0),
            rotation: Rotator::ZERO,
            fov: 90.0,
            actor_id: None,
            use_registry: true,
        }
    }
}

pub struct CreateCameraTask {
    name: String,
    raw: Params,
    params: CreateCameraParams,
}

impl CreateCameraTask {
    pub const TYPE: &'static str = "CreateCameraTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for CreateCameraTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;

        let (camera, action) = place_actor(
            ctx,
            p.actor_id.as_deref(),
            p.use_registry,
            || {
                let camera = ctx.scene().spawn(
                    ActorKind::Camera,
                    Transform::at(p.location).with_rotation(p.rotation),
                )?;
                camera.set_field_of_view(p.fov)?;
                Ok(camera)
            },
            |camera| {
                camera.set_location(p.location);
                camera.set_rotation(p.rotation);
                camera.set_field_of_view(p.fov)
            },
        )?;

        Ok(TaskResult::success(json!({
            "camera": actor_value(&camera),
            "action": action,
            "location": p.location,
            "fov": p.fov,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::{run_task, to_params};
    use crate::scene::{MemoryScene, Scene};
    use crate::workflow::config::WorkflowConfig;

    #[tokio::test]
    async fn test_camera_defaults() {
        let scene = MemoryScene::shared();
        let mut ctx = ExecutionContext::with_scene(scene.clone());

        let task = CreateCameraTask::new("cam", Params::new()).unwrap();
        let output = run_task(&task, &mut ctx).await.output.unwrap();

        assert_eq!(output["action"], "created");
        assert_eq!(output["fov"], 90.0);
        let snapshots = scene.snapshot();
        assert_eq!(snapshots[0].kind, ActorKind::Camera);
        assert_eq!(snapshots[0].field_of_view, Some(90.0));
        assert_eq!(snapshots[0].transform.location, Vec3::new(0.0, 0.0, 200.0));
    }

    #[tokio::test]
    async fn test_camera_upsert_updates_fov() {
        let scene = MemoryScene::shared();
        let mut ctx = ExecutionContext::with_scene(scene.clone());
        ctx.set_config(&WorkflowConfig::preset("incremental").unwrap());

        let wide = CreateCameraTask::new("cam", to_params(json!({"actor_id": "main", "fov": 110})))
            .unwrap();
        let narrow = CreateCameraTask::new("cam", to_params(json!({"actor_id": "main", "fov": 45})))
            .unwrap();

        run_task(&wide, &mut ctx).await;
        let output = run_task(&narrow, &mut ctx).await.output.unwrap();

        assert_eq!(output["action"], "updated");
        assert_eq!(scene.actor_count(), 1);
        let camera = scene.find_by_label("workflow_main").unwrap();
        assert_eq!(camera.snapshot().field_of_view, Some(45.0));
    }
}
