use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{failure, place_actor};
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{ActorKind, Rotator, Shape, Transform, Vec3};
use crate::tasks::actor_value;
use crate::workflow::context::ExecutionContext;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpawnActorParams {
    shape: String,
    location: Vec3,
    rotation: Rotator,
    scale: f64,
    actor_id: Option<String>,
    use_registry: bool,
}

impl Default for SpawnActorParams {
    fn default() -> Self {
        Self {
            shape: "sphere".to_string(),
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: 1.0,
            actor_id: None,
            use_registry: true,
        }
    }
}

/// Spawn one basic shape
pub struct SpawnActorTask {
    name: String,
    raw: Params,
    params: SpawnActorParams,
}

impl SpawnActorTask {
    pub const TYPE: &'static str = "SpawnActorTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for SpawnActorTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let Some(shape) = Shape::from_name(&p.shape) else {
            return Ok(failure(format!("Unknown shape: {}", p.shape)));
        };
        let scale = Vec3::splat(p.scale);

        let (actor, action) = place_actor(
            ctx,
            p.actor_id.as_deref(),
            p.use_registry,
            || {
                ctx.scene().spawn(
                    ActorKind::Shape { shape },
                    Transform::at(p.location).with_scale(scale),
                )
            },
            |actor| {
                actor.set_location(p.location);
                actor.set_scale(scale);
                Ok(())
            },
        )?;

        if !p.rotation.is_zero() {
            actor.set_rotation(p.rotation);
        }

        Ok(TaskResult::success(json!({
            "actor": actor_value(&actor),
            "action": action,
            "location": p.location,
            "shape": shape.as_str(),
        })))
    }
}
