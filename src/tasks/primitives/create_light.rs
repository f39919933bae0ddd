use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{failure, place_actor};
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{ActorKind, Color, LightType, Rotator, Transform, Vec3};
use crate::tasks::actor_value;
use crate::workflow::context::ExecutionContext;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CreateLightParams {
    light_type: String,
    location: Vec3,
    rotation: Rotator,
    intensity: f64,
    color: Color,
    actor_id: Option<String>,
    use_registry: bool,
}

impl Default for CreateLightParams {
    fn default() -> Self {
        Self {
            light_type: "point".to_string(),
            location: Vec3::new(0.0, 0.0, 300.0),
            rotation: Rotator::new(-45.0, 0.0, 0.0),
            intensity: 5000.0,
            color: Color::WHITE,
            actor_id: None,
            use_registry: true,
        }
    }
}

/// Spawn or update one point, spot or directional light
pub struct CreateLightTask {
    name: String,
    raw: Params,
    params: CreateLightParams,
}

impl CreateLightTask {
    pub const TYPE: &'static str = "CreateLightTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for CreateLightTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let Some(light_type) = LightType::from_name(&p.light_type) else {
            return Ok(failure(format!("Unknown light type: {}", p.light_type)));
        };

        let (light, action) = place_actor(
            ctx,
            p.actor_id.as_deref(),
            p.use_registry,
            || {
                let light = ctx.scene().spawn(
                    ActorKind::Light { light_type },
                    Transform::at(p.location).with_rotation(p.rotation),
                )?;
                light.configure_light(p.intensity, p.color)?;
                Ok(light)
            },
            |light| {
                light.set_location(p.location);
                light.set_rotation(p.rotation);
                light.configure_light(p.intensity, p.color)
            },
        )?;

        Ok(TaskResult::success(json!({
            "light": actor_value(&light),
            "action": action,
            "light_type": light_type.as_str(),
            "location": p.location,
        })))
    }
}
