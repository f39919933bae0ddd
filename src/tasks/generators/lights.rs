use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{Color, LightType, Rotator};
use crate::tasks::primitives::failure;
use crate::workflow::context::ExecutionContext;

/// Optional per-light fields copied through untouched
const PASSTHROUGH_FIELDS: &[&str] = &["radius", "cast_shadows", "inner_cone_angle", "outer_cone_angle"];

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LightsGeneratorParams {
    lights: Vec<Map<String, Value>>,
    default_intensity: f64,
    default_color: Color,
    default_rotation: Rotator,
}

impl Default for LightsGeneratorParams {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            default_intensity: 5000.0,
            default_color: Color::WHITE,
            default_rotation: Rotator::ZERO,
        }
    }
}

/// Validate light definitions and fill in their defaults
///
/// Produces `{lights, count}` for a later `ForEachLightTask` to consume via
/// a reference such as `generate_lights.lights`.
pub struct LightsGeneratorTask {
    name: String,
    raw: Params,
    params: LightsGeneratorParams,
}

impl LightsGeneratorTask {
    pub const TYPE: &'static str = "LightsGeneratorTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }

    fn normalize(&self, idx: usize, light: &Map<String, Value>) -> Result<Value, String> {
        let p = &self.params;
        let light_type = light
            .get("light_type")
            .ok_or_else(|| format!("Light {} missing required field: light_type", idx))?;
        let location = light
            .get("location")
            .ok_or_else(|| format!("Light {} missing required field: location", idx))?;

        let valid = light_type
            .as_str()
            .and_then(LightType::from_name)
            .is_some();
        if !valid {
            let shown = light_type
                .as_str()
                .map_or_else(|| light_type.to_string(), str::to_string);
            return Err(format!(
                "Light {} has invalid light_type: {}. Must be one of: {}",
                idx,
                shown,
                LightType::NAMES.join(", ")
            ));
        }

        let mut normalized = json!({
            "light_type": light_type,
            "location": location,
            "rotation": light.get("rotation").cloned().unwrap_or_else(|| json!(p.default_rotation)),
            "intensity": light.get("intensity").cloned().unwrap_or_else(|| json!(p.default_intensity)),
            "color": light.get("color").cloned().unwrap_or_else(|| json!(p.default_color)),
            "actor_id": light.get("actor_id").cloned().unwrap_or_else(|| json!(format!("light_{}", idx))),
        });
        for field in PASSTHROUGH_FIELDS {
            if let Some(value) = light.get(*field) {
                normalized[*field] = value.clone();
            }
        }
        Ok(normalized)
    }
}

#[async_trait]
impl Task for LightsGeneratorTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, _ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        if self.params.lights.is_empty() {
            return Ok(failure("No lights defined"));
        }

        let mut lights = Vec::with_capacity(self.params.lights.len());
        for (idx, light) in self.params.lights.iter().enumerate() {
            match self.normalize(idx, light) {
                Ok(light) => lights.push(light),
                Err(message) => return Ok(failure(message)),
            }
        }

        let count = lights.len();
        Ok(TaskResult::success(json!({ "lights": lights, "count": count })))
    }
}
