use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use super::iteration_result;
use crate::engine::error::TaskError;
use crate::engine::result::{TaskResult, TaskStatus};
use crate::engine::task::{parse_params, Params, Task};
use crate::tasks::primitives::{failure, CreateLightTask};
use crate::workflow::context::ExecutionContext;

/// Light fields forwarded to each `CreateLightTask`
const LIGHT_FIELDS: &[&str] = &["light_type", "location", "rotation", "intensity", "color", "actor_id"];

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ForEachLightParams {
    lights_input: Option<String>,
    use_registry: bool,
}

impl Default for ForEachLightParams {
    fn default() -> Self {
        Self {
            lights_input: None,
            use_registry: true,
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Create every light of a list found in the context
pub struct ForEachLightTask {
    name: String,
    raw: Params,
    params: ForEachLightParams,
}

impl ForEachLightTask {
    pub const TYPE: &'static str = "ForEachLightTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }

    /// Params for the per-light task; rotation defaults to none
    fn light_params(&self, light: &Value) -> Params {
        let mut params = Map::new();
        if let Some(light) = light.as_object() {
            for field in LIGHT_FIELDS {
                if let Some(value) = light.get(*field).filter(|v| !v.is_null()) {
                    params.insert(field.to_string(), value.clone());
                }
            }
        }
        params
            .entry("rotation")
            .or_insert_with(|| json!([0.0, 0.0, 0.0]));
        params.insert("use_registry".to_string(), json!(self.params.use_registry));
        params
    }
}

#[async_trait]
impl Task for ForEachLightTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let input = self.params.lights_input.as_deref().unwrap_or_default();
        let lights = match ctx.resolve(input) {
            None | Some(Value::Null) => {
                return Ok(failure(format!("No lights found at input: {}", input)))
            }
            Some(Value::Array(lights)) if lights.is_empty() => {
                return Ok(failure(format!("No lights found at input: {}", input)))
            }
            Some(Value::Array(lights)) => lights.clone(),
            Some(other) => {
                return Ok(failure(format!(
                    "Lights input must be a list, got: {}",
                    json_type_name(other)
                )))
            }
        };

        let mut created = Vec::new();
        let mut failed = Vec::new();

        for (idx, light) in lights.iter().enumerate() {
            let actor_id = light.get("actor_id").cloned().unwrap_or(Value::Null);
            let task_name = format!("{}_light_{}", self.name, idx);

            let outcome = match CreateLightTask::new(task_name, self.light_params(light)) {
                Ok(task) => task.execute(ctx).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(result) if result.status == TaskStatus::Success => {
                    let action = result
                        .output
                        .as_ref()
                        .and_then(|o| o.get("action"))
                        .cloned()
                        .unwrap_or_else(|| json!("created"));
                    created.push(json!({
                        "actor_id": actor_id,
                        "light_type": light.get("light_type"),
                        "location": light.get("location"),
                        "action": action,
                    }));
                }
                Ok(result) => {
                    let error = result.error.unwrap_or_else(|| "Unknown error".to_string());
                    failed.push(json!({ "actor_id": actor_id, "error": error }));
                }
                Err(error) => {
                    warn!(index = idx, error = %error, "Light creation failed");
                    let actor_id = match actor_id {
                        Value::Null => json!(format!("light_{}", idx)),
                        id => id,
                    };
                    failed.push(json!({ "actor_id": actor_id, "error": error }));
                }
            }
        }

        let (successful, failures) = (created.len(), failed.len());
        let output = json!({
            "created_lights": created,
            "failed_lights": failed,
            "total_attempted": lights.len(),
            "successful": successful,
            "failed": failures,
        });
        Ok(iteration_result(successful, failures, output, "All lights failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::{run_task, to_params};
    use crate::scene::{MemoryScene, Rotator, Scene};
    use crate::workflow::config::WorkflowConfig;

    fn task(input: &str) -> ForEachLightTask {
        ForEachLightTask::new("lights", to_params(json!({"lights_input": input}))).unwrap()
    }

    #[tokio::test]
    async fn test_creates_lights_from_dotted_reference() {
        let scene = MemoryScene::shared();
        let mut ctx = ExecutionContext::with_scene(scene.clone());
        ctx.set_config(&WorkflowConfig::preset("incremental").unwrap());
        ctx.insert(
            "gen",
            json!({"lights": [
                {"light_type": "point", "location": [0, 0, 100], "actor_id": "fill"},
                {"light_type": "directional", "location": [0, 0, 500], "actor_id": "sun", "radius": 10}
            ]}),
        );

        let result = run_task(&task("gen.lights"), &mut ctx).await;
        assert!(result.is_success());
        let output = result.output.unwrap();
        assert_eq!(output["successful"], 2);
        assert_eq!(output["created_lights"][1]["actor_id"], "sun");
        assert_eq!(output["created_lights"][1]["action"], "created");

        let sun = scene.find_by_label("workflow_sun").unwrap();
        assert_eq!(sun.transform().rotation, Rotator::ZERO);

        let again = run_task(&task("gen.lights"), &mut ctx).await.output.unwrap();
        assert_eq!(again["created_lights"][0]["action"], "updated");
        assert_eq!(scene.actor_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_mistyped_input() {
        let mut ctx = ExecutionContext::new();
        ctx.insert("gen", json!({"lights": {"not": "a list"}}));

        let missing = run_task(&task("nothing.here"), &mut ctx).await;
        assert_eq!(
            missing.error.as_deref(),
            Some("No lights found at input: nothing.here")
        );

        let mistyped = run_task(&task("gen.lights"), &mut ctx).await;
        assert_eq!(
            mistyped.error.as_deref(),
            Some("Lights input must be a list, got: object")
        );
    }

    #[tokio::test]
    async fn test_partial_and_total_failure() {
        let mut ctx = ExecutionContext::new();
        ctx.insert(
            "mixed",
            json!([{"light_type": "point"}, {"light_type": "area", "actor_id": "bad"}]),
        );
        ctx.insert("broken", json!([{"light_type": "area"}]));

        let mixed = run_task(&task("mixed"), &mut ctx).await;
        assert!(mixed.is_success());
        assert_eq!(mixed.metadata["partial_success"], true);
        let output = mixed.output.unwrap();
        assert_eq!(output["failed_lights"][0]["actor_id"], "bad");
        assert_eq!(output["failed_lights"][0]["error"], "Unknown light type: area");

        let broken = run_task(&task("broken"), &mut ctx).await;
        assert_eq!(broken.status, TaskStatus::Failed);
        assert_eq!(broken.output.unwrap()["failed"], 1);
    }
}
