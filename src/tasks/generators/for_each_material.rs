use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::iteration_result;
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::tasks::primitives::failure;
use crate::workflow::context::ExecutionContext;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ForEachMaterialParams {
    material_map: BTreeMap<String, String>,
    data_key: String,
}

impl Default for ForEachMaterialParams {
    fn default() -> Self {
        Self {
            material_map: BTreeMap::new(),
            data_key: "material_map".to_string(),
        }
    }
}

/// Apply a material to each registry actor named in an id → material map
///
/// The map comes from params, or from the context under `data_key` when the
/// params map is empty.
pub struct ForEachMaterialTask {
    name: String,
    raw: Params,
    params: ForEachMaterialParams,
}

impl ForEachMaterialTask {
    pub const TYPE: &'static str = "ForEachMaterialTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }

    fn material_map(
        &self,
        ctx: &ExecutionContext,
    ) -> Result<BTreeMap<String, String>, TaskError> {
        if !self.params.material_map.is_empty() {
            return Ok(self.params.material_map.clone());
        }
        let from_context: Option<BTreeMap<String, String>> = ctx
            .get_as(&self.params.data_key)
            .map_err(|e| TaskError::InvalidParams(format!("{}: {}", self.params.data_key, e)))?;
        Ok(from_context.unwrap_or_default())
    }
}

#[async_trait]
impl Task for ForEachMaterialTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let material_map = self.material_map(ctx)?;
        if material_map.is_empty() {
            return Ok(failure("No material mapping found"));
        }

        let registry = ctx.registry();
        let scene = ctx.scene();
        let mut matching = Vec::new();
        let mut errors = Vec::new();

        for (actor_id, material_path) in &material_map {
            let Some(actor) = registry.get(actor_id) else {
                errors.push(format!("Actor '{}' not found in registry", actor_id));
                continue;
            };
            if !scene.asset_exists(material_path) {
                errors.push(format!("Failed to apply material to '{}'", actor_id));
                continue;
            }
            match actor.set_material(material_path, 0) {
                Ok(()) => {
                    debug!(actor = %actor.label(), material = %material_path, "Applied material");
                    matching.push(registry.full_id(actor_id));
                }
                Err(e) => errors.push(format!("Error applying material to '{}': {}", actor_id, e)),
            }
        }

        let modified = matching.len();
        let failed = errors.len();
        let output = json!({
            "modified_count": modified,
            "material_map_size": material_map.len(),
            "matching_actors": matching,
            "errors": errors,
        });
        Ok(iteration_result(modified, failed, output, "No materials applied"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::TaskStatus;
    use crate::engine::task::{run_task, to_params};
    use crate::scene::{ActorKind, MemoryScene, Scene, Shape, Transform};
    use std::sync::Arc;

    const MATERIAL: &str = "/Engine/BasicShapes/BasicShapeMaterial";

    fn scene_with(labels: &[&str]) -> Arc<MemoryScene> {
        let scene = MemoryScene::shared();
        for label in labels {
            scene
                .spawn(ActorKind::Shape { shape: Shape::Cube }, Transform::default())
                .unwrap()
                .set_label(label);
        }
        scene
    }

    #[tokio::test]
    async fn test_no_mapping() {
        let mut ctx = ExecutionContext::new();
        let task = ForEachMaterialTask::new("mats", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert_eq!(result.error.as_deref(), Some("No material mapping found"));
    }

    #[tokio::test]
    async fn test_partial_application() {
        let scene = scene_with(&["workflow_a"]);
        let mut ctx = ExecutionContext::with_scene(scene.clone());

        let task = ForEachMaterialTask::new(
            "mats",
            to_params(json!({"material_map": {"a": MATERIAL, "ghost": MATERIAL}})),
        )
        .unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(result.is_success());
        assert_eq!(result.metadata["partial_success"], true);
        let output = result.output.unwrap();
        assert_eq!(output["modified_count"], 1);
        assert_eq!(output["matching_actors"], json!(["workflow_a"]));
        assert_eq!(output["errors"], json!(["Actor 'ghost' not found in registry"]));
    }

    #[tokio::test]
    async fn test_map_from_context_and_total_failure() {
        let scene = scene_with(&["workflow_a"]);
        let mut ctx = ExecutionContext::with_scene(scene);
        ctx.insert("material_map", json!({"a": "/Game/M_Missing"}));

        let task = ForEachMaterialTask::new("mats", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(
            result.output.unwrap()["errors"],
            json!(["Failed to apply material to 'a'"])
        );
    }
}
