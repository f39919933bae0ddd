//! Material instance management

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::workflow::context::ExecutionContext;

/// Context key holding the material path published by [`MaterialUpsertTask`]
pub const MATERIAL_PATH_KEY: &str = "material_path";
/// Context key holding the colour parameter name of that material
pub const MATERIAL_VECTOR_PARAMETER_KEY: &str = "material_vector_parameter";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MaterialUpsertParams {
    material_path: String,
    parent_material_path: String,
    vector_parameter_name: String,
    allow_create: bool,
}

impl Default for MaterialUpsertParams {
    fn default() -> Self {
        Self {
            material_path: "/Game/Workflow/MI_RuntimeColorBase".to_string(),
            parent_material_path: "/Engine/BasicShapes/BasicShapeMaterial".to_string(),
            vector_parameter_name: "Color".to_string(),
            allow_create: true,
        }
    }
}

/// Ensure a material instance exists and publish its path to later tasks
pub struct MaterialUpsertTask {
    name: String,
    raw: Params,
    params: MaterialUpsertParams,
}

impl MaterialUpsertTask {
    pub const TYPE: &'static str = "MaterialUpsertTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for MaterialUpsertTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let scene = ctx.scene_handle();

        let mut created = false;
        if !scene.asset_exists(&p.material_path) {
            if !p.allow_create {
                return Ok(TaskResult::failed(format!(
                    "Material not found and creation disabled: {}",
                    p.material_path
                ))
                .with_metadata("material_path", p.material_path.as_str())
                .with_metadata("created", false));
            }
            if !scene.asset_exists(&p.parent_material_path) {
                return Ok(TaskResult::failed(format!(
                    "Parent material not found: {}",
                    p.parent_material_path
                )));
            }
            scene.create_material_instance(&p.material_path, &p.parent_material_path)?;
            info!(material = %p.material_path, parent = %p.parent_material_path, "Created material instance");
            created = true;
        }

        let has_parameter = scene
            .vector_parameters(&p.material_path)
            .iter()
            .any(|name| *name == p.vector_parameter_name);
        if !has_parameter {
            warn!(
                parameter = %p.vector_parameter_name,
                material = %p.material_path,
                "Vector parameter not found, colors may not apply"
            );
        }

        ctx.insert(MATERIAL_PATH_KEY, Value::from(p.material_path.as_str()));
        ctx.insert(
            MATERIAL_VECTOR_PARAMETER_KEY,
            Value::from(p.vector_parameter_name.as_str()),
        );

        Ok(TaskResult::success(json!({
            "material_path": p.material_path,
            "created": created,
            "vector_parameter_name": p.vector_parameter_name,
            "has_parameter": has_parameter,
        })))
    }
}
