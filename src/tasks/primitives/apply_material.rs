use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::failure;
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::ActorRef;
use crate::workflow::context::ExecutionContext;

/// Context key naming the label of the actor to operate on
pub const ACTOR_KEY: &str = "actor";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ApplyMaterialParams {
    actor_id: Option<String>,
    material_path: Option<String>,
    material_slot: u32,
}

/// Set the material in one slot of one actor
///
/// The actor is taken from the `actor` context key (a label) when present,
/// otherwise looked up in the registry by `actor_id`.
pub struct ApplyMaterialTask {
    name: String,
    raw: Params,
    params: ApplyMaterialParams,
}

impl ApplyMaterialTask {
    pub const TYPE: &'static str = "ApplyMaterialTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }

    fn find_actor(&self, ctx: &ExecutionContext) -> Option<ActorRef> {
        let from_context = ctx
            .get(ACTOR_KEY)
            .and_then(Value::as_str)
            .and_then(|label| ctx.scene().find_by_label(label));

        from_context.or_else(|| {
            self.params
                .actor_id
                .as_deref()
                .and_then(|id| ctx.registry().get(id))
        })
    }
}

#[async_trait]
impl Task for ApplyMaterialTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let Some(actor) = self.find_actor(ctx) else {
            return Ok(failure("No actor specified or found"));
        };
        let Some(material_path) = p.material_path.as_deref().filter(|m| !m.is_empty()) else {
            return Ok(failure("No material_path specified"));
        };

        let applied = if ctx.scene().asset_exists(material_path) {
            actor
                .set_material(material_path, p.material_slot)
                .map_err(|e| warn!(actor = %actor.label(), error = %e, "Could not set material"))
                .is_ok()
        } else {
            warn!(material = %material_path, "Material asset not found");
            false
        };

        if !applied {
            return Ok(failure(format!("Failed to apply material: {}", material_path)));
        }

        Ok(TaskResult::success(json!({
            "actor_label": actor.label(),
            "material_path": material_path,
            "material_slot": p.material_slot,
        })))
    }
}
