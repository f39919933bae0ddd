use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::grid::GRID_POINTS_KEY;
use super::iteration_result;
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{Rotator, SceneError, Shape, Vec3};
use crate::tasks::primitives::failure;
use crate::tasks::{actor_value, spawn_shape, upsert_enabled};
use crate::workflow::context::ExecutionContext;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ForEachSpawnParams {
    data_key: String,
    use_registry: bool,
}

impl Default for ForEachSpawnParams {
    fn default() -> Self {
        Self {
            data_key: GRID_POINTS_KEY.to_string(),
            use_registry: true,
        }
    }
}

/// One item of spawn data; extra fields such as `row` are ignored
#[derive(Debug, Deserialize)]
#[serde(default)]
struct SpawnPoint {
    shape: String,
    location: Vec3,
    rotation: Rotator,
    scale: f64,
    actor_id: Option<String>,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            shape: "sphere".to_string(),
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: 1.0,
            actor_id: None,
        }
    }
}

/// Spawn one actor for every item of a list in the context
pub struct ForEachSpawnTask {
    name: String,
    raw: Params,
    params: ForEachSpawnParams,
}

impl ForEachSpawnTask {
    pub const TYPE: &'static str = "ForEachSpawnTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for ForEachSpawnTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let items = match ctx.get(&p.data_key).and_then(Value::as_array) {
            Some(items) if !items.is_empty() => items.clone(),
            _ => {
                return Ok(failure(format!(
                    "No data found in context[\"{}\"]",
                    p.data_key
                )))
            }
        };

        let upsert = upsert_enabled(ctx, p.use_registry);
        let mut registry = upsert.then(|| ctx.registry());
        let scene = ctx.scene();

        let mut actors = Vec::new();
        let mut created = 0usize;
        let mut updated = 0usize;
        let mut failures = 0usize;

        for (idx, item) in items.into_iter().enumerate() {
            let point: SpawnPoint = match serde_json::from_value(item) {
                Ok(point) => point,
                Err(e) => {
                    warn!(index = idx, error = %e, "Invalid spawn data, skipping");
                    failures += 1;
                    continue;
                }
            };
            let Some(shape) = Shape::from_name(&point.shape) else {
                warn!(shape = %point.shape, "Unknown shape, skipping");
                continue;
            };

            let create = || spawn_shape(scene, shape, point.location, point.scale);
            let placed = match (registry.as_mut(), point.actor_id.as_deref()) {
                (Some(registry), Some(id)) => registry.update_or_create(id, create, |actor| {
                    actor.set_location(point.location);
                    actor.set_scale(Vec3::splat(point.scale));
                    Ok::<_, SceneError>(())
                }),
                _ => create().map(|actor| (actor, true)),
            };

            match placed {
                Ok((actor, was_created)) => {
                    if was_created {
                        created += 1;
                    } else {
                        updated += 1;
                    }
                    if !point.rotation.is_zero() {
                        actor.set_rotation(point.rotation);
                    }
                    actors.push(actor_value(&actor));
                }
                Err(e) => {
                    warn!(index = idx, error = %e, "Spawn failed");
                    failures += 1;
                }
            }
        }

        let count = actors.len();
        let output = json!({
            "actors": actors,
            "actor_count": count,
            "created": created,
            "updated": updated,
        });
        Ok(iteration_result(count, failures, output, "All spawns failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::TaskStatus;
    use crate::engine::task::{run_task, to_params};
    use crate::scene::{MemoryScene, Scene};
    use crate::workflow::config::WorkflowConfig;

    #[tokio::test]
    async fn test_missing_data_fails() {
        let mut ctx = ExecutionContext::new();
        let task = ForEachSpawnTask::new("spawn", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(
            result.error.as_deref(),
            Some("No data found in context[\"grid_points\"]")
        );

        ctx.insert(GRID_POINTS_KEY, json!([]));
        assert!(!run_task(&task, &mut ctx).await.is_success());
    }

    #[tokio::test]
    async fn test_spawns_points_and_skips_unknown_shapes() {
        let scene = MemoryScene::shared();
        let mut ctx = ExecutionContext::with_scene(scene.clone());
        ctx.insert(
            "points",
            json!([
                {"shape": "cube", "location": [1, 2, 3], "rotation": [0, 45, 0], "row": 0},
                {"shape": "pyramid"},
                {"location": [4, 5, 6], "scale": 3}
            ]),
        );

        let task = ForEachSpawnTask::new("spawn", to_params(json!({"data_key": "points"}))).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(result.is_success());
        let output = result.output.unwrap();
        assert_eq!(output["actor_count"], 2);
        assert_eq!(output["created"], 2);
        assert_eq!(output["updated"], 0);

        let snapshots = scene.snapshot();
        assert_eq!(snapshots[0].transform.rotation, Rotator::new(0.0, 45.0, 0.0));
        assert_eq!(snapshots[1].kind, crate::scene::ActorKind::Shape { shape: Shape::Sphere });
        assert_eq!(snapshots[1].transform.scale, Vec3::splat(3.0));
    }

    #[tokio::test]
    async fn test_upsert_reuses_actors() {
        let scene = MemoryScene::shared();
        let mut ctx = ExecutionContext::with_scene(scene.clone());
        ctx.set_config(&WorkflowConfig::preset("incremental").unwrap());
        ctx.insert(
            GRID_POINTS_KEY,
            json!([
                {"actor_id": "0_0", "location": [0, 0, 0]},
                {"actor_id": "0_1", "location": [100, 0, 0]}
            ]),
        );

        let task = ForEachSpawnTask::new("spawn", Params::new()).unwrap();
        run_task(&task, &mut ctx).await;
        let output = run_task(&task, &mut ctx).await.output.unwrap();

        assert_eq!(output["created"], 0);
        assert_eq!(output["updated"], 2);
        assert_eq!(scene.actor_count(), 2);
        assert!(scene.find_by_label("workflow_0_1").is_some());
    }

    #[tokio::test]
    async fn test_partial_failure_is_flagged() {
        let mut ctx = ExecutionContext::new();
        ctx.insert(
            GRID_POINTS_KEY,
            json!([{"shape": "cube"}, {"location": "nowhere"}]),
        );

        let task = ForEachSpawnTask::new("spawn", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(result.is_success());
        assert_eq!(result.metadata["partial_success"], true);
    }
}
