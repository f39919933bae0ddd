//! Pattern spawners: grid, circle and spiral layouts of basic shapes
//!
//! The grid spawner reconciles through the actor registry in upsert mode,
//! using `"{row}_{col}"` ids, so re-running it moves the existing actors
//! instead of adding new ones.

use std::f64::consts::PI;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{actor_value, shape_or_cube, spawn_shape};
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{SceneError, Vec3};
use crate::workflow::context::ExecutionContext;

/// Centred grid position of `(row, col)`
pub fn grid_position(row: u32, col: u32, rows: u32, cols: u32, spacing: f64) -> Vec3 {
    let x = f64::from(col) * spacing - f64::from(cols.saturating_sub(1)) * spacing / 2.0;
    let y = f64::from(row) * spacing - f64::from(rows.saturating_sub(1)) * spacing / 2.0;
    Vec3::new(x, y, 0.0)
}

/// Evenly spaced points on a circle in the XY plane
pub fn circle_positions(count: u32, radius: f64, height: f64) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = 2.0 * PI * f64::from(i) / f64::from(count);
            Vec3::new(radius * angle.cos(), radius * angle.sin(), height)
        })
        .collect()
}

/// Two full turns of a rising spiral whose radius grows to `max_radius`
pub fn spiral_positions(count: u32, max_radius: f64, height_increment: f64) -> Vec<Vec3> {
    let last = f64::from(count.saturating_sub(1).max(1));
    (0..count)
        .map(|i| {
            let t = f64::from(i) / last;
            let angle = 4.0 * PI * t;
            let radius = max_radius * t;
            Vec3::new(
                radius * angle.cos(),
                radius * angle.sin(),
                f64::from(i) * height_increment,
            )
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpawnGridParams {
    rows: u32,
    cols: u32,
    spacing: f64,
    shape: String,
    scale: f64,
}

impl Default for SpawnGridParams {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 5,
            spacing: 200.0,
            shape: "cube".to_string(),
            scale: 1.0,
        }
    }
}

pub struct SpawnGridTask {
    name: String,
    raw: Params,
    params: SpawnGridParams,
}

impl SpawnGridTask {
    pub const TYPE: &'static str = "SpawnGridTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for SpawnGridTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let shape = shape_or_cube(&p.shape);
        let upsert = ctx.config().upsert_mode;
        let scene = ctx.scene();

        let mut actors = Vec::new();
        let mut created = 0usize;
        let mut updated = 0usize;

        if upsert {
            let mut registry = ctx.registry();
            for row in 0..p.rows {
                for col in 0..p.cols {
                    let location = grid_position(row, col, p.rows, p.cols, p.spacing);
                    let (actor, was_created) = registry.update_or_create(
                        &format!("{}_{}", row, col),
                        || spawn_shape(scene, shape, location, p.scale),
                        |actor| {
                            actor.set_location(location);
                            actor.set_scale(Vec3::splat(p.scale));
                            Ok::<_, SceneError>(())
                        },
                    )?;
                    if was_created {
                        created += 1;
                    } else {
                        updated += 1;
                    }
                    actors.push(actor_value(&actor));
                }
            }
        } else {
            for row in 0..p.rows {
                for col in 0..p.cols {
                    let location = grid_position(row, col, p.rows, p.cols, p.spacing);
                    let actor = spawn_shape(scene, shape, location, p.scale)?;
                    actors.push(actor_value(&actor));
                }
            }
        }

        info!(count = actors.len(), shape = shape.as_str(), "Spawned grid");

        let count = actors.len();
        let mut output = json!({ "actors": actors, "actor_count": count });
        if upsert {
            output["created"] = json!(created);
            output["updated"] = json!(updated);
        }

        Ok(TaskResult::success(output)
            .with_metadata("pattern", "grid")
            .with_metadata("rows", p.rows)
            .with_metadata("cols", p.cols)
            .with_metadata("shape", shape.as_str())
            .with_metadata("upsert_mode", upsert))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpawnCircleParams {
    count: u32,
    radius: f64,
    shape: String,
}

impl Default for SpawnCircleParams {
    fn default() -> Self {
        Self {
            count: 12,
            radius: 500.0,
            shape: "sphere".to_string(),
        }
    }
}

pub struct SpawnCircleTask {
    name: String,
    raw: Params,
    params: SpawnCircleParams,
}

impl SpawnCircleTask {
    pub const TYPE: &'static str = "SpawnCircleTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for SpawnCircleTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let shape = shape_or_cube(&p.shape);
        let scene = ctx.scene();

        let actors = circle_positions(p.count, p.radius, 0.0)
            .into_iter()
            .map(|location| spawn_shape(scene, shape, location, 1.0).map(|a| actor_value(&a)))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = actors.len(), radius = p.radius, "Spawned circle");

        let count = actors.len();
        Ok(TaskResult::success(json!({ "actors": actors, "count": count }))
            .with_metadata("pattern", "circle")
            .with_metadata("radius", p.radius)
            .with_metadata("shape", p.shape.as_str()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpawnSpiralParams {
    count: u32,
    max_radius: f64,
    height_increment: f64,
    shape: String,
}

impl Default for SpawnSpiralParams {
    fn default() -> Self {
        Self {
            count: 15,
            max_radius: 400.0,
            height_increment: 50.0,
            shape: "cylinder".to_string(),
        }
    }
}

pub struct SpawnSpiralTask {
    name: String,
    raw: Params,
    params: SpawnSpiralParams,
}

impl SpawnSpiralTask {
    pub const TYPE: &'static str = "SpawnSpiralTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for SpawnSpiralTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let shape = shape_or_cube(&p.shape);
        let scene = ctx.scene();

        let actors = spiral_positions(p.count, p.max_radius, p.height_increment)
            .into_iter()
            .map(|location| spawn_shape(scene, shape, location, 1.0).map(|a| actor_value(&a)))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = actors.len(), "Spawned spiral");

        let count = actors.len();
        Ok(TaskResult::success(json!({ "actors": actors, "count": count }))
            .with_metadata("pattern", "spiral")
            .with_metadata("max_radius", p.max_radius)
            .with_metadata("height_increment", p.height_increment)
            .with_metadata("shape", p.shape.as_str()))
    }
}
