use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::Vec3;
use crate::tasks::patterns::grid_position;
use crate::workflow::context::ExecutionContext;

/// Context key the generated points are published under
pub const GRID_POINTS_KEY: &str = "grid_points";
/// Context key holding the grid dimensions
pub const GRID_CONFIG_KEY: &str = "grid_config";

/// One generated spawn position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub actor_id: String,
    pub row: u32,
    pub col: u32,
    pub location: Vec3,
    pub shape: String,
    pub scale: f64,
    pub index: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GridGeneratorParams {
    rows: u32,
    cols: u32,
    spacing: f64,
    center_offset: Vec3,
    shape: String,
    scale: f64,
}

impl Default for GridGeneratorParams {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            spacing: 200.0,
            center_offset: Vec3::ZERO,
            shape: "sphere".to_string(),
            scale: 1.0,
        }
    }
}

/// Compute grid positions without spawning anything
pub struct GridGeneratorTask {
    name: String,
    raw: Params,
    params: GridGeneratorParams,
}

impl GridGeneratorTask {
    pub const TYPE: &'static str = "GridGeneratorTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }

    fn points(&self) -> Vec<GridPoint> {
        let p = &self.params;
        let offset = p.center_offset;
        (0..p.rows)
            .flat_map(|row| (0..p.cols).map(move |col| (row, col)))
            .map(|(row, col)| {
                let base = grid_position(row, col, p.rows, p.cols, p.spacing);
                GridPoint {
                    actor_id: format!("{}_{}", row, col),
                    row,
                    col,
                    location: Vec3::new(base.x + offset.x, base.y + offset.y, offset.z),
                    shape: p.shape.clone(),
                    scale: p.scale,
                    index: row * p.cols + col,
                }
            })
            .collect()
    }
}

#[async_trait]
impl Task for GridGeneratorTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let points = serde_json::to_value(self.points())?;
        let total = points.as_array().map_or(0, Vec::len);

        ctx.insert(GRID_POINTS_KEY, points.clone());
        ctx.insert(
            GRID_CONFIG_KEY,
            json!({
                "rows": p.rows,
                "cols": p.cols,
                "spacing": p.spacing,
                "total_points": total,
            }),
        );

        Ok(TaskResult::success(json!({
            "grid_points": points,
            "total_points": total,
            "rows": p.rows,
            "cols": p.cols,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::{run_task, to_params};

    #[tokio::test]
    async fn test_generates_points_into_context() {
        let mut ctx = ExecutionContext::new();
        let task = GridGeneratorTask::new(
            "gen",
            to_params(json!({"rows": 2, "cols": 3, "spacing": 100, "center_offset": [10, 20, 30]})),
        )
        .unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(result.is_success());
        assert_eq!(result.output.unwrap()["total_points"], 6);

        let points: Vec<GridPoint> = ctx.get_as(GRID_POINTS_KEY).unwrap().unwrap();
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].actor_id, "0_0");
        assert_eq!(points[0].location, Vec3::new(-90.0, -30.0, 30.0));
        assert_eq!(points[5].actor_id, "1_2");
        assert_eq!(points[5].index, 5);
        assert_eq!(points[5].location, Vec3::new(110.0, 70.0, 30.0));
        assert_eq!(points[5].shape, "sphere");

        assert_eq!(ctx.get(GRID_CONFIG_KEY).unwrap()["total_points"], 6);
    }

    #[tokio::test]
    async fn test_empty_grid() {
        let mut ctx = ExecutionContext::new();
        let task = GridGeneratorTask::new("gen", to_params(json!({"rows": 0}))).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert!(result.is_success());
        assert_eq!(ctx.get(GRID_POINTS_KEY), Some(&json!([])));
    }
}
