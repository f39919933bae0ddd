//! Generators and iterators
//!
//! Generators compute data (grid points, normalised light definitions) and
//! publish it to the context or their output. The `ForEach*` tasks walk such
//! data and perform one primitive operation per item.

use serde_json::Value;

use crate::engine::result::TaskResult;

pub mod for_each_light;
pub mod for_each_material;
pub mod for_each_spawn;
pub mod grid;
pub mod lights;

pub use for_each_light::ForEachLightTask;
pub use for_each_material::ForEachMaterialTask;
pub use for_each_spawn::ForEachSpawnTask;
pub use grid::{GridGeneratorTask, GridPoint, GRID_CONFIG_KEY, GRID_POINTS_KEY};
pub use lights::LightsGeneratorTask;

/// Fold per-item outcomes of an iteration into one result
///
/// Every item failing is a failure. Some items failing is still a success,
/// flagged with `partial_success` metadata.
pub(crate) fn iteration_result(
    succeeded: usize,
    failed: usize,
    output: Value,
    all_failed: &str,
) -> TaskResult {
    match (succeeded, failed) {
        (_, 0) => TaskResult::success(output),
        (0, _) => TaskResult::failed_with_output(all_failed, output),
        _ => TaskResult::success(output)
            .with_metadata("partial_success", true)
            .with_metadata("failed_items", failed),
    }
}
