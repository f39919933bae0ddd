//! Built-in task types
//!
//! - `level` - level-wide operations (`ClearLevelTask`)
//! - `patterns` - spawn actors in grid, circle and spiral layouts
//! - `color` - colour actors by label or by id map
//! - `material` - ensure a material instance exists
//! - `primitives` - single-actor operations (spawn, material, camera, light, import)
//! - `generators` - produce data in the context and iterate over it
//!
//! Every task keeps its raw params untouched and parses them into a typed
//! struct at construction, so a bad parameter fails at load time.

use serde_json::Value;
use tracing::warn;

use crate::engine::task::Params;
use crate::scene::{ActorKind, ActorRef, Scene, SceneError, Shape, Transform, Vec3};
use crate::workflow::context::ExecutionContext;
use crate::workflow::registry::TaskRegistry;

/// Implements the identity half of [`Task`](crate::engine::task::Task) for a
/// struct with `name` and `raw` fields
macro_rules! task_identity {
    ($type_name:expr) => {
        fn name(&self) -> &str {
            &self.name
        }

        fn type_name(&self) -> &'static str {
            $type_name
        }

        fn params(&self) -> &$crate::engine::task::Params {
            &self.raw
        }
    };
}

pub mod color;
pub mod generators;
pub mod level;
pub mod material;
pub mod patterns;
pub mod primitives;

pub use color::{ColorGridTask, SetActorColorTask};
pub use generators::{
    ForEachLightTask, ForEachMaterialTask, ForEachSpawnTask, GridGeneratorTask, GridPoint,
    LightsGeneratorTask,
};
pub use level::ClearLevelTask;
pub use material::MaterialUpsertTask;
pub use patterns::{SpawnCircleTask, SpawnGridTask, SpawnSpiralTask};
pub use primitives::{
    ApplyMaterialTask, CreateCameraTask, CreateLightTask, ImportModelTask, SpawnActorTask,
};

/// Register every built-in task type
pub fn register_builtin(registry: &mut TaskRegistry) {
    macro_rules! builtin {
        ($($task:ty),* $(,)?) => {
            $(
                registry.register(<$task>::TYPE, |name: &str, params: &Params| {
                    Ok(Box::new(<$task>::new(name, params.clone())?) as Box<dyn crate::engine::task::Task>)
                });
            )*
        };
    }

    builtin!(
        ClearLevelTask,
        SpawnGridTask,
        SpawnCircleTask,
        SpawnSpiralTask,
        SetActorColorTask,
        ColorGridTask,
        MaterialUpsertTask,
        SpawnActorTask,
        ApplyMaterialTask,
        CreateCameraTask,
        CreateLightTask,
        ImportModelTask,
        GridGeneratorTask,
        ForEachSpawnTask,
        ForEachMaterialTask,
        LightsGeneratorTask,
        ForEachLightTask,
    );
}

/// How an actor is referred to in task output
pub(crate) fn actor_value(actor: &ActorRef) -> Value {
    Value::String(actor.label())
}

/// Resolve a shape name, falling back to a cube for pattern spawners
pub(crate) fn shape_or_cube(name: &str) -> Shape {
    Shape::from_name(name).unwrap_or_else(|| {
        warn!(shape = %name, "Unknown shape, using cube");
        Shape::Cube
    })
}

pub(crate) fn spawn_shape(
    scene: &dyn Scene,
    shape: Shape,
    location: Vec3,
    scale: f64,
) -> Result<ActorRef, SceneError> {
    scene.spawn(
        ActorKind::Shape { shape },
        Transform::at(location).with_scale(Vec3::splat(scale)),
    )
}

/// Whether a task should reconcile through the actor registry
pub(crate) fn upsert_enabled(ctx: &ExecutionContext, use_registry: bool) -> bool {
    use_registry && ctx.config().upsert_mode
}

/// Output label for whether the upsert created or reused an actor
pub(crate) fn action(was_created: bool) -> &'static str {
    if was_created {
        "created"
    } else {
        "updated"
    }
}
