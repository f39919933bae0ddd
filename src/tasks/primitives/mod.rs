//! Single-actor building blocks
//!
//! Each primitive performs one operation and can be used on its own in a
//! workflow or driven by a generator. When the active config enables
//! `upsert_mode` and the task has both `use_registry` and an `actor_id`, the
//! actor is reconciled through the registry; otherwise a new one is spawned.

use serde_json::json;

use crate::engine::result::TaskResult;
use crate::scene::{ActorRef, SceneError};
use crate::workflow::context::ExecutionContext;

use super::{action, upsert_enabled};

pub mod apply_material;
pub mod create_camera;
pub mod create_light;
pub mod import_model;
pub mod spawn_actor;

pub use apply_material::ApplyMaterialTask;
pub use create_camera::CreateCameraTask;
pub use create_light::CreateLightTask;
pub use import_model::ImportModelTask;
pub use spawn_actor::SpawnActorTask;

/// Upsert through the registry when enabled, otherwise spawn
///
/// Returns the actor and `"created"` or `"updated"`.
pub(crate) fn place_actor<C, U>(
    ctx: &ExecutionContext,
    actor_id: Option<&str>,
    use_registry: bool,
    create: C,
    update: U,
) -> Result<(ActorRef, &'static str), SceneError>
where
    C: FnOnce() -> Result<ActorRef, SceneError>,
    U: FnOnce(&ActorRef) -> Result<(), SceneError>,
{
    match actor_id {
        Some(id) if upsert_enabled(ctx, use_registry) => {
            let (actor, was_created) = ctx.registry().update_or_create(id, create, update)?;
            Ok((actor, action(was_created)))
        }
        _ => Ok((create()?, action(true))),
    }
}

/// FAILED result that also carries the message as `{"error": ...}` output
pub(crate) fn failure(message: impl Into<String>) -> TaskResult {
    let message = message.into();
    TaskResult::failed_with_output(message.clone(), json!({ "error": message }))
}
