//! Actor registry for upsert reconciliation
//!
//! Maps stable string ids to live actors. The registry owns no state of its
//! own between runs: on construction it rescans the scene and indexes every
//! actor whose label starts with the prefix, and `register` writes the full
//! id back onto the actor's label. A later rescan therefore recovers the
//! same mapping, which is what makes repeated workflow runs converge on one
//! actor per id.
//!
//! Actors renamed or deleted outside the workflow fall out of the index and
//! will be created again.

use std::collections::HashMap;

use tracing::debug;

use crate::scene::{ActorRef, Scene};

pub struct ActorRegistry {
    prefix: String,
    actors: HashMap<String, ActorRef>,
}

impl ActorRegistry {
    /// Scan the scene for actors labelled with `prefix`
    pub fn new(scene: &dyn Scene, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let mut actors = HashMap::new();

        for actor in scene.actors() {
            let label = actor.label();
            if label.starts_with(&prefix) {
                actors.entry(label).or_insert(actor);
            }
        }

        if !actors.is_empty() {
            debug!(count = actors.len(), prefix = %prefix, "Loaded existing actors");
        }

        Self { prefix, actors }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Label an actor tracked under `id` carries
    pub fn full_id(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Track `actor` under `id` and stamp the full id onto its label
    pub fn register(&mut self, id: &str, actor: ActorRef) {
        let full_id = self.full_id(id);
        actor.set_label(&full_id);
        debug!(label = %full_id, actor = %actor.name(), "Registered actor");
        self.actors.insert(full_id, actor);
    }

    pub fn exists(&self, id: &str) -> bool {
        self.actors.contains_key(&self.full_id(id))
    }

    pub fn get(&self, id: &str) -> Option<ActorRef> {
        self.actors.get(&self.full_id(id)).cloned()
    }

    /// Update the actor tracked under `id`, or create and register one
    ///
    /// Returns the actor and whether it was created. `update` runs only for
    /// an existing actor and `create` only for a missing one.
    pub fn update_or_create<C, U, E>(
        &mut self,
        id: &str,
        create: C,
        update: U,
    ) -> Result<(ActorRef, bool), E>
    where
        C: FnOnce() -> Result<ActorRef, E>,
        U: FnOnce(&ActorRef) -> Result<(), E>,
    {
        if let Some(actor) = self.get(id) {
            update(&actor)?;
            return Ok((actor, false));
        }

        let actor = create()?;
        self.register(id, actor.clone());
        Ok((actor, true))
    }

    /// Reuse the actor tracked under `id` untouched, or create one
    pub fn get_or_create<C, E>(&mut self, id: &str, create: C) -> Result<(ActorRef, bool), E>
    where
        C: FnOnce() -> Result<ActorRef, E>,
    {
        self.update_or_create(id, create, |_| Ok(()))
    }

    /// Ids of every tracked actor, prefix stripped, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .actors
            .keys()
            .filter_map(|label| label.strip_prefix(&self.prefix))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Forget every tracked actor; the scene is not touched
    pub fn clear(&mut self) {
        self.actors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ActorKind, MemoryScene, SceneError, Shape, Transform, Vec3};
    use std::sync::Arc;

    fn spawn_cube(scene: &MemoryScene) -> Result<ActorRef, SceneError> {
        scene.spawn(ActorKind::Shape { shape: Shape::Cube }, Transform::default())
    }

    #[test]
    fn test_scan_picks_up_prefixed_labels() {
        let scene = MemoryScene::new();
        spawn_cube(&scene).unwrap().set_label("workflow_a");
        spawn_cube(&scene).unwrap().set_label("other_b");
        spawn_cube(&scene).unwrap();

        let registry = ActorRegistry::new(&scene, "workflow_");
        assert_eq!(registry.len(), 1);
        assert!(registry.exists("a"));
        assert!(!registry.exists("b"));
        assert_eq!(registry.ids(), vec!["a"]);
    }

    #[test]
    fn test_register_writes_label() {
        let scene = MemoryScene::new();
        let actor = spawn_cube(&scene).unwrap();
        let mut registry = ActorRegistry::new(&scene, "wf_");

        registry.register("hero", actor.clone());

        assert_eq!(actor.label(), "wf_hero");
        assert!(Arc::ptr_eq(&registry.get("hero").unwrap(), &actor));
    }

    #[test]
    fn test_update_or_create_is_idempotent() {
        let scene = MemoryScene::new();
        let mut registry = ActorRegistry::new(&scene, "workflow_");
        let mut creates = 0;
        let mut updates = 0;

        let (first, created) = registry
            .update_or_create(
                "box",
                || {
                    creates += 1;
                    spawn_cube(&scene)
                },
                |_| {
                    updates += 1;
                    Ok(())
                },
            )
            .unwrap();
        assert!(created);

        let (second, created) = registry
            .update_or_create(
                "box",
                || {
                    creates += 1;
                    spawn_cube(&scene)
                },
                |actor| {
                    updates += 1;
                    actor.set_location(Vec3::new(1.0, 2.0, 3.0));
                    Ok(())
                },
            )
            .unwrap();
        assert!(!created);

        assert_eq!(creates, 1);
        assert_eq!(updates, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.transform().location, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.actor_count(), 1);
    }

    #[test]
    fn test_rescan_recovers_registration() {
        let scene = MemoryScene::new();
        let original = {
            let mut registry = ActorRegistry::new(&scene, "workflow_");
            let (actor, _) = registry
                .get_or_create("light", || spawn_cube(&scene))
                .unwrap();
            actor
        };

        let mut registry = ActorRegistry::new(&scene, "workflow_");
        let (actor, created) = registry
            .get_or_create("light", || spawn_cube(&scene))
            .unwrap();

        assert!(!created);
        assert!(Arc::ptr_eq(&actor, &original));
        assert_eq!(scene.actor_count(), 1);
    }

    #[test]
    fn test_deleted_actor_is_recreated() {
        let scene = MemoryScene::new();
        let mut registry = ActorRegistry::new(&scene, "workflow_");
        let (actor, _) = registry.get_or_create("x", || spawn_cube(&scene)).unwrap();
        assert!(scene.destroy(&actor));

        let mut registry = ActorRegistry::new(&scene, "workflow_");
        let (_, created) = registry.get_or_create("x", || spawn_cube(&scene)).unwrap();
        assert!(created);
    }

    #[test]
    fn test_create_error_propagates() {
        let scene = MemoryScene::new();
        let mut registry = ActorRegistry::new(&scene, "workflow_");

        let result: Result<_, SceneError> = registry.get_or_create("broken", || {
            Err(SceneError::AssetNotFound("/Game/Missing".to_string()))
        });

        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
