//! In-process scene
//!
//! Holds actors and assets in memory so workflows can be dry-run and tested
//! without an editor attached. Clear and save can be told to fail.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{
    Actor, ActorKind, ActorRef, ActorSnapshot, Color, ImportSettings, LightSettings, Rotator,
    Scene, SceneError, Shape, Transform, Vec3, ESSENTIAL_ACTORS,
};

const BASIC_SHAPE_MATERIAL: &str = "/Engine/BasicShapes/BasicShapeMaterial";

#[derive(Debug)]
struct ActorState {
    label: String,
    transform: Transform,
    color: Option<(Color, f64)>,
    materials: BTreeMap<u32, String>,
    light: Option<LightSettings>,
    field_of_view: Option<f64>,
}

/// Actor living in a [`MemoryScene`]
#[derive(Debug)]
pub struct MemoryActor {
    name: String,
    kind: ActorKind,
    state: RwLock<ActorState>,
}

impl MemoryActor {
    fn new(name: String, kind: ActorKind, transform: Transform) -> Self {
        let light = match kind {
            ActorKind::Light { .. } => Some(LightSettings {
                intensity: 5000.0,
                color: Color::WHITE,
            }),
            _ => None,
        };
        let field_of_view = matches!(kind, ActorKind::Camera).then_some(90.0);

        Self {
            state: RwLock::new(ActorState {
                label: name.clone(),
                transform,
                color: None,
                materials: BTreeMap::new(),
                light,
                field_of_view,
            }),
            name,
            kind,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ActorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ActorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn unsupported(&self, operation: &str) -> SceneError {
        SceneError::Unsupported {
            actor: self.name.clone(),
            operation: operation.to_string(),
        }
    }
}

impl Actor for MemoryActor {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> ActorKind {
        self.kind.clone()
    }

    fn label(&self) -> String {
        self.read().label.clone()
    }

    fn set_label(&self, label: &str) {
        self.write().label = label.to_string();
    }

    fn transform(&self) -> Transform {
        self.read().transform
    }

    fn set_location(&self, location: Vec3) {
        self.write().transform.location = location;
    }

    fn set_rotation(&self, rotation: Rotator) {
        self.write().transform.rotation = rotation;
    }

    fn set_scale(&self, scale: Vec3) {
        self.write().transform.scale = scale;
    }

    fn set_color(&self, color: Color, opacity: f64) -> Result<(), SceneError> {
        if !self.kind.has_mesh() {
            return Err(self.unsupported("set_color"));
        }
        self.write().color = Some((color, opacity));
        Ok(())
    }

    fn set_material(&self, material_path: &str, slot: u32) -> Result<(), SceneError> {
        if !self.kind.has_mesh() {
            return Err(self.unsupported("set_material"));
        }
        self.write().materials.insert(slot, material_path.to_string());
        Ok(())
    }

    fn configure_light(&self, intensity: f64, color: Color) -> Result<(), SceneError> {
        if !matches!(self.kind, ActorKind::Light { .. }) {
            return Err(self.unsupported("configure_light"));
        }
        self.write().light = Some(LightSettings { intensity, color });
        Ok(())
    }

    fn set_field_of_view(&self, fov: f64) -> Result<(), SceneError> {
        if !matches!(self.kind, ActorKind::Camera) {
            return Err(self.unsupported("set_field_of_view"));
        }
        self.write().field_of_view = Some(fov);
        Ok(())
    }

    fn snapshot(&self) -> ActorSnapshot {
        let state = self.read();
        ActorSnapshot {
            name: self.name.clone(),
            label: state.label.clone(),
            kind: self.kind.clone(),
            transform: state.transform,
            color: state.color,
            materials: state
                .materials
                .iter()
                .map(|(slot, path)| (*slot, path.clone()))
                .collect(),
            light: state.light,
            field_of_view: state.field_of_view,
        }
    }
}

#[derive(Default)]
struct SceneState {
    actors: Vec<Arc<MemoryActor>>,
    assets: BTreeSet<String>,
    vector_params: HashMap<String, Vec<String>>,
    class_counters: HashMap<String, u64>,
    save_count: usize,
    fail_clear: Option<String>,
    fail_save: Option<String>,
}

/// Scene kept entirely in memory
pub struct MemoryScene {
    state: RwLock<SceneState>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    /// Empty level with the engine's basic shapes and material available
    pub fn new() -> Self {
        let mut state = SceneState::default();
        for shape in [Shape::Cube, Shape::Sphere, Shape::Cylinder] {
            state.assets.insert(shape.asset_path().to_string());
        }
        state.assets.insert(BASIC_SHAPE_MATERIAL.to_string());
        state
            .vector_params
            .insert(BASIC_SHAPE_MATERIAL.to_string(), vec!["Color".to_string()]);

        Self {
            state: RwLock::new(state),
        }
    }

    /// Level that also contains a player start and sky atmosphere, which
    /// survive clearing
    pub fn with_essentials() -> Self {
        let scene = Self::new();
        for class in ["PlayerStart", "SkyAtmosphere"] {
            scene.insert_actor(
                ActorKind::Other {
                    class: class.to_string(),
                },
                Transform::default(),
            );
        }
        scene
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> RwLockReadGuard<'_, SceneState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SceneState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_actor(&self, kind: ActorKind, transform: Transform) -> Arc<MemoryActor> {
        let mut state = self.write();
        let class = kind.class_name().to_string();
        let counter = state.class_counters.entry(class.clone()).or_insert(0);
        let name = format!("{}_{}", class, *counter);
        *counter += 1;

        let actor = Arc::new(MemoryActor::new(name, kind, transform));
        state.actors.push(actor.clone());
        actor
    }

    /// Make an asset path resolvable
    pub fn add_asset(&self, path: impl Into<String>) {
        self.write().assets.insert(path.into());
    }

    /// Register a material asset exposing the given vector parameters
    pub fn add_material(&self, path: impl Into<String>, vector_params: &[&str]) {
        let path = path.into();
        let mut state = self.write();
        state.assets.insert(path.clone());
        state.vector_params.insert(
            path,
            vector_params.iter().map(|p| p.to_string()).collect(),
        );
    }

    /// Make every subsequent `clear` fail with this message
    pub fn fail_clear_with(&self, message: impl Into<String>) {
        self.write().fail_clear = Some(message.into());
    }

    /// Make every subsequent `save` fail with this message
    pub fn fail_save_with(&self, message: impl Into<String>) {
        self.write().fail_save = Some(message.into());
    }

    pub fn save_count(&self) -> usize {
        self.read().save_count
    }

    /// Remove an actor as if someone deleted it by hand in the editor
    pub fn destroy(&self, actor: &ActorRef) -> bool {
        let name = actor.name();
        let mut state = self.write();
        let before = state.actors.len();
        state.actors.retain(|a| a.name != name);
        state.actors.len() != before
    }

    /// Snapshots of every actor, in spawn order
    pub fn snapshot(&self) -> Vec<ActorSnapshot> {
        self.read().actors.iter().map(|a| a.snapshot()).collect()
    }
}

impl Scene for MemoryScene {
    fn actors(&self) -> Vec<ActorRef> {
        self.read()
            .actors
            .iter()
            .map(|a| a.clone() as ActorRef)
            .collect()
    }

    fn actor_count(&self) -> usize {
        self.read().actors.len()
    }

    fn clear(&self) -> Result<usize, SceneError> {
        let mut state = self.write();
        if let Some(message) = &state.fail_clear {
            return Err(SceneError::Operation(message.clone()));
        }

        let before = state.actors.len();
        state
            .actors
            .retain(|a| ESSENTIAL_ACTORS.iter().any(|e| a.name.contains(e)));
        let deleted = before - state.actors.len();
        debug!(deleted, remaining = state.actors.len(), "Cleared memory scene");
        Ok(deleted)
    }

    fn save(&self) -> Result<(), SceneError> {
        let mut state = self.write();
        if let Some(message) = &state.fail_save {
            return Err(SceneError::Operation(message.clone()));
        }
        state.save_count += 1;
        Ok(())
    }

    fn spawn(&self, kind: ActorKind, transform: Transform) -> Result<ActorRef, SceneError> {
        if let ActorKind::StaticMesh { asset } = &kind {
            if !self.asset_exists(asset) {
                return Err(SceneError::AssetNotFound(asset.clone()));
            }
        }
        let actor = self.insert_actor(kind, transform);
        Ok(actor as ActorRef)
    }

    fn asset_exists(&self, path: &str) -> bool {
        self.read().assets.contains(path)
    }

    fn create_material_instance(&self, path: &str, parent: &str) -> Result<(), SceneError> {
        let mut state = self.write();
        if !state.assets.contains(parent) {
            return Err(SceneError::AssetNotFound(parent.to_string()));
        }
        let inherited = state.vector_params.get(parent).cloned().unwrap_or_default();
        state.assets.insert(path.to_string());
        state.vector_params.insert(path.to_string(), inherited);
        Ok(())
    }

    fn vector_parameters(&self, material_path: &str) -> Vec<String> {
        self.read()
            .vector_params
            .get(material_path)
            .cloned()
            .unwrap_or_default()
    }

    fn import_model(
        &self,
        file: &Path,
        destination: &str,
        settings: &ImportSettings,
    ) -> Result<String, SceneError> {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| SceneError::ImportFailed {
                path: file.display().to_string(),
                message: "file has no name".to_string(),
            })?;

        let mesh_path = format!("{}/{}", destination.trim_end_matches('/'), stem);
        debug!(
            file = %file.display(),
            mesh = %mesh_path,
            import_materials = settings.import_materials,
            "Imported model into memory scene"
        );
        self.add_asset(mesh_path.clone());
        Ok(mesh_path)
    }
}
