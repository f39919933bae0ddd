//! Scene collaborator interfaces
//!
//! The workflow engine never talks to an editor directly. Everything it needs
//! from the host is expressed through two traits:
//! - [`Scene`] - the live actor population plus level-wide operations
//!   (clear, save, spawn, asset lookup, model import)
//! - [`Actor`] - a handle to one live object with a gettable/settable label
//!
//! Handles are shared as [`ActorRef`] (`Arc<dyn Actor>`); two handles refer to
//! the same object iff `Arc::ptr_eq` holds.
//!
//! `memory` provides a complete in-process implementation used for dry runs
//! and tests.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::MemoryScene;

/// Shared handle to a live actor
pub type ActorRef = Arc<dyn Actor>;

/// Internal-name fragments of actors that survive a level clear
pub const ESSENTIAL_ACTORS: &[&str] = &["PlayerStart", "LightSource", "SkyAtmosphere", "Camera"];

/// Errors reported by a scene implementation
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Actor '{actor}' does not support {operation}")]
    Unsupported { actor: String, operation: String },

    #[error("Import failed for {path}: {message}")]
    ImportFailed { path: String, message: String },

    #[error("Scene operation failed: {0}")]
    Operation(String),
}

/// A 3D vector in scene units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Uniform vector, used for scalar scales
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Accepts either a uniform number or an `[x, y, z]` triple
#[derive(Deserialize)]
#[serde(untagged)]
enum ScaleInput {
    Uniform(f64),
    Axes([f64; 3]),
}

/// `deserialize_with` helper for scale fields that allow a bare number
pub fn deserialize_scale<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ScaleInput::deserialize(deserializer)? {
        ScaleInput::Uniform(v) => Vec3::splat(v),
        ScaleInput::Axes(axes) => Vec3::from(axes),
    })
}

/// Rotation in degrees (pitch, yaw, roll)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rotator {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl From<[f64; 3]> for Rotator {
    fn from([pitch, yaw, roll]: [f64; 3]) -> Self {
        Self { pitch, yaw, roll }
    }
}

impl From<Rotator> for [f64; 3] {
    fn from(r: Rotator) -> Self {
        [r.pitch, r.yaw, r.roll]
    }
}

/// Linear RGB colour, components in 0..=1
///
/// Deserializes from `[r, g, b]` or from a preset name such as `"red"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorInput", into = "[f64; 3]")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

const NAMED_COLORS: &[(&str, [f64; 3])] = &[
    ("red", [1.0, 0.0, 0.0]),
    ("green", [0.0, 1.0, 0.0]),
    ("blue", [0.0, 0.0, 1.0]),
    ("yellow", [1.0, 1.0, 0.0]),
    ("cyan", [0.0, 1.0, 1.0]),
    ("magenta", [1.0, 0.0, 1.0]),
    ("white", [1.0, 1.0, 1.0]),
    ("black", [0.0, 0.0, 0.0]),
    ("orange", [1.0, 0.5, 0.0]),
    ("purple", [0.5, 0.0, 1.0]),
    ("pink", [1.0, 0.4, 0.7]),
    ("lime", [0.5, 1.0, 0.0]),
];

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Look up a preset colour by (case-insensitive) name
    pub fn named(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, rgb)| Self::from(*rgb))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f64; 3]> for Color {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [f64; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorInput {
    Rgb([f64; 3]),
    Named(String),
}

impl TryFrom<ColorInput> for Color {
    type Error = String;

    fn try_from(input: ColorInput) -> Result<Self, Self::Error> {
        match input {
            ColorInput::Rgb(rgb) => Ok(Color::from(rgb)),
            ColorInput::Named(name) => {
                Color::named(&name).ok_or_else(|| format!("unknown color name '{}'", name))
            }
        }
    }
}

/// Location, rotation and scale of an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(location: Vec3) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Rotator) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Basic mesh shapes available to spawn tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Cube,
    Sphere,
    Cylinder,
}

impl Shape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cube" => Some(Shape::Cube),
            "sphere" => Some(Shape::Sphere),
            "cylinder" => Some(Shape::Cylinder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Cube => "cube",
            Shape::Sphere => "sphere",
            Shape::Cylinder => "cylinder",
        }
    }

    /// Engine asset backing this shape
    pub fn asset_path(&self) -> &'static str {
        match self {
            Shape::Cube => "/Engine/BasicShapes/Cube",
            Shape::Sphere => "/Engine/BasicShapes/Sphere",
            Shape::Cylinder => "/Engine/BasicShapes/Cylinder",
        }
    }
}

/// Light actor flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightType {
    Point,
    Spot,
    Directional,
}

impl LightType {
    pub const NAMES: &'static [&'static str] = &["point", "spot", "directional"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "point" => Some(LightType::Point),
            "spot" => Some(LightType::Spot),
            "directional" => Some(LightType::Directional),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LightType::Point => "point",
            LightType::Spot => "spot",
            LightType::Directional => "directional",
        }
    }
}

/// What kind of object a spawn request produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorKind {
    Shape { shape: Shape },
    Camera,
    Light { light_type: LightType },
    StaticMesh { asset: String },
    Other { class: String },
}

impl ActorKind {
    /// Engine class name, used as the prefix of internal actor names
    pub fn class_name(&self) -> &str {
        match self {
            ActorKind::Shape { .. } | ActorKind::StaticMesh { .. } => "StaticMeshActor",
            ActorKind::Camera => "CameraActor",
            ActorKind::Light { light_type } => match light_type {
                LightType::Point => "PointLight",
                LightType::Spot => "SpotLight",
                LightType::Directional => "DirectionalLight",
            },
            ActorKind::Other { class } => class,
        }
    }

    pub fn has_mesh(&self) -> bool {
        matches!(self, ActorKind::Shape { .. } | ActorKind::StaticMesh { .. })
    }
}

/// Light component settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSettings {
    pub intensity: f64,
    pub color: Color,
}

/// Options forwarded to the host's model importer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub import_materials: bool,
    pub import_textures: bool,
    pub combine_meshes: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            import_materials: true,
            import_textures: true,
            combine_meshes: false,
        }
    }
}

/// Point-in-time copy of an actor's observable state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSnapshot {
    pub name: String,
    pub label: String,
    pub kind: ActorKind,
    pub transform: Transform,
    pub color: Option<(Color, f64)>,
    pub materials: Vec<(u32, String)>,
    pub light: Option<LightSettings>,
    pub field_of_view: Option<f64>,
}

/// A live object in the host scene
pub trait Actor: Send + Sync + fmt::Debug {
    /// Internal object name assigned by the host (not the label)
    fn name(&self) -> String;

    fn kind(&self) -> ActorKind;

    /// Display label; the actor registry persists identities here
    fn label(&self) -> String;

    fn set_label(&self, label: &str);

    fn transform(&self) -> Transform;

    fn set_location(&self, location: Vec3);

    fn set_rotation(&self, rotation: Rotator);

    fn set_scale(&self, scale: Vec3);

    fn set_color(&self, color: Color, opacity: f64) -> Result<(), SceneError>;

    fn set_material(&self, material_path: &str, slot: u32) -> Result<(), SceneError>;

    fn configure_light(&self, intensity: f64, color: Color) -> Result<(), SceneError>;

    fn set_field_of_view(&self, fov: f64) -> Result<(), SceneError>;

    fn snapshot(&self) -> ActorSnapshot;
}

/// The host scene: actor population plus level-wide operations
pub trait Scene: Send + Sync {
    /// All actors currently alive
    fn actors(&self) -> Vec<ActorRef>;

    fn actor_count(&self) -> usize {
        self.actors().len()
    }

    /// Destroy every non-essential actor, returning how many were removed
    fn clear(&self) -> Result<usize, SceneError>;

    fn save(&self) -> Result<(), SceneError>;

    fn spawn(&self, kind: ActorKind, transform: Transform) -> Result<ActorRef, SceneError>;

    fn asset_exists(&self, path: &str) -> bool;

    fn create_material_instance(&self, path: &str, parent: &str) -> Result<(), SceneError>;

    /// Vector parameter names exposed by a material
    fn vector_parameters(&self, material_path: &str) -> Vec<String>;

    /// Import an external model file, returning the created mesh asset path
    fn import_model(
        &self,
        file: &Path,
        destination: &str,
        settings: &ImportSettings,
    ) -> Result<String, SceneError>;

    /// First actor carrying exactly this label
    fn find_by_label(&self, label: &str) -> Option<ActorRef> {
        self.actors().into_iter().find(|a| a.label() == label)
    }
}
