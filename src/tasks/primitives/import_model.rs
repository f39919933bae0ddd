use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{failure, place_actor};
use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{deserialize_scale, ActorKind, ImportSettings, Rotator, Transform, Vec3};
use crate::tasks::actor_value;
use crate::workflow::context::ExecutionContext;

/// Content folder that imported model files are placed under
pub const IMPORT_ROOT: &str = "/Game/Imported";

const MODEL_EXTENSIONS: &[&str] = &["fbx", "obj"];

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ImportModelParams {
    source: Option<String>,
    location: Vec3,
    rotation: Rotator,
    #[serde(deserialize_with = "deserialize_scale")]
    scale: Vec3,
    actor_id: Option<String>,
    use_registry: bool,
    import_settings: ImportSettings,
}

impl Default for ImportModelParams {
    fn default() -> Self {
        Self {
            source: None,
            location: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
            actor_id: None,
            use_registry: true,
            import_settings: ImportSettings::default(),
        }
    }
}

/// Whether `source` names a model file on disk rather than a content asset
fn is_model_file(source: &str) -> bool {
    Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MODEL_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

/// Import a model file, or use an existing mesh asset, and place it as a
/// static-mesh actor
pub struct ImportModelTask {
    name: String,
    raw: Params,
    params: ImportModelParams,
}

impl ImportModelTask {
    pub const TYPE: &'static str = "ImportModelTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }

    fn resolve_mesh(&self, ctx: &ExecutionContext, source: &str) -> Result<String, TaskResult> {
        let scene = ctx.scene();

        if !is_model_file(source) {
            return if scene.asset_exists(source) {
                Ok(source.to_string())
            } else {
                Err(failure(format!("Failed to load asset: {}", source)))
            };
        }

        let file = Path::new(source);
        let import_failed = || failure(format!("Failed to import file: {}", source));
        if !file.is_file() {
            warn!(file = %source, "Model file does not exist");
            return Err(import_failed());
        }
        let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
            return Err(import_failed());
        };

        let destination = format!("{}/{}", IMPORT_ROOT, stem);
        match scene.import_model(file, &destination, &self.params.import_settings) {
            Ok(mesh) => {
                info!(file = %source, mesh = %mesh, "Imported model");
                Ok(mesh)
            }
            Err(e) => {
                warn!(file = %source, error = %e, "Model import failed");
                Err(import_failed())
            }
        }
    }
}

#[async_trait]
impl Task for ImportModelTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let Some(source) = p.source.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(failure("No source specified (file path or asset path)"));
        };

        let mesh = match self.resolve_mesh(ctx, source) {
            Ok(mesh) => mesh,
            Err(result) => return Ok(result),
        };

        let transform = Transform::at(p.location)
            .with_rotation(p.rotation)
            .with_scale(p.scale);

        let (actor, action) = place_actor(
            ctx,
            p.actor_id.as_deref(),
            p.use_registry,
            || {
                ctx.scene().spawn(
                    ActorKind::StaticMesh {
                        asset: mesh.clone(),
                    },
                    transform,
                )
            },
            |actor| {
                actor.set_location(p.location);
                actor.set_rotation(p.rotation);
                actor.set_scale(p.scale);
                Ok(())
            },
        )?;

        Ok(TaskResult::success(json!({
            "actor": actor_value(&actor),
            "action": action,
            "location": p.location,
            "source": source,
            "mesh": mesh,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::TaskStatus;
    use crate::engine::task::{run_task, to_params};
    use crate::scene::{MemoryScene, Scene};

    #[test]
    fn test_model_file_detection() {
        assert!(is_model_file("/models/chair.fbx"));
        assert!(is_model_file("C:/Models/CHAIR.FBX"));
        assert!(is_model_file("table.obj"));
        assert!(!is_model_file("/Game/Models/Chair"));
        assert!(!is_model_file("scene.gltf"));
    }

    #[tokio::test]
    async fn test_missing_source() {
        let mut ctx = ExecutionContext::new();
        let task = ImportModelTask::new("import", Params::new()).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(
            result.error.as_deref(),
            Some("No source specified (file path or asset path)")
        );
    }

    #[tokio::test]
    async fn test_existing_asset_is_spawned() {
        let scene = MemoryScene::shared();
        scene.add_asset("/Game/Models/Chair");
        let mut ctx = ExecutionContext::with_scene(scene.clone());

        let task = ImportModelTask::new(
            "chair",
            to_params(json!({"source": "/Game/Models/Chair", "scale": 2.5})),
        )
        .unwrap();
        let output = run_task(&task, &mut ctx).await.output.unwrap();

        assert_eq!(output["mesh"], "/Game/Models/Chair");
        let snapshots = scene.snapshot();
        assert_eq!(
            snapshots[0].kind,
            ActorKind::StaticMesh {
                asset: "/Game/Models/Chair".to_string()
            }
        );
        assert_eq!(snapshots[0].transform.scale, Vec3::splat(2.5));
    }

    #[tokio::test]
    async fn test_unknown_asset_fails() {
        let mut ctx = ExecutionContext::new();
        let task =
            ImportModelTask::new("chair", to_params(json!({"source": "/Game/Nope"}))).unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert_eq!(result.error.as_deref(), Some("Failed to load asset: /Game/Nope"));
    }

    #[tokio::test]
    async fn test_imports_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Chair.FBX");
        std::fs::write(&file, b"fbx").unwrap();

        let scene = MemoryScene::shared();
        let mut ctx = ExecutionContext::with_scene(scene.clone());
        let task = ImportModelTask::new(
            "chair",
            to_params(json!({
                "source": file.to_str().unwrap(),
                "scale": [1, 2, 3],
                "import_settings": {"import_textures": false}
            })),
        )
        .unwrap();
        let output = run_task(&task, &mut ctx).await.output.unwrap();

        assert_eq!(output["mesh"], "/Game/Imported/Chair/Chair");
        assert!(scene.asset_exists("/Game/Imported/Chair/Chair"));
        assert_eq!(scene.snapshot()[0].transform.scale, Vec3::new(1.0, 2.0, 3.0));
    }

    #[tokio::test]
    async fn test_missing_model_file() {
        let mut ctx = ExecutionContext::new();
        let task = ImportModelTask::new(
            "chair",
            to_params(json!({"source": "/definitely/missing/chair.obj"})),
        )
        .unwrap();
        let result = run_task(&task, &mut ctx).await;

        assert_eq!(
            result.error.as_deref(),
            Some("Failed to import file: /definitely/missing/chair.obj")
        );
    }
}
