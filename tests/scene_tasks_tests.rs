use std::sync::Arc;

use scene_workflows::prelude::*;
use scene_workflows::scene::{Color, LightType};
use scene_workflows::ActorKind;
use serde_json::{json, Value};

const MATERIAL: &str = "/Game/Workflow/MI_RuntimeColorBase";

async fn run(definition: Value, scene: &Arc<MemoryScene>) -> WorkflowExecutor {
    let workflow = WorkflowLoader::new("unused").build(&definition).unwrap();
    let mut executor = workflow.into_executor().with_scene(scene.clone());
    executor.execute(None).await.unwrap();
    executor
}

#[tokio::test]
async fn test_generate_spawn_and_paint_grid() {
    let scene = MemoryScene::shared();
    let executor = run(
        json!({
            "name": "generated grid",
            "config": {"upsert_mode": true},
            "tasks": [
                {"name": "material", "type": "MaterialUpsertTask"},
                {"name": "points", "type": "GridGeneratorTask",
                 "params": {"rows": 2, "cols": 2, "spacing": 100, "shape": "cube"}},
                {"name": "spawn", "type": "ForEachSpawnTask", "depends_on": ["points"]},
                {"name": "paint", "type": "ForEachMaterialTask",
                 "params": {"material_map": {"0_0": MATERIAL, "1_1": MATERIAL}},
                 "depends_on": ["material", "spawn"]},
                {"name": "tint", "type": "ColorGridTask",
                 "params": {"color_map": {"0_1": {"color": "red", "opacity": 0.5}}},
                 "depends_on": ["spawn"]}
            ]
        }),
        &scene,
    )
    .await;

    let summary = executor.summary();
    assert!(summary.all_succeeded(), "{}", summary);
    assert_eq!(scene.actor_count(), 4);

    let spawn = executor.get_task_output("spawn").unwrap();
    assert_eq!(spawn["created"], 4);
    assert_eq!(
        spawn["actors"],
        json!(["workflow_0_0", "workflow_0_1", "workflow_1_0", "workflow_1_1"])
    );

    let paint = executor.get_task_output("paint").unwrap();
    assert_eq!(paint["modified_count"], 2);
    let painted = scene.find_by_label("workflow_1_1").unwrap().snapshot();
    assert_eq!(painted.materials, vec![(0, MATERIAL.to_string())]);

    let tinted = scene.find_by_label("workflow_0_1").unwrap().snapshot();
    assert_eq!(tinted.color, Some((Color::new(1.0, 0.0, 0.0), 0.5)));
    assert_eq!(executor.get_task_output("tint").unwrap()["modified_count"], 1);
}

#[tokio::test]
async fn test_partial_material_failures_still_succeed() {
    let scene = MemoryScene::shared();
    let executor = run(
        json!({
            "config": {"upsert_mode": true},
            "tasks": [
                {"name": "points", "type": "GridGeneratorTask", "params": {"rows": 1, "cols": 2}},
                {"name": "spawn", "type": "ForEachSpawnTask", "depends_on": ["points"]},
                {"name": "paint", "type": "ForEachMaterialTask",
                 "params": {"material_map": {
                     "0_0": "/Engine/BasicShapes/BasicShapeMaterial",
                     "9_9": "/Engine/BasicShapes/BasicShapeMaterial"
                 }},
                 "depends_on": ["spawn"]}
            ]
        }),
        &scene,
    )
    .await;

    let result = executor.results()["paint"].clone();
    assert!(result.is_success());
    assert_eq!(result.metadata["partial_success"], true);
    assert_eq!(result.metadata["failed_items"], 1);
    assert_eq!(
        result.output.unwrap()["errors"],
        json!(["Actor '9_9' not found in registry"])
    );
}

#[tokio::test]
async fn test_generated_lights_are_created() {
    let scene = MemoryScene::shared();
    let executor = run(
        json!({
            "config": {"upsert_mode": true},
            "tasks": [
                {"name": "gen", "type": "LightsGeneratorTask", "params": {
                    "default_intensity": 3000,
                    "lights": [
                        {"light_type": "directional", "location": [0, 0, 1000],
                         "rotation": [-50, 30, 0], "actor_id": "sun"},
                        {"light_type": "point", "location": [200, 0, 150], "color": "orange"},
                        {"light_type": "spot", "location": [-200, 0, 300], "intensity": 9000}
                    ]
                }},
                {"name": "place", "type": "ForEachLightTask",
                 "params": {"lights_input": "gen.lights"},
                 "depends_on": ["gen"]}
            ]
        }),
        &scene,
    )
    .await;

    assert!(executor.summary().all_succeeded());
    let place = executor.get_task_output("place").unwrap();
    assert_eq!(place["successful"], 3);
    assert_eq!(place["failed"], 0);

    let sun = scene.find_by_label("workflow_sun").unwrap().snapshot();
    assert_eq!(sun.kind, ActorKind::Light { light_type: LightType::Directional });
    assert_eq!(sun.light.unwrap().intensity, 3000.0);

    let spot = scene.find_by_label("workflow_light_2").unwrap().snapshot();
    assert_eq!(spot.light.unwrap().intensity, 9000.0);
    assert_eq!(scene.actor_count(), 3);
}

#[tokio::test]
async fn test_bad_light_definition_skips_dependents() {
    let scene = MemoryScene::shared();
    let executor = run(
        json!({
            "tasks": [
                {"name": "gen", "type": "LightsGeneratorTask",
                 "params": {"lights": [{"light_type": "area", "location": [0, 0, 0]}]}},
                {"name": "place", "type": "ForEachLightTask",
                 "params": {"lights_input": "gen.lights"}, "depends_on": ["gen"]}
            ]
        }),
        &scene,
    )
    .await;

    let results = executor.results();
    assert_eq!(results["gen"].status, TaskStatus::Failed);
    assert_eq!(
        results["gen"].error.as_deref(),
        Some("Light 0 has invalid light_type: area. Must be one of: point, spot, directional")
    );
    assert_eq!(results["place"].status, TaskStatus::Skipped);
    assert_eq!(scene.actor_count(), 0);
}

#[tokio::test]
async fn test_patterns_and_primitives_together() {
    let scene = MemoryScene::shared();
    let executor = run(
        json!({
            "tasks": [
                {"name": "ring", "type": "SpawnCircleTask", "params": {"count": 6, "radius": 300}},
                {"name": "spiral", "type": "SpawnSpiralTask", "params": {"count": 5}},
                {"name": "hero", "type": "SpawnActorTask",
                 "params": {"shape": "cylinder", "location": [0, 0, 50], "scale": 3}},
                {"name": "camera", "type": "CreateCameraTask",
                 "params": {"location": [-800, 0, 400], "rotation": [-20, 0, 0], "fov": 75}},
                {"name": "highlight", "type": "SetActorColorTask",
                 "params": {"actor_labels": ["StaticMeshActor_11"], "color": [0, 1, 0]},
                 "depends_on": ["hero"]}
            ]
        }),
        &scene,
    )
    .await;

    assert!(executor.summary().all_succeeded());
    assert_eq!(executor.get_task_output("ring").unwrap()["count"], 6);
    assert_eq!(executor.get_task_output("spiral").unwrap()["count"], 5);
    assert_eq!(executor.get_task_output("hero").unwrap()["actor"], "StaticMeshActor_11");
    assert_eq!(executor.get_task_output("highlight").unwrap()["modified_count"], 1);

    let camera = scene.find_by_label("CameraActor_0").unwrap().snapshot();
    assert_eq!(camera.field_of_view, Some(75.0));
    assert_eq!(scene.actor_count(), 13);
}

#[tokio::test]
async fn test_spawn_from_empty_data_fails() {
    let scene = MemoryScene::shared();
    let executor = run(
        json!({"tasks": [{"name": "spawn", "type": "ForEachSpawnTask"}]}),
        &scene,
    )
    .await;

    let result = &executor.results()["spawn"];
    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(
        result.error.as_deref(),
        Some("No data found in context[\"grid_points\"]")
    );
}
