mod common;

use std::path::PathBuf;

use common::*;
use scene_workflows::prelude::*;
use scene_workflows::workflow::{get_preset_config, PRESET_NAMES};
use serde_json::json;

#[test]
fn test_presets() {
    let default = get_preset_config("default").unwrap();
    assert_eq!(default, WorkflowConfig::default());
    assert_eq!(default.actor_id_prefix, "workflow_");

    let clean = get_preset_config("clean_slate").unwrap();
    assert!(clean.clear_before_execute);
    assert!(!clean.upsert_mode && !clean.save_level_after);

    let incremental = get_preset_config("incremental").unwrap();
    assert!(incremental.upsert_mode);
    assert!(!incremental.clear_before_execute);

    let production = get_preset_config("production").unwrap();
    assert!(production.clear_before_execute && production.save_level_after);
    assert!(!production.upsert_mode);

    for name in PRESET_NAMES {
        assert!(get_preset_config(name).is_ok(), "preset {name} should exist");
    }
}

#[test]
fn test_unknown_preset_lists_available() {
    let err = get_preset_config("turbo").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown preset 'turbo'. Available: default, clean_slate, incremental, production"
    );
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = WorkflowConfig::from_json(&json!({"upsert_mode": true, "clear_before_execute": "yes"}));
    assert!(config.upsert_mode);
    assert!(!config.clear_before_execute);
    assert_eq!(config.actor_id_prefix, "workflow_");

    assert_eq!(WorkflowConfig::from_json(&json!(null)), WorkflowConfig::default());
}

#[test]
fn test_json_round_trip_keeps_metadata() {
    let config = WorkflowConfig::from_json(&json!({
        "actor_id_prefix": "city_",
        "save_level_after": true,
        "metadata": {"author": "layout team"}
    }));
    let json = config.to_json();

    assert_eq!(json["actor_id_prefix"], "city_");
    assert_eq!(json["metadata"]["author"], "layout team");
    assert_eq!(WorkflowConfig::from_json(&json), config);
}

#[test]
fn test_settings_file_loads() {
    let dir = create_test_dir();
    let path = dir.path().join("scene-workflows.yaml");
    std::fs::write(
        &path,
        "workflows_dir: levels/workflows\npreset: incremental\nlog_filter: scene_workflows=trace\n",
    )
    .unwrap();

    let settings = RunnerSettings::load(&path).unwrap();
    assert_eq!(settings.workflows_dir, PathBuf::from("levels/workflows"));
    assert_eq!(settings.log_filter.as_deref(), Some("scene_workflows=trace"));
    assert!(settings.preset_config().unwrap().unwrap().upsert_mode);
}

#[test]
fn test_settings_with_unknown_preset_fail() {
    let dir = create_test_dir();
    let path = dir.path().join("scene-workflows.yaml");
    std::fs::write(&path, "preset: turbo\n").unwrap();

    let err = RunnerSettings::load(&path).unwrap_err();
    assert!(err.to_string().contains("Unknown preset 'turbo'"));
}

#[test]
fn test_malformed_settings_fail() {
    let dir = create_test_dir();
    let path = dir.path().join("scene-workflows.yaml");
    std::fs::write(&path, "workflows_dir: [unclosed\n").unwrap();

    let err = RunnerSettings::load(&path).unwrap_err();
    assert!(matches!(err, LoadError::Yaml { .. }));
}
