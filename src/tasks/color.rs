//! Colour tasks

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::engine::error::TaskError;
use crate::engine::result::TaskResult;
use crate::engine::task::{parse_params, Params, Task};
use crate::scene::{ActorRef, Color};
use crate::workflow::config::DEFAULT_ACTOR_ID_PREFIX;
use crate::workflow::context::ExecutionContext;

fn apply_color(actor: &ActorRef, color: Color, opacity: f64) -> bool {
    match actor.set_color(color, opacity) {
        Ok(()) => true,
        Err(e) => {
            warn!(actor = %actor.label(), error = %e, "Could not set color");
            false
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SetActorColorParams {
    actor_labels: Vec<String>,
    color: Color,
    #[serde(default = "default_opacity")]
    opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

/// Colour every actor whose label is listed
pub struct SetActorColorTask {
    name: String,
    raw: Params,
    params: SetActorColorParams,
}

impl SetActorColorTask {
    pub const TYPE: &'static str = "SetActorColorTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for SetActorColorTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let wanted: HashSet<&str> = p.actor_labels.iter().map(String::as_str).collect();

        let modified = ctx
            .scene()
            .actors()
            .iter()
            .filter(|actor| wanted.contains(actor.label().as_str()))
            .filter(|actor| apply_color(actor, p.color, p.opacity))
            .count();

        debug!(modified, requested = p.actor_labels.len(), "Applied actor colors");

        Ok(TaskResult::success(json!({
            "modified_count": modified,
            "color": p.color,
            "actor_labels": p.actor_labels,
        })))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColorEntry {
    #[serde(default)]
    color: Color,
    #[serde(default = "default_opacity")]
    opacity: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ColorGridParams {
    prefix: String,
    color_map: BTreeMap<String, ColorEntry>,
}

impl Default for ColorGridParams {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_ACTOR_ID_PREFIX.to_string(),
            color_map: BTreeMap::new(),
        }
    }
}

/// Colour actors by id, where an id maps to the label `prefix + id`
pub struct ColorGridTask {
    name: String,
    raw: Params,
    params: ColorGridParams,
}

impl ColorGridTask {
    pub const TYPE: &'static str = "ColorGridTask";

    pub fn new(name: impl Into<String>, raw: Params) -> Result<Self, TaskError> {
        Ok(Self {
            params: parse_params(&raw)?,
            name: name.into(),
            raw,
        })
    }
}

#[async_trait]
impl Task for ColorGridTask {
    task_identity!(Self::TYPE);

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<TaskResult, TaskError> {
        let p = &self.params;
        let mut modified = 0usize;

        for actor in ctx.scene().actors() {
            let label = actor.label();
            let Some(id) = label.strip_prefix(&p.prefix) else {
                continue;
            };
            if let Some(entry) = p.color_map.get(id) {
                if apply_color(&actor, entry.color, entry.opacity) {
                    modified += 1;
                }
            }
        }

        Ok(TaskResult::success(json!({
            "modified_count": modified,
            "color_map_size": p.color_map.len(),
        })))
    }
}
