//! Pipeline configuration building.
//!
//! Structurally parallel to [`crate::deploy::job`]: defaults, user overlay,
//! derived name, deployment/git tags, then enrichment (catalog, schema
//! rewrite, development flag, notebook libraries). Pipelines do not carry a
//! run-as identity on the wire.

pub mod config;
pub mod tasks;

pub use config::PipelineConfig;

use serde_json::{Map, Value, json};

use crate::context::{Env, WorkspaceContext};
use crate::core::Result;
use crate::deploy::{context_parameters, depname};
use crate::gitinfo::GitSourceInfo;
use crate::mesh::cfg::ConfigLoader;
use crate::mesh::naming::Namer;

/// Combine user parameters with default parameters and derived state into a
/// deployable pipeline configuration.
pub fn build_pipeline_config(
    overrides: &Map<String, Value>,
    env: Env,
    context: &WorkspaceContext,
    git: &GitSourceInfo,
    loader: &ConfigLoader,
) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::default();
    config.apply_overrides(overrides)?;
    config.git_source = git.clone();

    let namer = Namer::new(context, loader, git.clone());
    config.name = namer.pipelinename(Some(env))?;

    let deployment = depname(context, env, git);
    config.tags = tags(&deployment, git, env);
    config.parameters.extend(context_parameters(env, git));

    tasks::enrich_tasks(&mut config, context, &namer, env)?;
    Ok(config)
}

fn tags(deployment: &str, git: &GitSourceInfo, env: Env) -> Map<String, Value> {
    let value = json!({
        "deployment": deployment,
        "git_url": git.url(),
        "git_branch": git.branch(),
        "git_commit": git.commit(),
        "pipeline_env": env.as_str(),
    });
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}
