//! Job configuration building.
//!
//! `build_job_config` walks the states DEFAULT → OVERLAID → NAMED → TAGGED →
//! ENRICHED: built-in defaults, user overrides, derived name, deployment and
//! git tags, then task/cluster enrichment and run-as resolution. Validation
//! and configuration errors abort before any create/update network call.

pub mod clusters;
pub mod config;
pub mod tasks;

pub use config::{JobConfig, JobTask, NotebookTask};

use serde_json::{Map, Value, json};

use crate::api::PlatformApi;
use crate::context::{Env, WorkspaceContext};
use crate::core::Result;
use crate::deploy::{context_parameters, depname};
use crate::gitinfo::GitSourceInfo;
use crate::mesh::cfg::ConfigLoader;
use crate::mesh::naming::Namer;

/// Combine user parameters with default parameters and derived state into a
/// deployable job configuration.
pub fn build_job_config(
    overrides: &Map<String, Value>,
    env: Env,
    context: &WorkspaceContext,
    git: &GitSourceInfo,
    loader: &ConfigLoader,
    api: &dyn PlatformApi,
) -> Result<JobConfig> {
    let mut config = JobConfig::default();
    config.apply_overrides(overrides)?;
    config.git_source = git.clone();

    let namer = Namer::new(context, loader, git.clone());
    config.name = namer.jobname(Some(env))?;
    if !env.is_prod() {
        // Suppress noisy notifications from dev/test deployments.
        config.email_notifications = Map::new();
    }

    let deployment = depname(context, env, git);
    config.tags = tags(&deployment, git);
    config.parameters.extend(context_parameters(env, git));

    tasks::enrich_tasks(&mut config, context, api)?;

    config.run_as = if context.is_service_principal {
        object(json!({ "service_principal_name": context.username }))
    } else {
        object(json!({ "user_name": context.username }))
    };

    Ok(config)
}

fn tags(deployment: &str, git: &GitSourceInfo) -> Map<String, Value> {
    object(json!({
        "deployment": deployment,
        "git_url": git.url(),
        "git_branch": git.branch(),
        "git_commit": git.commit(),
    }))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}
