//! Deployment entry points.
//!
//! [`deploy_job`] and [`deploy_pipeline`] mirror what a deploy notebook
//! does: validate the environment, read `deployment.yml`, resolve git state,
//! build the full configuration and create-or-update the resource by name.
//! Each invocation is self-contained; nothing is shared across calls except
//! the config loader handed in by the caller.

pub mod job;
pub mod nbpath;
pub mod pipeline;

use std::fs::File;
use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::api::{ApiError, PlatformApi};
use crate::context::{Env, WorkspaceContext};
use crate::core::{LakeopsError, Result};
use crate::gitinfo::{self, GitSourceInfo, clean_branch, commit_shortref};
use crate::mesh::cfg::ConfigLoader;

/// Result of a deploy call.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// Derived name of the deployed resource.
    pub name: String,
    /// Raw platform response from the create or update call.
    pub response: Value,
}

/// Read a `deployment.yml`-style config into a JSON mapping.
pub fn read_config_yaml(path: &Path) -> Result<Map<String, Value>> {
    let value: Value = serde_yaml::from_reader(File::open(path)?)?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| LakeopsError::invalid_argument("deployment config must be a mapping"))
}

/// Compose the deployment name from env and git state.
///
/// Production deployments are simply tagged `prod`; everything else gets the
/// composite `env_user_branch_shortref` identifier that distinguishes one
/// developer's deployment instance from another's.
pub fn depname(context: &WorkspaceContext, env: Env, git: &GitSourceInfo) -> String {
    if env.is_prod() {
        return "prod".to_string();
    }
    let username = context.short_username();
    let branch = clean_branch(git.branch());
    let short_ref = commit_shortref(git.commit());
    format!("{env}_{username}_{branch}_{short_ref}")
}

/// Parameters carrying the environment and git info into the deployed
/// resource, so downstream notebooks see the same context.
pub(crate) fn context_parameters(env: Env, git: &GitSourceInfo) -> Vec<Value> {
    vec![
        json!({ "name": "pipeline_env", "default": env.as_str() }),
        json!({ "name": "git_url", "default": git.url() }),
        json!({ "name": "git_branch", "default": git.branch() }),
        json!({ "name": "git_commit", "default": git.commit() }),
    ]
}

/// Deploy the job defined in a `deployment.yml`.
///
/// Job naming and the rest of the configuration are derived from the
/// environment; pass `env` explicitly to override detection.
pub fn deploy_job(
    context: &WorkspaceContext,
    api: &dyn PlatformApi,
    loader: &ConfigLoader,
    config_path: &Path,
    env: Option<Env>,
) -> Result<DeployOutcome> {
    let env = resolve_env(context, env)?;
    let overrides = read_config_yaml(config_path)?;
    let git = gitinfo::git_source(context, api);
    let config = job::build_job_config(&overrides, env, context, &git, loader, api)?;
    let payload = config.to_payload()?;
    debug!("job config:\n{}", serde_json::to_string_pretty(&payload)?);

    let response = create_or_update_job(api, &config.name, &payload)?;
    info!(name = %config.name, "job deploy finished");
    Ok(DeployOutcome { name: config.name, response })
}

/// Deploy the pipeline defined in a `deployment.yml`.
pub fn deploy_pipeline(
    context: &WorkspaceContext,
    api: &dyn PlatformApi,
    loader: &ConfigLoader,
    config_path: &Path,
    env: Option<Env>,
) -> Result<DeployOutcome> {
    let env = resolve_env(context, env)?;
    let overrides = read_config_yaml(config_path)?;
    let git = gitinfo::git_source(context, api);
    let config = pipeline::build_pipeline_config(&overrides, env, context, &git, loader)?;
    let payload = config.to_payload()?;
    debug!("pipeline config:\n{}", serde_json::to_string_pretty(&payload)?);

    let response = create_or_update_pipeline(api, &config.name, &payload)?;
    info!(name = %config.name, "pipeline deploy finished");
    Ok(DeployOutcome { name: config.name, response })
}

/// Create the job, or update it when one with the same name exists.
pub fn create_or_update_job(
    api: &dyn PlatformApi,
    name: &str,
    payload: &Value,
) -> Result<Value> {
    match api.job_by_name(name)? {
        Some(existing) => {
            let job_id = existing
                .get("job_id")
                .and_then(Value::as_i64)
                .ok_or_else(|| ApiError {
                    method: "GET",
                    message: format!("job entry for '{name}' is missing job_id"),
                })?;
            Ok(api.update_job(job_id, payload)?)
        }
        None => Ok(api.create_job(payload)?),
    }
}

/// Create the pipeline, or update it when one with the same name exists.
pub fn create_or_update_pipeline(
    api: &dyn PlatformApi,
    name: &str,
    payload: &Value,
) -> Result<Value> {
    match api.pipeline_by_name(name)? {
        Some(existing) => {
            let pipeline_id = existing
                .get("pipeline_id")
                .and_then(Value::as_str)
                .ok_or_else(|| ApiError {
                    method: "GET",
                    message: format!("pipeline entry for '{name}' is missing pipeline_id"),
                })?
                .to_string();
            Ok(api.update_pipeline(&pipeline_id, payload)?)
        }
        None => Ok(api.create_pipeline(payload)?),
    }
}

fn resolve_env(context: &WorkspaceContext, env: Option<Env>) -> Result<Env> {
    match env {
        Some(env) => Ok(env),
        None => Env::detect(context),
    }
}
