//! Cleanup of per-user development resources.
//!
//! Non-production deployments carry the short username in their `deployment`
//! tag and schema names, which is what makes them safe to find and delete in
//! bulk once a branch is merged.

use serde_json::Value;
use tracing::info;

use crate::api::ApiClient;
use crate::context::WorkspaceContext;
use crate::core::Result;

/// A job selected for cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    /// Job name.
    pub name: String,
    /// Job id.
    pub id: i64,
}

/// Jobs whose `deployment` tag contains the current user's short username.
pub fn deployed_jobs_for_user(api: &ApiClient, context: &WorkspaceContext) -> Result<Vec<JobRef>> {
    let username = context.short_username();
    let jobs = api.get_jobs()?;
    Ok(jobs
        .iter()
        .filter_map(|job| {
            let settings = job.get("settings")?;
            let deployment = settings.get("tags")?.get("deployment")?.as_str()?;
            if !deployment.contains(&username) {
                return None;
            }
            Some(JobRef {
                name: settings.get("name")?.as_str()?.to_string(),
                id: job.get("job_id")?.as_i64()?,
            })
        })
        .collect())
}

/// Delete the given jobs.
pub fn delete_jobs(api: &ApiClient, jobs: &[JobRef]) -> Result<()> {
    for job in jobs {
        info!("deleting job '{}' with job_id={}", job.name, job.id);
        api.delete_job(job.id)?;
    }
    Ok(())
}

/// Full names of schemas, across all catalogs, containing the current
/// user's short username.
pub fn schemas_for_user(api: &ApiClient, context: &WorkspaceContext) -> Result<Vec<String>> {
    let username = context.short_username();
    let mut schemas = Vec::new();
    for catalog in api.get_catalogs()? {
        let Some(catalog_name) = catalog.get("name").and_then(Value::as_str) else {
            continue;
        };
        for schema in api.get_schemas(catalog_name)? {
            let Some(full_name) = schema.get("full_name").and_then(Value::as_str) else {
                continue;
            };
            if full_name.contains(&username) {
                schemas.push(full_name.to_string());
            }
        }
    }
    Ok(schemas)
}

/// Delete a schema, dropping its tables and volumes first.
pub fn delete_schema(api: &ApiClient, full_name: &str) -> Result<()> {
    let Some((catalog, schema)) = full_name.split_once('.') else {
        return Ok(());
    };
    for table in api.get_tables(catalog, schema)? {
        if let Some(name) = table.get("full_name").and_then(Value::as_str) {
            info!("deleting table {name}");
            api.delete_table(name)?;
        }
    }
    for volume in api.get_volumes(catalog, schema)? {
        if let Some(name) = volume.get("full_name").and_then(Value::as_str) {
            info!("deleting volume {name}");
            api.delete_volume(name)?;
        }
    }
    info!("deleting schema {full_name}");
    api.delete_schema(full_name)?;
    Ok(())
}
