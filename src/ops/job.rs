//! Run jobs by name.

use serde_json::Value;

use crate::api::{ApiError, PlatformApi};
use crate::core::{LakeopsError, Result};

/// Run a job by its (derived) name. Missing jobs are an error here, unlike
/// in the deploy flow where absence means "create".
pub fn run_job_by_name(api: &dyn PlatformApi, job_name: &str) -> Result<Value> {
    let job = api
        .job_by_name(job_name)?
        .ok_or_else(|| LakeopsError::ResourceNotFound { kind: "job", name: job_name.to_string() })?;
    let job_id = job
        .get("job_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError {
            method: "GET",
            message: format!("job entry for '{job_name}' is missing job_id"),
        })?;
    Ok(api.run_job_now(job_id)?)
}
