//! Run pipelines by name.

use serde_json::Value;

use crate::api::{ApiError, PlatformApi};
use crate::core::{LakeopsError, Result};

/// Run a pipeline by its (derived) name.
pub fn run_pipeline_by_name(api: &dyn PlatformApi, pipeline_name: &str) -> Result<Value> {
    let pipeline = api.pipeline_by_name(pipeline_name)?.ok_or_else(|| {
        LakeopsError::ResourceNotFound { kind: "pipeline", name: pipeline_name.to_string() }
    })?;
    let pipeline_id = pipeline
        .get("pipeline_id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError {
            method: "GET",
            message: format!("pipeline entry for '{pipeline_name}' is missing pipeline_id"),
        })?;
    Ok(api.run_pipeline_now(pipeline_id)?)
}
