//! Pipeline task enrichment.

use serde_json::{Value, json};

use crate::context::{Env, WorkspaceContext};
use crate::core::{LakeopsError, Result};
use crate::deploy::pipeline::config::PipelineConfig;
use crate::mesh::naming::Namer;

/// Set the target catalog and schema, the development flag, and one notebook
/// library per pipeline task.
pub fn enrich_tasks(
    pipeline_config: &mut PipelineConfig,
    context: &WorkspaceContext,
    namer: &Namer<'_>,
    env: Env,
) -> Result<()> {
    let catalog = namer.catalog_from_path(Some(env))?;
    let schema = pipeline_config
        .schema
        .as_deref()
        .filter(|schema| !schema.is_empty())
        .ok_or(LakeopsError::MissingSchema)?;
    pipeline_config.schema = Some(namer.dbname(schema, &catalog, false, Some(env))?);
    pipeline_config.catalog = Some(catalog);
    pipeline_config.development = Some(!env.is_prod());

    // DLT does not support git refs, so libraries point at absolute paths
    // next to the deploy notebook.
    let base_nb_path = parent_folder(&context.notebook_path);
    for task in &pipeline_config.pipeline_tasks {
        let pipeline_key = task
            .get("pipeline_key")
            .and_then(Value::as_str)
            .ok_or_else(|| LakeopsError::invalid_argument("pipeline task missing pipeline_key"))?;
        pipeline_config
            .libraries
            .push(json!({ "notebook": { "path": format!("{base_nb_path}/{pipeline_key}") } }));
    }
    Ok(())
}

/// Chip off the last path segment, returning the containing folder.
fn parent_folder(path: &str) -> &str {
    path.rsplit_once('/').map(|(folder, _)| folder).unwrap_or("")
}
