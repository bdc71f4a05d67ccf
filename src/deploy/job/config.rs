//! Job configuration record.
//!
//! [`JobConfig`] is the full deployable job: created from the built-in
//! default, overlaid with the user's `deployment.yml`, then mutated in place
//! by the enrichment steps before being serialized for transmission. Each
//! instance is exclusively owned by one build invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::Result;
use crate::gitinfo::GitSourceInfo;

/// A single job task.
///
/// Only the fields the enrichment steps act on are typed; everything else a
/// user writes (`depends_on`, `libraries`, timeouts, ...) is carried through
/// untouched in `extra`. `serverless` and `existing_cluster_name` exist only
/// to drive config building and are never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTask {
    /// Unique key of the task within the job.
    pub task_key: String,
    /// Notebook to run; synthesized from the task key when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_task: Option<NotebookTask>,
    /// Reference into the job's `job_clusters` list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_cluster_key: Option<String>,
    /// All-purpose cluster referenced by name; resolved to an id during
    /// enrichment.
    #[serde(default, skip_serializing)]
    pub existing_cluster_name: Option<String>,
    /// All-purpose cluster referenced directly by id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_cluster_id: Option<String>,
    /// Run on serverless compute; consumed during enrichment.
    #[serde(default, skip_serializing)]
    pub serverless: bool,
    /// Passed-through task fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notebook reference inside a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookTask {
    /// Path of the notebook, relative to the git root for `GIT` sources.
    pub notebook_path: String,
    /// Source of the notebook (`GIT` or `WORKSPACE`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Passed-through fields (e.g. `base_parameters`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotebookTask {
    /// Notebook task pointing at a path under the git root.
    pub fn git(notebook_path: String) -> Self {
        Self {
            notebook_path,
            source: Some("GIT".to_string()),
            extra: Map::new(),
        }
    }
}

/// Full deployable job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Derived job name.
    pub name: String,
    /// Maximum concurrent runs.
    pub max_concurrent_runs: u32,
    /// Email notification settings; forced empty outside prod.
    pub email_notifications: Map<String, Value>,
    /// Cron schedule, when the job has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Value>,
    /// Deployment and git tags.
    pub tags: Map<String, Value>,
    /// Job tasks.
    pub tasks: Vec<JobTask>,
    /// Job clusters materialized from the tasks' cluster keys.
    pub job_clusters: Vec<Value>,
    /// Job-level parameters.
    pub parameters: Vec<Value>,
    /// Identity the job runs as.
    pub run_as: Map<String, Value>,
    /// Resolved git source of the deploy notebook.
    pub git_source: GitSourceInfo,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_concurrent_runs: 1,
            email_notifications: Map::new(),
            schedule: None,
            tags: Map::new(),
            tasks: Vec::new(),
            job_clusters: Vec::new(),
            parameters: Vec::new(),
            run_as: Map::new(),
            git_source: GitSourceInfo::default(),
        }
    }
}

impl JobConfig {
    /// Overlay a user-supplied mapping key-by-key.
    ///
    /// Only keys naming an existing field are applied; unknown keys are
    /// silently ignored so that a config written for a newer release does
    /// not break an older deploy helper.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        for (key, value) in overrides {
            let value = value.clone();
            match key.as_str() {
                "name" => self.name = serde_json::from_value(value)?,
                "max_concurrent_runs" => self.max_concurrent_runs = serde_json::from_value(value)?,
                "email_notifications" => self.email_notifications = serde_json::from_value(value)?,
                "schedule" => self.schedule = serde_json::from_value(value)?,
                "tags" => self.tags = serde_json::from_value(value)?,
                "tasks" => self.tasks = serde_json::from_value(value)?,
                "job_clusters" => self.job_clusters = serde_json::from_value(value)?,
                "parameters" => self.parameters = serde_json::from_value(value)?,
                "run_as" => self.run_as = serde_json::from_value(value)?,
                "git_source" => self.git_source = serde_json::from_value(value)?,
                _ => debug!("ignoring unknown job config key '{key}'"),
            }
        }
        Ok(())
    }

    /// Serialize for transmission, dropping unset optional fields and the
    /// intermediate-only task fields.
    pub fn to_payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
