//! Pipeline configuration record.
//!
//! Structurally parallel to [`crate::deploy::job::JobConfig`]. Some fields
//! exist only to drive config building (`pipeline_tasks`, `git_source`,
//! `run_as`, `policy_name`) and must never reach the wire format; they are
//! excluded from serialization entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::Result;
use crate::gitinfo::GitSourceInfo;

/// Full deployable pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Derived pipeline name.
    pub name: String,
    /// Product edition.
    pub edition: String,
    /// Target catalog, derived from the notebook path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// Target schema; required, rewritten via the db naming rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Whether to sample input data.
    pub data_sampling: bool,
    /// Continuous (streaming) execution.
    pub continuous: bool,
    /// Release channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Photon execution.
    pub photon: bool,
    /// Pipeline type.
    pub pipeline_type: String,
    /// Notebook libraries; one entry appended per pipeline task.
    pub libraries: Vec<Value>,
    /// Serverless compute.
    pub serverless: bool,
    /// Development mode; set from the environment during enrichment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development: Option<bool>,
    /// Deployment and git tags.
    pub tags: Map<String, Value>,
    /// Pipeline parameters.
    pub parameters: Vec<Value>,
    /// Task declarations driving library generation; never serialized.
    #[serde(default, skip_serializing)]
    pub pipeline_tasks: Vec<Value>,
    /// Cron schedule, when the pipeline has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Value>,
    /// Cluster policy name; config-building input only.
    #[serde(default, skip_serializing)]
    pub policy_name: String,
    /// Run-as identity; config-building input only.
    #[serde(default, skip_serializing)]
    pub run_as: Option<Map<String, Value>>,
    /// Resolved git source of the deploy notebook; never serialized.
    #[serde(default, skip_serializing)]
    pub git_source: GitSourceInfo,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            edition: "ADVANCED".to_string(),
            catalog: None,
            schema: None,
            data_sampling: false,
            continuous: false,
            channel: Some("CURRENT".to_string()),
            photon: true,
            pipeline_type: "WORKSPACE".to_string(),
            libraries: Vec::new(),
            serverless: true,
            development: None,
            tags: Map::new(),
            parameters: Vec::new(),
            pipeline_tasks: Vec::new(),
            schedule: None,
            policy_name: "dlt_default_policy".to_string(),
            run_as: None,
            git_source: GitSourceInfo::default(),
        }
    }
}

impl PipelineConfig {
    /// Overlay a user-supplied mapping key-by-key; unknown keys are
    /// silently ignored.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> Result<()> {
        for (key, value) in overrides {
            let value = value.clone();
            match key.as_str() {
                "name" => self.name = serde_json::from_value(value)?,
                "edition" => self.edition = serde_json::from_value(value)?,
                "catalog" => self.catalog = serde_json::from_value(value)?,
                "schema" => self.schema = serde_json::from_value(value)?,
                "data_sampling" => self.data_sampling = serde_json::from_value(value)?,
                "continuous" => self.continuous = serde_json::from_value(value)?,
                "channel" => self.channel = serde_json::from_value(value)?,
                "photon" => self.photon = serde_json::from_value(value)?,
                "pipeline_type" => self.pipeline_type = serde_json::from_value(value)?,
                "libraries" => self.libraries = serde_json::from_value(value)?,
                "serverless" => self.serverless = serde_json::from_value(value)?,
                "development" => self.development = serde_json::from_value(value)?,
                "tags" => self.tags = serde_json::from_value(value)?,
                "parameters" => self.parameters = serde_json::from_value(value)?,
                "pipeline_tasks" => self.pipeline_tasks = serde_json::from_value(value)?,
                "schedule" => self.schedule = serde_json::from_value(value)?,
                "policy_name" => self.policy_name = serde_json::from_value(value)?,
                "run_as" => self.run_as = serde_json::from_value(value)?,
                "git_source" => self.git_source = serde_json::from_value(value)?,
                _ => debug!("ignoring unknown pipeline config key '{key}'"),
            }
        }
        Ok(())
    }

    /// Serialize for transmission, dropping unset optional fields and the
    /// intermediate-only fields.
    pub fn to_payload(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
