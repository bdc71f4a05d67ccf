//! Thin wrapper around the platform REST API.
//!
//! [`ApiClient`] is a deliberately small CRUD client: bearer auth, JSON
//! bodies, a versioned URL builder and a fixed short timeout. Every failure
//! is wrapped into [`ApiError`] carrying the HTTP verb, and the response body
//! when one was available, so deploy logs show what the platform actually
//! said.
//!
//! The naming/config-building core never depends on `ApiClient` directly; it
//! consumes the [`PlatformApi`] trait, which tests implement with in-memory
//! fakes. Lookups that may legitimately find nothing (`job_by_name`,
//! `pipeline_by_name`) return `Option`, not an error.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::context::WorkspaceContext;

/// Timeout applied to every API request. The core performs a bounded
/// sequence of calls per build; none may block indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API version used when an endpoint does not pin its own.
const DEFAULT_API_VERSION: &str = "2.1";

/// Uniform error for platform API failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("api error while making {method} call: {message}")]
pub struct ApiError {
    /// HTTP verb of the failing call.
    pub method: &'static str,
    /// Error detail, including the response body when available.
    pub message: String,
}

impl ApiError {
    fn new(method: &'static str, message: impl Into<String>) -> Self {
        Self { method, message: message.into() }
    }
}

/// A linked repository as reported by the platform repos API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    /// Workspace path the repository is checked out under.
    #[serde(default)]
    pub path: String,
    /// Remote URL.
    #[serde(default)]
    pub url: String,
    /// Git provider (e.g. "gitHub", "azureDevOpsServices").
    #[serde(default)]
    pub provider: String,
    /// Checked-out branch, when the API reports one.
    #[serde(default)]
    pub branch: Option<String>,
    /// Commit hash of the checked-out head.
    #[serde(default)]
    pub head_commit_id: String,
}

/// Capability surface the core consumes.
///
/// Implemented by [`ApiClient`] for real deployments and by in-memory fakes
/// in tests. Everything is synchronous; a build performs a bounded sequence
/// of calls and carries no retry logic of its own.
pub trait PlatformApi {
    /// List repositories linked into the workspace.
    fn repos(&self) -> Result<Vec<RepoInfo>, ApiError>;

    /// Look up a job by name; absent is a value, not an error.
    fn job_by_name(&self, name: &str) -> Result<Option<Value>, ApiError>;

    /// Create a job from a full settings payload.
    fn create_job(&self, payload: &Value) -> Result<Value, ApiError>;

    /// Replace the settings of an existing job.
    fn update_job(&self, job_id: i64, payload: &Value) -> Result<Value, ApiError>;

    /// Trigger a run of an existing job.
    fn run_job_now(&self, job_id: i64) -> Result<Value, ApiError>;

    /// Look up a pipeline by name; absent is a value, not an error.
    fn pipeline_by_name(&self, name: &str) -> Result<Option<Value>, ApiError>;

    /// Create a pipeline from a full settings payload.
    fn create_pipeline(&self, payload: &Value) -> Result<Value, ApiError>;

    /// Replace the settings of an existing pipeline.
    fn update_pipeline(&self, pipeline_id: &str, payload: &Value) -> Result<Value, ApiError>;

    /// Trigger an update run of an existing pipeline.
    fn run_pipeline_now(&self, pipeline_id: &str) -> Result<Value, ApiError>;

    /// List all-purpose clusters in the workspace.
    fn clusters(&self) -> Result<Vec<Value>, ApiError>;
}

/// Blocking REST client for the platform API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    host: String,
    token: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    /// Create a client for a workspace host and token.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ApiError::new("CLIENT", err.to_string()))?;
        Ok(Self { host: host.into(), token: token.into(), http })
    }

    /// Create a client from a workspace context.
    pub fn from_context(context: &WorkspaceContext) -> Result<Self, ApiError> {
        Self::new(&context.api_url, &context.api_token)
    }

    /// Compose the full URL for an endpoint stub and API version.
    pub fn build_url(&self, stub: &str, version: &str) -> String {
        format!("{}/api/{}/{}", self.host.trim_end_matches('/'), version, stub)
    }

    fn unpack(
        &self,
        method: &'static str,
        result: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<Value, ApiError> {
        let response =
            result.map_err(|err| ApiError::new(method, err.to_string()))?;
        if let Err(err) = response.error_for_status_ref() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::new(method, format!("{err}: {body}")));
        }
        let value: Value = response
            .json()
            .map_err(|err| ApiError::new(method, err.to_string()))?;
        debug!("api response: {value}");
        Ok(value)
    }

    fn get(
        &self,
        stub: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let request = self
            .http
            .get(self.build_url(stub, version))
            .bearer_auth(&self.token)
            .query(params);
        self.unpack("GET", request.send())
    }

    fn post(
        &self,
        stub: &str,
        version: &str,
        payload: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut request = self
            .http
            .post(self.build_url(stub, version))
            .bearer_auth(&self.token);
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        self.unpack("POST", request.send())
    }

    fn put(&self, stub: &str, version: &str, payload: &Value) -> Result<Value, ApiError> {
        let request = self
            .http
            .put(self.build_url(stub, version))
            .bearer_auth(&self.token)
            .json(payload);
        self.unpack("PUT", request.send())
    }

    fn delete(&self, stub: &str, version: &str) -> Result<Value, ApiError> {
        let request = self
            .http
            .delete(self.build_url(stub, version))
            .bearer_auth(&self.token);
        self.unpack("DELETE", request.send())
    }

    /// List every job in the workspace, following pagination tokens.
    pub fn get_jobs(&self) -> Result<Vec<Value>, ApiError> {
        let mut result = self.get("jobs/list", "2.2", &[])?;
        let mut jobs = array_field(&result, "jobs");
        while let Some(token) = next_page_token(&result) {
            result = self.get("jobs/list", "2.2", &[("page_token", token)])?;
            jobs.extend(array_field(&result, "jobs"));
        }
        Ok(jobs)
    }

    /// Delete a job by id.
    pub fn delete_job(&self, job_id: i64) -> Result<Value, ApiError> {
        self.post("jobs/delete", DEFAULT_API_VERSION, Some(&json!({ "job_id": job_id })))
    }

    /// List catalogs visible to the caller.
    pub fn get_catalogs(&self) -> Result<Vec<Value>, ApiError> {
        Ok(array_field(&self.get("unity-catalog/catalogs", DEFAULT_API_VERSION, &[])?, "catalogs"))
    }

    /// List schemas in a catalog.
    pub fn get_schemas(&self, catalog: &str) -> Result<Vec<Value>, ApiError> {
        let result = self.get(
            "unity-catalog/schemas",
            DEFAULT_API_VERSION,
            &[("catalog_name", catalog.to_string())],
        )?;
        Ok(array_field(&result, "schemas"))
    }

    /// List tables in a schema.
    pub fn get_tables(&self, catalog: &str, schema: &str) -> Result<Vec<Value>, ApiError> {
        let result = self.get(
            "unity-catalog/tables",
            DEFAULT_API_VERSION,
            &[
                ("catalog_name", catalog.to_string()),
                ("schema_name", schema.to_string()),
            ],
        )?;
        Ok(array_field(&result, "tables"))
    }

    /// List volumes in a schema.
    pub fn get_volumes(&self, catalog: &str, schema: &str) -> Result<Vec<Value>, ApiError> {
        let result = self.get(
            "unity-catalog/volumes",
            DEFAULT_API_VERSION,
            &[
                ("catalog_name", catalog.to_string()),
                ("schema_name", schema.to_string()),
            ],
        )?;
        Ok(array_field(&result, "volumes"))
    }

    /// Delete a schema by full name (`catalog.schema`).
    pub fn delete_schema(&self, full_name: &str) -> Result<Value, ApiError> {
        self.delete(&format!("unity-catalog/schemas/{full_name}"), DEFAULT_API_VERSION)
    }

    /// Delete a table by full name (`catalog.schema.table`).
    pub fn delete_table(&self, full_name: &str) -> Result<Value, ApiError> {
        self.delete(&format!("unity-catalog/tables/{full_name}"), DEFAULT_API_VERSION)
    }

    /// Delete a volume by full name.
    pub fn delete_volume(&self, full_name: &str) -> Result<Value, ApiError> {
        self.delete(&format!("unity-catalog/volumes/{full_name}"), DEFAULT_API_VERSION)
    }
}

impl PlatformApi for ApiClient {
    fn repos(&self) -> Result<Vec<RepoInfo>, ApiError> {
        // Repositories can be checked out under /Repos or as folders under /Users.
        let mut entries = Vec::new();
        for prefix in ["/Repos", "/Users"] {
            let result = self.get("repos", "2.0", &[("path_prefix", prefix.to_string())])?;
            entries.extend(array_field(&result, "repos"));
        }
        entries
            .into_iter()
            .map(|entry| {
                serde_json::from_value(entry)
                    .map_err(|err| ApiError::new("GET", format!("malformed repo entry: {err}")))
            })
            .collect()
    }

    fn job_by_name(&self, name: &str) -> Result<Option<Value>, ApiError> {
        let result =
            self.get("jobs/list", DEFAULT_API_VERSION, &[("name", name.to_string())])?;
        Ok(array_field(&result, "jobs").into_iter().next())
    }

    fn create_job(&self, payload: &Value) -> Result<Value, ApiError> {
        info!("creating job");
        self.post("jobs/create", DEFAULT_API_VERSION, Some(payload))
    }

    fn update_job(&self, job_id: i64, payload: &Value) -> Result<Value, ApiError> {
        info!(job_id, "resetting job");
        let data = json!({ "job_id": job_id, "new_settings": payload });
        self.post("jobs/reset", DEFAULT_API_VERSION, Some(&data))
    }

    fn run_job_now(&self, job_id: i64) -> Result<Value, ApiError> {
        info!(job_id, "running job");
        self.post("jobs/run-now", DEFAULT_API_VERSION, Some(&json!({ "job_id": job_id })))
    }

    fn pipeline_by_name(&self, name: &str) -> Result<Option<Value>, ApiError> {
        let result = self.get(
            "pipelines",
            "2.0",
            &[("filter", format!("name LIKE '{name}'"))],
        )?;
        Ok(array_field(&result, "statuses").into_iter().next())
    }

    fn create_pipeline(&self, payload: &Value) -> Result<Value, ApiError> {
        info!("creating pipeline");
        self.post("pipelines", "2.0", Some(payload))
    }

    fn update_pipeline(&self, pipeline_id: &str, payload: &Value) -> Result<Value, ApiError> {
        info!(pipeline_id, "updating pipeline");
        self.put(&format!("pipelines/{pipeline_id}"), "2.0", payload)
    }

    fn run_pipeline_now(&self, pipeline_id: &str) -> Result<Value, ApiError> {
        info!(pipeline_id, "running pipeline");
        self.post(&format!("pipelines/{pipeline_id}/updates"), "2.0", None)
    }

    fn clusters(&self) -> Result<Vec<Value>, ApiError> {
        Ok(array_field(&self.get("clusters/list", DEFAULT_API_VERSION, &[])?, "clusters"))
    }
}

fn array_field(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn next_page_token(value: &Value) -> Option<String> {
    value
        .get("next_page_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
