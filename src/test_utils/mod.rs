//! Test utilities shared between unit and integration tests.
//!
//! Available under `#[cfg(test)]` and the `test-utils` feature (integration
//! tests depend on the crate with that feature enabled, mirroring how the
//! fake is consumed from `tests/`).

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::api::{ApiError, PlatformApi, RepoInfo};

/// In-memory [`PlatformApi`] implementation.
///
/// Records every call (and every create/update payload) so tests can assert
/// on the exact interaction sequence without any HTTP involved.
#[derive(Debug, Default)]
pub struct FakePlatformApi {
    repos: Vec<RepoInfo>,
    fail_repos: bool,
    clusters: Vec<Value>,
    jobs: HashMap<String, Value>,
    pipelines: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
    payloads: Mutex<Vec<(String, Value)>>,
}

impl FakePlatformApi {
    /// Empty workspace: no repos, clusters, jobs or pipelines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repos list.
    #[must_use]
    pub fn with_repos(mut self, repos: Vec<RepoInfo>) -> Self {
        self.repos = repos;
        self
    }

    /// Make `repos()` fail, simulating an API outage.
    #[must_use]
    pub fn with_failing_repos(mut self) -> Self {
        self.fail_repos = true;
        self
    }

    /// Seed the cluster list; entries need `cluster_name` and `cluster_id`.
    #[must_use]
    pub fn with_clusters(mut self, clusters: Vec<Value>) -> Self {
        self.clusters = clusters;
        self
    }

    /// Seed an existing job, keyed by name.
    #[must_use]
    pub fn with_job(mut self, name: &str, job: Value) -> Self {
        self.jobs.insert(name.to_string(), job);
        self
    }

    /// Seed an existing pipeline, keyed by name.
    #[must_use]
    pub fn with_pipeline(mut self, name: &str, pipeline: Value) -> Self {
        self.pipelines.insert(name.to_string(), pipeline);
        self
    }

    /// Names of the calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Payloads passed to create/update calls, in order.
    pub fn payloads(&self) -> Vec<(String, Value)> {
        self.payloads.lock().expect("payloads lock").clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("calls lock").push(call.into());
    }

    fn record_payload(&self, call: &str, payload: &Value) {
        self.payloads
            .lock()
            .expect("payloads lock")
            .push((call.to_string(), payload.clone()));
    }
}

impl PlatformApi for FakePlatformApi {
    fn repos(&self) -> Result<Vec<RepoInfo>, ApiError> {
        self.record("repos");
        if self.fail_repos {
            return Err(ApiError { method: "GET", message: "simulated repos failure".to_string() });
        }
        Ok(self.repos.clone())
    }

    fn job_by_name(&self, name: &str) -> Result<Option<Value>, ApiError> {
        self.record(format!("job_by_name:{name}"));
        Ok(self.jobs.get(name).cloned())
    }

    fn create_job(&self, payload: &Value) -> Result<Value, ApiError> {
        self.record("create_job");
        self.record_payload("create_job", payload);
        Ok(json!({ "job_id": 1001 }))
    }

    fn update_job(&self, job_id: i64, payload: &Value) -> Result<Value, ApiError> {
        self.record(format!("update_job:{job_id}"));
        self.record_payload("update_job", payload);
        Ok(json!({}))
    }

    fn run_job_now(&self, job_id: i64) -> Result<Value, ApiError> {
        self.record(format!("run_job_now:{job_id}"));
        Ok(json!({ "run_id": 42 }))
    }

    fn pipeline_by_name(&self, name: &str) -> Result<Option<Value>, ApiError> {
        self.record(format!("pipeline_by_name:{name}"));
        Ok(self.pipelines.get(name).cloned())
    }

    fn create_pipeline(&self, payload: &Value) -> Result<Value, ApiError> {
        self.record("create_pipeline");
        self.record_payload("create_pipeline", payload);
        Ok(json!({ "pipeline_id": "pipe-1001" }))
    }

    fn update_pipeline(&self, pipeline_id: &str, payload: &Value) -> Result<Value, ApiError> {
        self.record(format!("update_pipeline:{pipeline_id}"));
        self.record_payload("update_pipeline", payload);
        Ok(json!({}))
    }

    fn run_pipeline_now(&self, pipeline_id: &str) -> Result<Value, ApiError> {
        self.record(format!("run_pipeline_now:{pipeline_id}"));
        Ok(json!({ "update_id": "upd-1" }))
    }

    fn clusters(&self) -> Result<Vec<Value>, ApiError> {
        self.record("clusters");
        Ok(self.clusters.clone())
    }
}
