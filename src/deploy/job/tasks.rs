//! Job task enrichment.
//!
//! Every task must resolve to exactly one execution target: serverless
//! compute, a named job cluster, or an existing all-purpose cluster (by name
//! or id). Tasks without an explicit notebook get one synthesized from the
//! git root path and the task key.

use crate::api::PlatformApi;
use crate::context::WorkspaceContext;
use crate::core::{LakeopsError, Result};
use crate::deploy::job::clusters::{add_clusters, lookup_cluster_id};
use crate::deploy::job::config::{JobConfig, NotebookTask};
use crate::deploy::nbpath::{join_notebook_path, nbrelfolder};

/// Enrich the job's tasks in place and materialize the used job clusters.
pub fn enrich_tasks(
    job_config: &mut JobConfig,
    context: &WorkspaceContext,
    api: &dyn PlatformApi,
) -> Result<()> {
    let base_path = nbrelfolder(context, job_config.git_source.path())?;
    let mut used_clusters: Vec<String> = Vec::new();

    for task in &mut job_config.tasks {
        if let Some(notebook) = task.notebook_task.as_mut() {
            if notebook.source.is_none() {
                notebook.source = Some("GIT".to_string());
                notebook.notebook_path = join_notebook_path(&base_path, &notebook.notebook_path);
            }
        } else {
            let path = join_notebook_path(&base_path, &task.task_key);
            task.notebook_task = Some(NotebookTask::git(path));
        }

        let has_cluster_reference = task.job_cluster_key.is_some()
            || task.existing_cluster_name.is_some()
            || task.existing_cluster_id.is_some();

        if task.serverless {
            if has_cluster_reference {
                return Err(LakeopsError::AmbiguousClusterReference {
                    task_key: task.task_key.clone(),
                });
            }
            // Tasks without any cluster reference automatically run on
            // serverless compute; the flag itself never reaches the wire.
            task.serverless = false;
            continue;
        }

        if let Some(key) = &task.job_cluster_key {
            if !used_clusters.contains(key) {
                used_clusters.push(key.clone());
            }
        } else if let Some(name) = task.existing_cluster_name.take() {
            task.existing_cluster_id = Some(lookup_cluster_id(api, &name)?);
        } else if task.existing_cluster_id.is_none() {
            return Err(LakeopsError::MissingClusterReference {
                task_key: task.task_key.clone(),
            });
        }
    }

    add_clusters(job_config, &used_clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitinfo::GitSourceInfo;
    use crate::test_utils::FakePlatformApi;
    use serde_json::json;
    use std::collections::HashMap;

    fn context() -> WorkspaceContext {
        WorkspaceContext::new("api_url", "dummy", "test/notebook_path", "username", HashMap::new())
    }

    fn config_with_tasks(tasks: serde_json::Value) -> JobConfig {
        let mut config = JobConfig::default();
        config.tasks = serde_json::from_value(tasks).unwrap();
        config.git_source = GitSourceInfo { git_path: Some("test".to_string()), ..Default::default() };
        config
    }

    #[test]
    fn test_no_cluster_reference_is_fatal() {
        let mut config = config_with_tasks(json!([{ "task_key": "task_key" }]));
        let err = enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap_err();
        assert!(matches!(err, LakeopsError::MissingClusterReference { .. }));
    }

    #[test]
    fn test_serverless_task_gets_synthesized_notebook_and_no_cluster() {
        let mut config =
            config_with_tasks(json!([{ "task_key": "task_key", "serverless": true }]));
        enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap();
        let payload = config.to_payload().unwrap();
        assert_eq!(
            payload["tasks"],
            json!([{
                "task_key": "task_key",
                "notebook_task": { "notebook_path": "task_key", "source": "GIT" },
            }])
        );
        assert_eq!(payload["job_clusters"], json!([]));
    }

    #[test]
    fn test_serverless_with_job_cluster_key_is_fatal() {
        let mut config = config_with_tasks(json!([{
            "task_key": "task_key",
            "serverless": true,
            "job_cluster_key": "some_cluster_key",
        }]));
        let err = enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap_err();
        assert!(matches!(err, LakeopsError::AmbiguousClusterReference { .. }));
    }

    #[test]
    fn test_serverless_with_existing_cluster_name_is_fatal() {
        let mut config = config_with_tasks(json!([{
            "task_key": "task_key",
            "serverless": true,
            "existing_cluster_name": "shared",
        }]));
        let err = enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap_err();
        assert!(matches!(err, LakeopsError::AmbiguousClusterReference { .. }));
    }

    #[test]
    fn test_git_path_is_prepended_to_declared_notebook_task() {
        let mut config = config_with_tasks(json!([{
            "task_key": "task_key",
            "serverless": true,
            "notebook_task": { "notebook_path": "./test_notebook" },
        }]));
        config.git_source =
            GitSourceInfo { git_path: Some("/git_root/folder/location_of_notebook".to_string()), ..Default::default() };
        let ctx = WorkspaceContext::new(
            "api_url",
            "dummy",
            "/git_root/folder/location_of_notebook/test/notebook_path",
            "username",
            HashMap::new(),
        );
        enrich_tasks(&mut config, &ctx, &FakePlatformApi::new()).unwrap();
        let notebook = config.tasks[0].notebook_task.as_ref().unwrap();
        assert_eq!(notebook.notebook_path, "test/test_notebook");
        assert_eq!(notebook.source.as_deref(), Some("GIT"));
    }

    #[test]
    fn test_declared_source_keeps_notebook_path_untouched() {
        let mut config = config_with_tasks(json!([{
            "task_key": "task_key",
            "serverless": true,
            "notebook_task": { "notebook_path": "/Workspace/abs/nb", "source": "WORKSPACE" },
        }]));
        enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap();
        let notebook = config.tasks[0].notebook_task.as_ref().unwrap();
        assert_eq!(notebook.notebook_path, "/Workspace/abs/nb");
        assert_eq!(notebook.source.as_deref(), Some("WORKSPACE"));
    }

    #[test]
    fn test_job_cluster_key_is_collected_once() {
        let mut config = config_with_tasks(json!([
            { "task_key": "a", "job_cluster_key": "common-job-cluster" },
            { "task_key": "b", "job_cluster_key": "common-job-cluster" },
        ]));
        enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap();
        assert_eq!(config.job_clusters.len(), 1);
        assert_eq!(config.job_clusters[0]["job_cluster_key"], "common-job-cluster");
    }

    #[test]
    fn test_existing_cluster_name_resolves_to_id() {
        let api = FakePlatformApi::new().with_clusters(vec![
            json!({ "cluster_name": "shared", "cluster_id": "0123-456-abc" }),
        ]);
        let mut config = config_with_tasks(json!([{
            "task_key": "task_key",
            "existing_cluster_name": "shared",
        }]));
        enrich_tasks(&mut config, &context(), &api).unwrap();
        assert_eq!(config.tasks[0].existing_cluster_id.as_deref(), Some("0123-456-abc"));
        assert_eq!(config.tasks[0].existing_cluster_name, None);
    }

    #[test]
    fn test_existing_cluster_id_passes_through() {
        let mut config = config_with_tasks(json!([{
            "task_key": "task_key",
            "existing_cluster_id": "0123-456-abc",
        }]));
        enrich_tasks(&mut config, &context(), &FakePlatformApi::new()).unwrap();
        assert_eq!(config.tasks[0].existing_cluster_id.as_deref(), Some("0123-456-abc"));
    }
}
