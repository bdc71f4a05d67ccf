//! End-to-end deploy flows against an in-memory platform API.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use lakeops::api::RepoInfo;
use lakeops::context::{Env, WorkspaceContext};
use lakeops::deploy::{deploy_job, deploy_pipeline};
use lakeops::mesh::cfg::ConfigLoader;
use lakeops::test_utils::FakePlatformApi;
use serde_json::json;
use tempfile::TempDir;

const NOTEBOOK_PATH: &str =
    "/Repos/test@vlfk.no/dp-notebooks/domains/transport/projects/taxinyc/flows/prep/revenue/deploy";
const REPO_PATH: &str = "/Repos/test@vlfk.no/dp-notebooks";

const JOB_NAME: &str = "transport_taxinyc_test_TestUser_main_1234abcd";
const PIPELINE_NAME: &str = "transport_taxinyc_test_TestUser_main_1234abcd_dlt";

fn context() -> WorkspaceContext {
    WorkspaceContext::new(
        "https://workspace.example.com",
        "token",
        NOTEBOOK_PATH,
        "Test.User@vlfk.no",
        HashMap::new(),
    )
}

fn api() -> FakePlatformApi {
    FakePlatformApi::new().with_repos(vec![RepoInfo {
        path: REPO_PATH.to_string(),
        url: "https://github.com/org/dp-notebooks".to_string(),
        provider: "gitHub".to_string(),
        branch: Some("main".to_string()),
        head_commit_id: "1234abcd5678".to_string(),
    }])
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("deployment.yml");
    fs::write(&path, content).unwrap();
    path
}

const JOB_CONFIG: &str = r#"tasks:
  - task_key: revenue
    job_cluster_key: common-job-cluster
parameters:
  - name: days_to_keep
    default: 2
"#;

const PIPELINE_CONFIG: &str = r#"pipeline_tasks:
  - pipeline_key: revenue
schema: dltrevenue
"#;

#[test]
fn test_deploy_job_creates_when_absent() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, JOB_CONFIG);
    let api = api();
    let loader = ConfigLoader::empty();

    let outcome = deploy_job(&context(), &api, &loader, &config_path, Some(Env::Test)).unwrap();

    assert_eq!(outcome.name, JOB_NAME);
    assert_eq!(
        api.calls(),
        vec!["repos".to_string(), format!("job_by_name:{JOB_NAME}"), "create_job".to_string()]
    );

    let (_, payload) = &api.payloads()[0];
    assert_eq!(payload["name"], JOB_NAME);
    assert_eq!(payload["tags"]["deployment"], "test_TestUser_main_1234abcd");
    assert_eq!(payload["tags"]["git_commit"], "1234abcd5678");
    assert_eq!(
        payload["tasks"][0]["notebook_task"],
        json!({
            "notebook_path": "domains/transport/projects/taxinyc/flows/prep/revenue/revenue",
            "source": "GIT",
        })
    );
    assert_eq!(payload["job_clusters"][0]["job_cluster_key"], "common-job-cluster");
    assert_eq!(payload["run_as"], json!({ "user_name": "Test.User@vlfk.no" }));
    assert_eq!(payload["git_source"]["git_path"], REPO_PATH);
    // user parameters come first, context parameters are appended
    assert_eq!(payload["parameters"][0]["name"], "days_to_keep");
    assert_eq!(payload["parameters"][1], json!({ "name": "pipeline_env", "default": "test" }));
}

#[test]
fn test_deploy_job_updates_when_present() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, JOB_CONFIG);
    let api = api().with_job(JOB_NAME, json!({ "job_id": 321 }));
    let loader = ConfigLoader::empty();

    deploy_job(&context(), &api, &loader, &config_path, Some(Env::Test)).unwrap();

    assert_eq!(
        api.calls(),
        vec!["repos".to_string(), format!("job_by_name:{JOB_NAME}"), "update_job:321".to_string()]
    );
}

#[test]
fn test_deploy_job_detects_env_from_username() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, JOB_CONFIG);
    let api = api();
    let loader = ConfigLoader::empty();

    // username contains '@' and no pipeline_env widget is set: test env
    let outcome = deploy_job(&context(), &api, &loader, &config_path, None).unwrap();
    assert_eq!(outcome.name, JOB_NAME);
}

#[test]
fn test_deploy_job_invalid_env_widget_aborts_before_any_api_call() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, JOB_CONFIG);
    let api = api();
    let loader = ConfigLoader::empty();
    let mut context = context();
    context
        .widgets
        .insert("pipeline_env".to_string(), "staging".to_string());

    assert!(deploy_job(&context, &api, &loader, &config_path, None).is_err());
    assert!(api.calls().is_empty());
}

#[test]
fn test_deploy_pipeline_creates_when_absent() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, PIPELINE_CONFIG);
    let api = api();
    let loader = ConfigLoader::empty();

    let outcome =
        deploy_pipeline(&context(), &api, &loader, &config_path, Some(Env::Test)).unwrap();

    assert_eq!(outcome.name, PIPELINE_NAME);
    assert_eq!(
        api.calls(),
        vec![
            "repos".to_string(),
            format!("pipeline_by_name:{PIPELINE_NAME}"),
            "create_pipeline".to_string(),
        ]
    );

    let (_, payload) = &api.payloads()[0];
    assert_eq!(payload["catalog"], "transport");
    assert_eq!(payload["schema"], "test_TestUser_main_1234abcd_dltrevenue");
    assert_eq!(payload["development"], true);
    assert_eq!(
        payload["libraries"],
        json!([{ "notebook": {
            "path": "/Repos/test@vlfk.no/dp-notebooks/domains/transport/projects/taxinyc/flows/prep/revenue/revenue"
        } }])
    );
    // intermediate-only fields never reach the wire
    assert!(payload.get("pipeline_tasks").is_none());
    assert!(payload.get("git_source").is_none());
    assert!(payload.get("run_as").is_none());
    assert!(payload.get("policy_name").is_none());
}

#[test]
fn test_deploy_pipeline_updates_when_present() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, PIPELINE_CONFIG);
    let api = api().with_pipeline(PIPELINE_NAME, json!({ "pipeline_id": "p-77" }));
    let loader = ConfigLoader::empty();

    deploy_pipeline(&context(), &api, &loader, &config_path, Some(Env::Test)).unwrap();

    assert_eq!(
        api.calls(),
        vec![
            "repos".to_string(),
            format!("pipeline_by_name:{PIPELINE_NAME}"),
            "update_pipeline:p-77".to_string(),
        ]
    );
}

#[test]
fn test_deploy_pipeline_missing_schema_aborts_before_create() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, "pipeline_tasks:\n  - pipeline_key: revenue\n");
    let api = api();
    let loader = ConfigLoader::empty();

    assert!(deploy_pipeline(&context(), &api, &loader, &config_path, Some(Env::Test)).is_err());
    // git resolution ran, but nothing was created or updated
    assert_eq!(
        api.calls(),
        vec!["repos".to_string()],
    );
}

#[test]
fn test_deploy_job_with_naming_config_from_repo() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, JOB_CONFIG);
    let marker = dir.path().join(".lakeopscfg");
    fs::create_dir(&marker).unwrap();
    fs::write(
        marker.join("config.yml"),
        "naming:\n  job:\n    prod: \"{domain}-{project}\"\n    other: \"{domain}-{project}-{env}\"\n",
    )
    .unwrap();
    let api = api();
    let loader = ConfigLoader::from_dir(dir.path()).unwrap();

    let outcome = deploy_job(&context(), &api, &loader, &config_path, Some(Env::Test)).unwrap();
    assert_eq!(outcome.name, "transport-taxinyc-test");
}

#[test]
fn test_deploy_job_with_invalid_naming_template_aborts() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, JOB_CONFIG);
    let marker = dir.path().join(".lakeopscfg");
    fs::create_dir(&marker).unwrap();
    fs::write(
        marker.join("config.yml"),
        "naming:\n  job:\n    other: \"{domain} {project}\"\n",
    )
    .unwrap();
    let api = api();
    let loader = ConfigLoader::from_dir(dir.path()).unwrap();

    let err = deploy_job(&context(), &api, &loader, &config_path, Some(Env::Test)).unwrap_err();
    assert!(err.to_string().contains("invalid naming template"));
    assert!(api.payloads().is_empty());
}
