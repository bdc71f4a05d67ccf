//! Job-cluster materialization and lookup.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::api::PlatformApi;
use crate::core::{LakeopsError, Result};
use crate::deploy::job::config::JobConfig;

/// Static cluster-template table, keyed by `job_cluster_key`.
pub fn cluster_templates() -> Map<String, Value> {
    let templates = json!({
        "common-job-cluster": {
            "new_cluster": {
                "num_workers": 1,
                "spark_version": "14.3.x-scala2.12",
                "spark_conf": {},
                "azure_attributes": {
                    "first_on_demand": 1,
                    "availability": "SPOT_WITH_FALLBACK_AZURE",
                    "spot_bid_max_price": -1,
                },
                "node_type_id": "Standard_D4ads_v5",
                "ssh_public_keys": [],
                "custom_tags": {},
                "spark_env_vars": {},
                "init_scripts": [],
                "data_security_mode": "SINGLE_USER",
                "runtime_engine": "STANDARD",
            }
        }
    });
    match templates {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Materialize the clusters used by the job's tasks into `job_clusters`.
pub fn add_clusters(job_config: &mut JobConfig, used_clusters: &[String]) -> Result<()> {
    job_config.job_clusters = used_clusters
        .iter()
        .map(|key| cluster_from_template(key))
        .collect::<Result<Vec<_>>>()?;
    Ok(())
}

/// Resolve an all-purpose cluster name to its id, fatal when absent.
pub fn lookup_cluster_id(api: &dyn PlatformApi, cluster_name: &str) -> Result<String> {
    for cluster in api.clusters()? {
        if cluster.get("cluster_name").and_then(Value::as_str) == Some(cluster_name) {
            if let Some(id) = cluster.get("cluster_id").and_then(Value::as_str) {
                return Ok(id.to_string());
            }
        }
    }
    Err(LakeopsError::ClusterNotFound { name: cluster_name.to_string() })
}

fn cluster_from_template(key: &str) -> Result<Value> {
    debug!("materializing job cluster for key '{key}'");
    let mut cluster = cluster_templates()
        .get(key)
        .cloned()
        .ok_or_else(|| LakeopsError::UnknownClusterTemplate { key: key.to_string() })?;
    if let Some(object) = cluster.as_object_mut() {
        object.insert("job_cluster_key".to_string(), json!(key));
    }
    Ok(cluster)
}
