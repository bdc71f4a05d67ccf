//! Error types for lakeops operations.
//!
//! [`LakeopsError`] enumerates all failure modes of the naming and
//! config-building core. The taxonomy mirrors how errors propagate:
//!
//! - **Input validation** ([`LakeopsError::InvalidArgument`]) - empty required
//!   arguments or an invalid environment value; raised synchronously before
//!   any template or network work.
//! - **Configuration** - invalid naming templates, unknown placeholders,
//!   missing pipeline schema, ambiguous or missing cluster references; fatal,
//!   no partial resource is ever created.
//! - **Collaborator** ([`LakeopsError::Api`]) - platform API failures, wrapped
//!   uniformly with the failing HTTP verb. The git-lookup path downgrades
//!   these to an empty git state instead of propagating.
//!
//! Lookups that may legitimately find nothing (job/pipeline by name) return
//! `Option`, not an error.

use thiserror::Error;

use crate::api::ApiError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LakeopsError>;

/// The main error type for lakeops operations.
#[derive(Error, Debug)]
pub enum LakeopsError {
    /// A required argument was empty or had an invalid value.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// A naming template contained characters outside the allowed set.
    ///
    /// Templates may only contain alphanumerics, underscores, hyphens and
    /// curly brackets, e.g. `{env}_{username}_{gitbranch}_{gitshortref}_{db}`.
    #[error(
        "invalid naming template '{template}': only alphanumeric characters, \
         underscores, hyphens and curly brackets are allowed"
    )]
    InvalidNamingTemplate {
        /// The offending template string
        template: String,
    },

    /// A naming template referenced a placeholder outside the closed set for
    /// its resource kind. Rejected at template-resolution time so that
    /// misconfiguration fails fast, before any substitution happens.
    #[error("unknown placeholder '{{{placeholder}}}' in naming template '{template}'")]
    UnknownPlaceholder {
        /// The unrecognized placeholder name
        placeholder: String,
        /// The template it appeared in
        template: String,
    },

    /// A per-resource naming config had neither an entry for the requested
    /// environment nor an `other` fallback.
    #[error("naming config for '{resource}' has no entry for '{env}' and no 'other' fallback")]
    MissingNamingBucket {
        /// Resource kind being named
        resource: String,
        /// Environment that was looked up
        env: String,
    },

    /// Pipeline config did not define a schema.
    #[error("schema must be defined in pipeline config")]
    MissingSchema,

    /// A job task declared `serverless: true` together with a cluster
    /// reference, which makes the execution target ambiguous.
    #[error(
        "task '{task_key}' specifies both serverless and a cluster reference; \
         remove either the cluster specification or the serverless statement"
    )]
    AmbiguousClusterReference {
        /// Key of the offending task
        task_key: String,
    },

    /// A job task had no execution target at all.
    #[error(
        "task '{task_key}' has no cluster reference \
         (job_cluster_key, existing_cluster_name, existing_cluster_id or serverless)"
    )]
    MissingClusterReference {
        /// Key of the offending task
        task_key: String,
    },

    /// A `job_cluster_key` did not match any entry in the cluster-template table.
    #[error("no cluster template registered for key '{key}'")]
    UnknownClusterTemplate {
        /// The unmatched template key
        key: String,
    },

    /// An `existing_cluster_name` could not be resolved to a cluster id.
    #[error("cluster '{name}' not found in workspace")]
    ClusterNotFound {
        /// The cluster name that was looked up
        name: String,
    },

    /// A named resource required by an operation does not exist.
    #[error("{kind} '{name}' not found")]
    ResourceNotFound {
        /// Resource kind ("job", "pipeline")
        kind: &'static str,
        /// The name that was looked up
        name: String,
    },

    /// Platform API failure, wrapped with the failing HTTP verb.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// I/O error reading a config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML config could not be parsed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LakeopsError {
    /// Shorthand for an [`LakeopsError::InvalidArgument`] with a formatted message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }
}
