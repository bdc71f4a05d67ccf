//! Naming templates with a closed placeholder set.
//!
//! Every resource kind has a naming template per environment bucket, either
//! from the external config (see [`crate::mesh::cfg`]) or from the built-in
//! defaults below. Templates are plain strings with `{placeholder}` tokens:
//!
//! ```text
//! {env}_{username}_{gitbranch}_{gitshortref}_{db}
//! ```
//!
//! The placeholder set is closed per resource kind: the shared path,
//! environment, identity and git placeholders, plus the kind's own key
//! (`{db}` for schemas). Unknown placeholders are rejected when the template
//! is resolved, not when it is substituted, so a misconfigured repo fails
//! fast instead of failing on the first deploy that happens to hit the bad
//! bucket.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{LakeopsError, Result};
use crate::mesh::cfg::ConfigLoader;

/// Placeholders available to every resource kind.
pub const SHARED_PLACEHOLDERS: [&str; 10] = [
    "org",
    "domain",
    "project",
    "activity",
    "flowtype",
    "flow",
    "env",
    "username",
    "gitbranch",
    "gitshortref",
];

/// Bucket key used when a config has no entry for the concrete environment.
const OTHER_BUCKET: &str = "other";

static TEMPLATE_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w{}\-]+$").expect("valid regex"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid regex"));

/// Resource kinds that carry a naming template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Workflow job.
    Job,
    /// DLT pipeline.
    Pipeline,
    /// Catalog.
    Catalog,
    /// Schema (database).
    Db,
}

impl ResourceKind {
    /// Key used in config files and as the kind's own placeholder.
    pub fn key(self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Pipeline => "pipeline",
            Self::Catalog => "catalog",
            Self::Db => "db",
        }
    }

    fn default_template(self, prod: bool) -> &'static str {
        match (self, prod) {
            (Self::Job, true) => "{domain}_{project}_{env}",
            (Self::Job, false) => "{domain}_{project}_{env}_{username}_{gitbranch}_{gitshortref}",
            (Self::Pipeline, true) => "{domain}_{project}_{env}_dlt",
            (Self::Pipeline, false) => {
                "{domain}_{project}_{env}_{username}_{gitbranch}_{gitshortref}_dlt"
            }
            (Self::Catalog, _) => "{domain}",
            (Self::Db, true) => "{db}",
            (Self::Db, false) => "{env}_{username}_{gitbranch}_{gitshortref}_{db}",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = LakeopsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "job" => Ok(Self::Job),
            "pipeline" => Ok(Self::Pipeline),
            "catalog" => Ok(Self::Catalog),
            "db" => Ok(Self::Db),
            other => Err(LakeopsError::invalid_argument(format!(
                "unknown resource kind '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Resolve the naming template for a resource kind and environment.
///
/// Looks up the external config first, falling back to the built-in default
/// table. Within the per-kind mapping the entry keyed by `env` wins, else
/// the `other` bucket. The selected template is validated before being
/// returned.
pub fn resolve(loader: &ConfigLoader, kind: ResourceKind, env: &str) -> Result<String> {
    let template = match loader.naming(kind.key()) {
        Some(buckets) => buckets
            .get(env)
            .or_else(|| buckets.get(OTHER_BUCKET))
            .ok_or_else(|| LakeopsError::MissingNamingBucket {
                resource: kind.key().to_string(),
                env: env.to_string(),
            })?
            .clone(),
        None => kind.default_template(env == "prod").to_string(),
    };
    validate(kind, &template)?;
    Ok(template)
}

/// Validate a template's character set and placeholder names.
pub fn validate(kind: ResourceKind, template: &str) -> Result<()> {
    if !TEMPLATE_CHARSET.is_match(template) {
        return Err(LakeopsError::InvalidNamingTemplate { template: template.to_string() });
    }
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if name != kind.key() && !SHARED_PLACEHOLDERS.contains(&name) {
            return Err(LakeopsError::UnknownPlaceholder {
                placeholder: name.to_string(),
                template: template.to_string(),
            });
        }
    }
    Ok(())
}

/// Substitute every `{name}` token from the value map.
///
/// A placeholder missing from the map is fatal; unused map entries are
/// ignored.
pub fn compose(template: &str, values: &HashMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(token) = caps.get(0) else { continue };
        let name = &caps[1];
        let value = values.get(name).ok_or_else(|| LakeopsError::UnknownPlaceholder {
            placeholder: name.to_string(),
            template: template.to_string(),
        })?;
        out.push_str(&template[last..token.start()]);
        out.push_str(value);
        last = token.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
