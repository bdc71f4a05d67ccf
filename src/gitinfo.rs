//! Git state resolution.
//!
//! Deployment names embed git state (branch, short commit ref) so that every
//! non-production deployment is traceable to the commit that produced it.
//! The state comes from two places: the platform repos API (looked up by
//! notebook-path prefix) and widget parameters passed to the notebook.
//! Widget values always win.
//!
//! Absence of git context must never abort a build: an unreachable API, a
//! notebook outside any linked repository, or an empty `api_url` all degrade
//! to an empty [`GitSourceInfo`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::PlatformApi;
use crate::context::WorkspaceContext;

/// Widget keys that override API-sourced git fields.
const GIT_WIDGET_KEYS: [&str; 4] = ["git_url", "git_branch", "git_commit", "git_path"];

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\W_]+").expect("valid regex"));

/// Git source information for the repository a notebook lives in.
///
/// All fields are optional; `None` values are omitted when serialized into a
/// job payload, so an empty record serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSourceInfo {
    /// Remote URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,
    /// Git provider name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_provider: Option<String>,
    /// Checked-out branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Commit hash of the checked-out head.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    /// Workspace path of the repository root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_path: Option<String>,
}

impl GitSourceInfo {
    /// Branch name, empty when unknown.
    pub fn branch(&self) -> &str {
        self.git_branch.as_deref().unwrap_or_default()
    }

    /// Commit hash, empty when unknown.
    pub fn commit(&self) -> &str {
        self.git_commit.as_deref().unwrap_or_default()
    }

    /// Repository root path, empty when unknown.
    pub fn path(&self) -> &str {
        self.git_path.as_deref().unwrap_or_default()
    }

    /// Remote URL, empty when unknown.
    pub fn url(&self) -> &str {
        self.git_url.as_deref().unwrap_or_default()
    }

    /// Whether any field is populated.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay non-empty widget values on top of this record.
    ///
    /// Widget parameters take precedence over API-sourced state for every
    /// field they set; empty widget values are treated as absent.
    #[must_use]
    pub fn merged_with_widgets(mut self, widgets: &HashMap<String, String>) -> Self {
        let pick = |key: &str| widgets.get(key).filter(|value| !value.is_empty()).cloned();
        for key in GIT_WIDGET_KEYS {
            let Some(value) = pick(key) else { continue };
            match key {
                "git_url" => self.git_url = Some(value),
                "git_branch" => self.git_branch = Some(value),
                "git_commit" => self.git_commit = Some(value),
                "git_path" => self.git_path = Some(value),
                _ => unreachable!(),
            }
        }
        self
    }
}

/// Resolve git source information for the current notebook.
///
/// Queries the repos API for the first repository whose path is a prefix of
/// the notebook path, then overlays widget overrides. Every failure mode
/// degrades to widget-only (possibly empty) state.
pub fn git_source(context: &WorkspaceContext, api: &dyn PlatformApi) -> GitSourceInfo {
    git_source_from_api(context, api).merged_with_widgets(&context.widgets)
}

/// Resolve git source information from widgets alone, without touching the
/// API. Useful where no API endpoint is configured.
pub fn git_source_offline(context: &WorkspaceContext) -> GitSourceInfo {
    GitSourceInfo::default().merged_with_widgets(&context.widgets)
}

fn git_source_from_api(context: &WorkspaceContext, api: &dyn PlatformApi) -> GitSourceInfo {
    if context.api_url.is_empty() {
        return GitSourceInfo::default();
    }
    let repos = match api.repos() {
        Ok(repos) => repos,
        Err(err) => {
            warn!("failed while getting git information from api: {err}");
            return GitSourceInfo::default();
        }
    };
    let Some(repo) = repos
        .into_iter()
        .find(|repo| context.notebook_path.starts_with(&repo.path))
    else {
        info!("repo does not exist or user does not have access to git information");
        return GitSourceInfo::default();
    };
    GitSourceInfo {
        git_url: Some(repo.url),
        git_provider: Some(repo.provider),
        git_branch: Some(repo.branch.unwrap_or_default()),
        git_commit: Some(repo.head_commit_id),
        git_path: Some(repo.path),
    }
}

/// Strip anything but alphanumerics from a branch name.
pub fn clean_branch(branch: &str) -> String {
    NON_ALPHANUMERIC.replace_all(branch, "").into_owned()
}

/// First 8 characters of a commit hash.
pub fn commit_shortref(commit: &str) -> String {
    commit.chars().take(8).collect()
}
