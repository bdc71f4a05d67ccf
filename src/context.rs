//! Workspace identity context and environment detection.
//!
//! [`WorkspaceContext`] is a snapshot of the runtime identity a deploy or
//! naming call operates under: API endpoint and token, notebook path,
//! username and the widget parameters passed to the notebook. It is built
//! once at the entry point and passed down by reference, which keeps the
//! naming core free of any runtime-handle discovery.
//!
//! Environment detection lives here too: [`Env::detect`] decides whether a
//! call runs as `test`, `dev` or `prod` from the `pipeline_env` widget and
//! the shape of the username.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::core::{LakeopsError, Result};

/// Widget key that overrides environment detection.
pub const PIPELINE_ENV_WIDGET: &str = "pipeline_env";

/// Immutable snapshot of the workspace identity a call operates under.
///
/// `is_service_principal` is derived at construction time: service principals
/// are identified by a username without an `@` character (human users are
/// always email-shaped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceContext {
    /// Base URL of the platform REST API, empty when unavailable.
    pub api_url: String,
    /// Bearer token for the API.
    pub api_token: String,
    /// Full workspace path of the current notebook.
    pub notebook_path: String,
    /// Identity the call runs as; an email for humans.
    pub username: String,
    /// Widget parameters passed to the notebook.
    pub widgets: HashMap<String, String>,
    /// Whether the identity is a service principal.
    pub is_service_principal: bool,
}

impl WorkspaceContext {
    /// Build a context, deriving `is_service_principal` from the username shape.
    pub fn new(
        api_url: impl Into<String>,
        api_token: impl Into<String>,
        notebook_path: impl Into<String>,
        username: impl Into<String>,
        widgets: HashMap<String, String>,
    ) -> Self {
        let username = username.into();
        let is_service_principal = !username.contains('@');
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
            notebook_path: notebook_path.into(),
            username,
            widgets,
            is_service_principal,
        }
    }

    /// Override the derived service-principal flag. Intended for tests.
    #[must_use]
    pub fn with_service_principal(mut self, is_service_principal: bool) -> Self {
        self.is_service_principal = is_service_principal;
        self
    }

    /// Build a context from process environment variables.
    ///
    /// This is the single documented factory for non-notebook use (CLI,
    /// scripts): `LAKEOPS_API_URL` (or `DATABRICKS_HOST`),
    /// `LAKEOPS_API_TOKEN` (or `DATABRICKS_TOKEN`), `LAKEOPS_NOTEBOOK_PATH`
    /// and `LAKEOPS_USERNAME`. Missing variables yield empty fields, which
    /// downstream code treats as "not available" rather than an error.
    pub fn from_env(widgets: HashMap<String, String>) -> Self {
        let var = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .unwrap_or_default()
        };
        Self::new(
            var(&["LAKEOPS_API_URL", "DATABRICKS_HOST"]),
            var(&["LAKEOPS_API_TOKEN", "DATABRICKS_TOKEN"]),
            var(&["LAKEOPS_NOTEBOOK_PATH"]),
            var(&["LAKEOPS_USERNAME"]),
            widgets,
        )
    }

    /// Return a widget value, treating missing and empty as absent.
    pub fn widget(&self, key: &str) -> Option<&str> {
        self.widgets.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Username stripped to the form used in resource names: the local part
    /// of an email-shaped username with `.` and `-` removed.
    pub fn short_username(&self) -> String {
        self.username
            .split('@')
            .next()
            .unwrap_or_default()
            .replace(['.', '-'], "")
    }
}

/// Deployment environment. A closed set; anything else is an input error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Env {
    /// Developer test runs (the default for human identities).
    Test,
    /// Shared development.
    Dev,
    /// Production.
    Prod,
}

impl Env {
    /// String form used in names, tags and template buckets.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Whether this is the production environment.
    pub fn is_prod(self) -> bool {
        matches!(self, Self::Prod)
    }

    /// Detect the environment for a context.
    ///
    /// A non-empty `pipeline_env` widget always wins. Without it, a username
    /// containing `@` means a human identity running interactively, which is
    /// treated as `test`; anything else (service principals) defaults to
    /// `prod`.
    pub fn detect(context: &WorkspaceContext) -> Result<Self> {
        if let Some(value) = context.widget(PIPELINE_ENV_WIDGET) {
            return value.parse();
        }
        if context.username.contains('@') {
            return Ok(Self::Test);
        }
        Ok(Self::Prod)
    }
}

impl FromStr for Env {
    type Err = LakeopsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "test" => Ok(Self::Test),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(LakeopsError::invalid_argument(format!(
                "env must be 'test', 'dev' or 'prod', not '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
