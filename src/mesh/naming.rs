//! Name composition for tables, schemas, catalogs, jobs and pipelines.
//!
//! [`Namer`] orchestrates the path grammar, the naming templates and the
//! git/identity state into final names. All operations are deterministic
//! functions of the workspace context, the loaded config and the injected
//! git state; nothing here touches the network.
//!
//! Name shapes with the default templates:
//!
//! - prod: `catalog.db.table`, `domain_project_prod`
//! - elsewhere: `catalog.env_user_branch_shortref_db.table`,
//!   `domain_project_env_user_branch_shortref`
//!
//! so a developer's table writes land next to production ones but in a
//! schema whose name pins the who/what/where of the deployment.

use std::collections::HashMap;

use crate::api::PlatformApi;
use crate::context::{Env, WorkspaceContext};
use crate::core::{LakeopsError, Result};
use crate::gitinfo::{self, GitSourceInfo, clean_branch, commit_shortref};
use crate::mesh::cfg::ConfigLoader;
use crate::mesh::parsepath::{self, ParsedPath};
use crate::mesh::template::{self, ResourceKind, SHARED_PLACEHOLDERS};

/// Identity and git state a naming call runs under. Derived per call,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    /// Short username (local part, punctuation stripped).
    pub username: String,
    /// Cleaned branch name (alphanumerics only).
    pub gitbranch: String,
    /// First 8 characters of the commit hash.
    pub gitshortref: String,
    /// Resolved environment.
    pub env: Env,
}

/// Escape a dotted SQL name segment-wise.
///
/// Each dot-separated segment containing a Norwegian character (æ, ø, å) is
/// wrapped in backticks; segments that already carry backticks pass through
/// unchanged, so escaping is idempotent.
pub fn escape_sql_name(name: &str) -> String {
    name.split('.')
        .map(|part| {
            if part.contains('`') {
                part.to_string()
            } else {
                escape_norwegian_chars(part)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn escape_norwegian_chars(part: &str) -> String {
    if part.chars().any(|c| matches!(c, 'æ' | 'ø' | 'å')) {
        format!("`{part}`")
    } else {
        part.to_string()
    }
}

/// Composes final resource names for one workspace context.
#[derive(Debug, Clone)]
pub struct Namer<'a> {
    context: &'a WorkspaceContext,
    loader: &'a ConfigLoader,
    git: GitSourceInfo,
}

impl<'a> Namer<'a> {
    /// Build a namer over already-resolved git state.
    pub fn new(context: &'a WorkspaceContext, loader: &'a ConfigLoader, git: GitSourceInfo) -> Self {
        Self { context, loader, git }
    }

    /// Build a namer, resolving git state through the platform API
    /// (with widget overrides applied on top).
    pub fn with_api(
        context: &'a WorkspaceContext,
        loader: &'a ConfigLoader,
        api: &dyn PlatformApi,
    ) -> Self {
        Self::new(context, loader, gitinfo::git_source(context, api))
    }

    /// Build a namer from widget-supplied git state alone.
    pub fn offline(context: &'a WorkspaceContext, loader: &'a ConfigLoader) -> Self {
        Self::new(context, loader, gitinfo::git_source_offline(context))
    }

    /// The resolved git state this namer composes from.
    pub fn git(&self) -> &GitSourceInfo {
        &self.git
    }

    /// Fully qualified, escaped table name: `catalog.schema.table`.
    ///
    /// When `cat` is not given it is derived from the notebook path. The
    /// schema segment carries the env/user/branch/shortref prefix outside
    /// production (per the `db` naming template).
    pub fn tablename(
        &self,
        tbl: &str,
        db: &str,
        cat: Option<&str>,
        env: Option<Env>,
    ) -> Result<String> {
        require_non_empty("tbl", tbl)?;
        require_non_empty("db", db)?;
        let cat = match cat {
            Some(cat) => cat.to_string(),
            None => self.catalog_from_path(env)?,
        };
        let db_name = self.dbname(db, &cat, true, env)?;
        Ok(escape_sql_name(&format!("{db_name}.{tbl}")))
    }

    /// Escaped schema (database) name, prefixed with the catalog unless
    /// suppressed via `prepend_cat`.
    pub fn dbname(&self, db: &str, cat: &str, prepend_cat: bool, env: Option<Env>) -> Result<String> {
        require_non_empty("db", db)?;
        let env = self.resolve_env(env)?;
        let template = template::resolve(self.loader, ResourceKind::Db, env.as_str())?;
        // Outside the mesh structure the path fields are simply empty; the
        // default db templates do not reference them.
        let parsed = self.parse_notebook_path();
        let pipeline_context = self.pipeline_context(env);
        let values = placeholder_values(&parsed, &pipeline_context, Some(("db", db)));
        let name = template::compose(&template, &values)?;
        let name = if prepend_cat { format!("{cat}.{name}") } else { name };
        Ok(escape_sql_name(&name))
    }

    /// Escaped catalog name derived from the notebook path; empty when the
    /// notebook lives outside the mesh structure.
    pub fn catalog_from_path(&self, env: Option<Env>) -> Result<String> {
        Ok(escape_sql_name(&self.name_from_path(ResourceKind::Catalog, env)?))
    }

    /// Job name derived from the notebook path; empty outside the mesh.
    pub fn jobname(&self, env: Option<Env>) -> Result<String> {
        self.name_from_path(ResourceKind::Job, env)
    }

    /// Pipeline name derived from the notebook path; empty outside the mesh.
    pub fn pipelinename(&self, env: Option<Env>) -> Result<String> {
        self.name_from_path(ResourceKind::Pipeline, env)
    }

    /// Compose the name for a path-rooted resource kind.
    ///
    /// Returns the empty string when the base path grammar does not match,
    /// so callers can operate gracefully outside the mesh folder structure.
    pub fn name_from_path(&self, kind: ResourceKind, env: Option<Env>) -> Result<String> {
        let env = self.resolve_env(env)?;
        let parsed = self.parse_notebook_path();
        if parsed.is_empty() {
            return Ok(String::new());
        }
        let template = template::resolve(self.loader, kind, env.as_str())?;
        let pipeline_context = self.pipeline_context(env);
        let values = placeholder_values(&parsed, &pipeline_context, Some((kind.key(), "")));
        template::compose(&template, &values)
    }

    fn resolve_env(&self, env: Option<Env>) -> Result<Env> {
        match env {
            Some(env) => Ok(env),
            None => Env::detect(self.context),
        }
    }

    fn parse_notebook_path(&self) -> ParsedPath {
        if self.loader.fullmesh() {
            parsepath::parse(&self.context.notebook_path, true)
        } else {
            parsepath::parse_auto(&self.context.notebook_path)
        }
    }

    fn pipeline_context(&self, env: Env) -> PipelineContext {
        PipelineContext {
            username: self.context.short_username(),
            gitbranch: clean_branch(self.git.branch()),
            gitshortref: commit_shortref(self.git.commit()),
            env,
        }
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LakeopsError::invalid_argument(format!(
            "{name} must be a non-empty string"
        )));
    }
    Ok(())
}

fn placeholder_values(
    parsed: &ParsedPath,
    pipeline_context: &PipelineContext,
    own: Option<(&'static str, &str)>,
) -> HashMap<&'static str, String> {
    let mut values: HashMap<&'static str, String> = HashMap::new();
    for key in SHARED_PLACEHOLDERS {
        let value = match key {
            "env" => pipeline_context.env.as_str().to_string(),
            "username" => pipeline_context.username.clone(),
            "gitbranch" => pipeline_context.gitbranch.clone(),
            "gitshortref" => pipeline_context.gitshortref.clone(),
            field => parsed.field(field).to_string(),
        };
        values.insert(key, value);
    }
    if let Some((key, value)) = own {
        values.insert(key, value.to_string());
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::cfg::ConfigFile;

    const MESH_PATH: &str =
        "/Repos/test@vlfk.no/dp-notebooks/domains/domainfoo/projects/projectfoo/flows/prep/flowfoo";

    fn widgets(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn test_context() -> WorkspaceContext {
        WorkspaceContext::new(
            "",
            "token",
            MESH_PATH,
            "TestUser@vlfk.no",
            widgets(&[
                ("git_url", "git_url"),
                ("git_branch", "git_branch"),
                ("git_commit", "abcdefgh123"),
                ("pipeline_env", "test"),
            ]),
        )
    }

    fn api_git_source() -> GitSourceInfo {
        GitSourceInfo {
            git_url: Some("api_sourced_url".to_string()),
            git_provider: Some("api_sourced_provider".to_string()),
            git_branch: Some("apisourcedbranch".to_string()),
            git_commit: Some("apidefgh".to_string()),
            git_path: Some("api_sourced_path".to_string()),
        }
    }

    /// Naming config referencing the full mesh hierarchy, org included.
    fn fullmesh_loader() -> ConfigLoader {
        let buckets = |prod: &str, other: &str| {
            HashMap::from([
                ("prod".to_string(), prod.to_string()),
                ("other".to_string(), other.to_string()),
            ])
        };
        let naming = HashMap::from([
            (
                "job".to_string(),
                buckets(
                    "{org}_{domain}_{project}_{flow}_{env}",
                    "{org}_{domain}_{project}_{flow}_{env}_{username}_{gitbranch}_{gitshortref}",
                ),
            ),
            (
                "db".to_string(),
                buckets(
                    "{db}",
                    "{env}_{username}_{gitbranch}_{gitshortref}_{activity}_{flowtype}_{flow}_{db}",
                ),
            ),
            ("catalog".to_string(), buckets("{domain}", "{domain}")),
        ]);
        ConfigLoader::from_config(ConfigFile { naming, fullmesh: false })
    }

    #[test]
    fn test_escape_sql_name_wraps_norwegian_segments() {
        assert_eq!(escape_sql_name("træning.test_db"), "`træning`.test_db");
        assert_eq!(escape_sql_name("plain.name"), "plain.name");
    }

    #[test]
    fn test_escape_sql_name_is_idempotent() {
        let once = escape_sql_name("træning.test_tøbbel");
        let twice = escape_sql_name(&once);
        assert_eq!(once, twice);
        assert_eq!(twice, "`træning`.`test_tøbbel`");
    }

    #[test]
    fn test_tablename_in_test_contains_user_and_branch() {
        let mut ctx = test_context();
        ctx.widgets.insert("git_branch".to_string(), "feat/new_branch".to_string());
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.tablename("test_tbl", "test_db", Some("training"), None).unwrap();
        assert_eq!(result, "training.test_TestUser_featnewbranch_abcdefgh_test_db.test_tbl");
    }

    #[test]
    fn test_tablename_in_prod_does_not_contain_user_and_branch() {
        let mut ctx = test_context();
        ctx.username = "ServicePrincipalName".to_string();
        // pipeline_env=test would override the username-based detection
        ctx.widgets.remove("pipeline_env");
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.tablename("test_tbl", "test_db", Some("training"), None).unwrap();
        assert_eq!(result, "training.test_db.test_tbl");
    }

    #[test]
    fn test_tablename_with_api_sourced_git_and_short_path() {
        let ctx = WorkspaceContext::new(
            "",
            "token",
            "/Users/test@vlfk.no/databricks-dataops-course/course/01-Student-Prep/01-General/1-CreateDatabaseObjects",
            "userfoo@vlfk.no",
            widgets(&[]),
        );
        let loader = ConfigLoader::empty();
        let namer = Namer::new(&ctx, &loader, api_git_source());
        let result = namer.tablename("tblfoo", "dbfoo", Some("training"), None).unwrap();
        assert_eq!(result, "training.test_userfoo_apisourcedbranch_apidefgh_dbfoo.tblfoo");
    }

    #[test]
    fn test_dbname_with_api_sourced_git_and_short_path() {
        let ctx = WorkspaceContext::new(
            "",
            "token",
            "/Users/test@vlfk.no/databricks-dataops-course/course/01-Student-Prep/01-General/1-CreateDatabaseObjects",
            "userfoo@vlfk.no",
            widgets(&[]),
        );
        let loader = ConfigLoader::empty();
        let namer = Namer::new(&ctx, &loader, api_git_source());
        let result = namer.dbname("dbfoo", "training", true, None).unwrap();
        assert_eq!(result, "training.test_userfoo_apisourcedbranch_apidefgh_dbfoo");
    }

    #[test]
    fn test_tablename_with_norwegian_characters_in_table() {
        let mut ctx = test_context();
        ctx.username = "ServicePrincipal".to_string();
        ctx.widgets.remove("pipeline_env");
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.tablename("test_tøbbel", "test_db", Some("training"), None).unwrap();
        assert_eq!(result, "training.test_db.`test_tøbbel`");
    }

    #[test]
    fn test_tablename_with_norwegian_characters_in_catalog_and_table() {
        let mut ctx = test_context();
        ctx.username = "ServicePrincipal".to_string();
        ctx.widgets.remove("pipeline_env");
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.tablename("test_tøbbel", "test_db", Some("træning"), None).unwrap();
        assert_eq!(result, "`træning`.test_db.`test_tøbbel`");
    }

    #[test]
    fn test_full_dbname_for_plain_branch_names() {
        for branch in ["pr122", "averylongbranchname"] {
            let mut ctx = test_context();
            ctx.widgets.insert("git_branch".to_string(), branch.to_string());
            let loader = ConfigLoader::empty();
            let namer = Namer::offline(&ctx, &loader);
            let result = namer.dbname("test_db", "training", true, None).unwrap();
            assert_eq!(result, format!("training.test_TestUser_{branch}_abcdefgh_test_db"));
        }
    }

    #[test]
    fn test_branch_name_with_slash_is_stripped() {
        let mut ctx = test_context();
        ctx.widgets.insert("git_branch".to_string(), "feature/branch".to_string());
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.dbname("test_db", "training", true, None).unwrap();
        assert_eq!(result, "training.test_TestUser_featurebranch_abcdefgh_test_db");
    }

    #[test]
    fn test_branch_name_with_underscores_is_stripped() {
        let mut ctx = test_context();
        ctx.widgets.insert("git_branch".to_string(), "feature_of_something_branch".to_string());
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.dbname("test_db", "training", true, None).unwrap();
        assert_eq!(result, "training.test_TestUser_featureofsomethingbranch_abcdefgh_test_db");
    }

    #[test]
    fn test_dbname_with_norwegian_characters_in_catalog() {
        let ctx = test_context();
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.dbname("test_db", "en_liten_ø", true, None).unwrap();
        assert_eq!(result, "`en_liten_ø`.test_TestUser_gitbranch_abcdefgh_test_db");
    }

    #[test]
    fn test_dbname_with_fullmesh_naming_config() {
        let mut ctx = test_context();
        ctx.widgets.insert("git_branch".to_string(), "feature/branch".to_string());
        let loader = fullmesh_loader();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.dbname("test_db", "training", true, None).unwrap();
        assert_eq!(
            result,
            "training.test_TestUser_featurebranch_abcdefgh_flows_prep_flowfoo_test_db"
        );
    }

    #[test]
    fn test_name_from_path_for_catalog_in_prod() {
        let ctx = test_context();
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let cat = namer.name_from_path(ResourceKind::Catalog, Some(Env::Prod)).unwrap();
        assert_eq!(cat, "domainfoo");
    }

    #[test]
    fn test_catalog_from_path_outside_mesh_is_empty() {
        let ctx = WorkspaceContext::new("", "token", "/Users/u@x.no/scratch/notebook", "u@x.no", widgets(&[]));
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        assert_eq!(namer.catalog_from_path(Some(Env::Prod)).unwrap(), "");
        assert_eq!(namer.jobname(Some(Env::Prod)).unwrap(), "");
    }

    #[test]
    fn test_catalog_from_path_missing_projects_segment_is_empty() {
        let ctx = WorkspaceContext::new(
            "",
            "token",
            "something/domains/projects/test_project/flows/test_flow/test_notebook",
            "u@x.no",
            widgets(&[]),
        );
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        assert_eq!(namer.catalog_from_path(None).unwrap(), "");
    }

    #[test]
    fn test_jobname() {
        let ctx = test_context();
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.jobname(Some(Env::Test)).unwrap();
        assert_eq!(result, "domainfoo_projectfoo_test_TestUser_gitbranch_abcdefgh");
    }

    #[test]
    fn test_pipelinename() {
        let ctx = test_context();
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.pipelinename(Some(Env::Test)).unwrap();
        assert_eq!(result, "domainfoo_projectfoo_test_TestUser_gitbranch_abcdefgh_dlt");
    }

    #[test]
    fn test_jobname_with_org_path_and_fullmesh_naming_config() {
        let mut ctx = test_context();
        ctx.username = "service_principal".to_string();
        ctx.widgets.remove("pipeline_env");
        ctx.notebook_path =
            "/Repos/test@vlfk.no/dp-notebooks/something/orgs/acme/domains/domainfoo/projects/projectfoo/flows/prep/taskfoo"
                .to_string();
        let loader = fullmesh_loader();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.jobname(Some(Env::Prod)).unwrap();
        assert_eq!(result, "acme_domainfoo_projectfoo_taskfoo_prod");
    }

    #[test]
    fn test_tablename_rejects_empty_arguments() {
        let ctx = test_context();
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        assert!(namer.tablename("", "db", Some("cat"), None).is_err());
        assert!(namer.tablename("tbl", "", Some("cat"), None).is_err());
        assert!(namer.dbname("", "cat", true, None).is_err());
    }

    #[test]
    fn test_env_from_widget_overrides_prod_username() {
        // service principal would default to prod, the widget forces test
        let mut ctx = test_context();
        ctx.username = "service_principal".to_string();
        let loader = ConfigLoader::empty();
        let namer = Namer::offline(&ctx, &loader);
        let result = namer.dbname("test_db", "training", true, None).unwrap();
        assert_eq!(result, "training.test_service_principal_gitbranch_abcdefgh_test_db");
    }
}
