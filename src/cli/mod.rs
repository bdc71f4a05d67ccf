//! Command-line interface.
//!
//! The CLI exposes the same operations a deploy notebook calls as library
//! functions:
//!
//! ```bash
//! # Deploy the job/pipeline defined in ./deployment.yml
//! lakeops deploy job
//! lakeops deploy pipeline --env prod
//!
//! # Run an already-deployed resource by name
//! lakeops run job transport_taxinyc_prod
//!
//! # Delete this user's dev jobs and schemas
//! lakeops cleanup jobs
//! lakeops cleanup schemas --dry-run
//!
//! # Inspect derived names without deploying anything
//! lakeops name table --table revenue --db gold
//! ```
//!
//! Workspace identity comes from flags or the environment
//! (`DATABRICKS_HOST`, `DATABRICKS_TOKEN`, `LAKEOPS_NOTEBOOK_PATH`,
//! `LAKEOPS_USERNAME`); widget-style overrides are passed as repeated
//! `--var key=value` flags.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::api::ApiClient;
use crate::context::{Env, WorkspaceContext};
use crate::deploy::{self, DeployOutcome};
use crate::mesh::cfg::ConfigLoader;
use crate::mesh::naming::Namer;
use crate::ops;

/// Top-level CLI definition.
#[derive(Parser)]
#[command(
    name = "lakeops",
    version,
    about = "Deployment automation for lakehouse jobs, pipelines and data-mesh naming"
)]
pub struct Cli {
    #[command(flatten)]
    workspace: WorkspaceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct WorkspaceArgs {
    /// Workspace API URL
    #[arg(long, env = "DATABRICKS_HOST", default_value = "", global = true)]
    host: String,

    /// Workspace API token
    #[arg(
        long,
        env = "DATABRICKS_TOKEN",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    token: String,

    /// Workspace path of the deploy notebook
    #[arg(long, env = "LAKEOPS_NOTEBOOK_PATH", default_value = "", global = true)]
    notebook_path: String,

    /// Identity to run as
    #[arg(long, env = "LAKEOPS_USERNAME", default_value = "", global = true)]
    username: String,

    /// Widget-style override, e.g. --var git_branch=main (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", global = true)]
    vars: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a resource defined in a deployment config
    Deploy {
        #[command(subcommand)]
        resource: DeployCommand,
    },
    /// Run an already-deployed resource by name
    Run {
        #[command(subcommand)]
        resource: RunCommand,
    },
    /// Delete this user's non-production resources
    Cleanup {
        #[command(subcommand)]
        target: CleanupCommand,
    },
    /// Print derived resource names without deploying
    Name {
        #[command(subcommand)]
        resource: NameCommand,
    },
}

#[derive(Subcommand)]
enum DeployCommand {
    /// Deploy a job
    Job {
        /// Deployment config file
        #[arg(long, default_value = "deployment.yml")]
        config: PathBuf,
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
    /// Deploy a pipeline
    Pipeline {
        /// Deployment config file
        #[arg(long, default_value = "deployment.yml")]
        config: PathBuf,
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
}

#[derive(Subcommand)]
enum RunCommand {
    /// Run a job by name
    Job {
        /// Job name
        name: String,
    },
    /// Run a pipeline by name
    Pipeline {
        /// Pipeline name
        name: String,
    },
}

#[derive(Subcommand)]
enum CleanupCommand {
    /// Delete jobs tagged with this user's deployments
    Jobs {
        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete schemas carrying this user's name
    Schemas {
        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum NameCommand {
    /// Fully qualified table name
    Table {
        /// Table name
        #[arg(long)]
        table: String,
        /// Schema (database) name
        #[arg(long)]
        db: String,
        /// Catalog name (derived from the notebook path when omitted)
        #[arg(long)]
        catalog: Option<String>,
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
    /// Schema (database) name
    Db {
        /// Schema (database) name
        #[arg(long)]
        db: String,
        /// Catalog name
        #[arg(long)]
        catalog: String,
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
    /// Catalog name derived from the notebook path
    Catalog {
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
    /// Job name derived from the notebook path
    Job {
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
    /// Pipeline name derived from the notebook path
    Pipeline {
        /// Target environment (detected when omitted)
        #[arg(long)]
        env: Option<String>,
    },
}

impl Cli {
    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        let context = self.workspace.to_context()?;
        let loader = ConfigLoader::discover()?;

        match self.command {
            Command::Deploy { resource } => {
                let api = ApiClient::from_context(&context)?;
                let outcome = match resource {
                    DeployCommand::Job { config, env } => {
                        deploy::deploy_job(&context, &api, &loader, &config, parse_env(env)?)?
                    }
                    DeployCommand::Pipeline { config, env } => {
                        deploy::deploy_pipeline(&context, &api, &loader, &config, parse_env(env)?)?
                    }
                };
                print_outcome(&outcome)?;
            }
            Command::Run { resource } => {
                let api = ApiClient::from_context(&context)?;
                let response = match resource {
                    RunCommand::Job { name } => ops::job::run_job_by_name(&api, &name)?,
                    RunCommand::Pipeline { name } => {
                        ops::pipeline::run_pipeline_by_name(&api, &name)?
                    }
                };
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Command::Cleanup { target } => {
                let api = ApiClient::from_context(&context)?;
                match target {
                    CleanupCommand::Jobs { dry_run } => {
                        let jobs = ops::cleanup::deployed_jobs_for_user(&api, &context)?;
                        for job in &jobs {
                            println!("{} (job_id={})", job.name, job.id);
                        }
                        if !dry_run {
                            ops::cleanup::delete_jobs(&api, &jobs)?;
                        }
                    }
                    CleanupCommand::Schemas { dry_run } => {
                        let schemas = ops::cleanup::schemas_for_user(&api, &context)?;
                        for schema in &schemas {
                            println!("{schema}");
                            if !dry_run {
                                ops::cleanup::delete_schema(&api, schema)?;
                            }
                        }
                    }
                }
            }
            Command::Name { resource } => {
                let namer = if context.api_url.is_empty() {
                    Namer::offline(&context, &loader)
                } else {
                    let api = ApiClient::from_context(&context)?;
                    Namer::with_api(&context, &loader, &api)
                };
                let name = match resource {
                    NameCommand::Table { table, db, catalog, env } => {
                        namer.tablename(&table, &db, catalog.as_deref(), parse_env(env)?)?
                    }
                    NameCommand::Db { db, catalog, env } => {
                        namer.dbname(&db, &catalog, true, parse_env(env)?)?
                    }
                    NameCommand::Catalog { env } => namer.catalog_from_path(parse_env(env)?)?,
                    NameCommand::Job { env } => namer.jobname(parse_env(env)?)?,
                    NameCommand::Pipeline { env } => namer.pipelinename(parse_env(env)?)?,
                };
                println!("{name}");
            }
        }
        Ok(())
    }
}

impl WorkspaceArgs {
    fn to_context(&self) -> Result<WorkspaceContext> {
        let mut widgets = HashMap::new();
        for var in &self.vars {
            let Some((key, value)) = var.split_once('=') else {
                bail!("invalid --var '{var}', expected KEY=VALUE");
            };
            widgets.insert(key.to_string(), value.to_string());
        }
        Ok(WorkspaceContext::new(
            self.host.clone(),
            self.token.clone(),
            self.notebook_path.clone(),
            self.username.clone(),
            widgets,
        ))
    }
}

fn parse_env(env: Option<String>) -> Result<Option<Env>> {
    env.map(|value| value.parse::<Env>().context("invalid --env value"))
        .transpose()
}

fn print_outcome(outcome: &DeployOutcome) -> Result<()> {
    println!("{}", outcome.name);
    println!("{}", serde_json::to_string_pretty(&outcome.response)?);
    Ok(())
}
