//! lakeops - deployment automation for a lakehouse data platform
//!
//! lakeops derives deterministic, environment- and identity-aware names for
//! catalogs, schemas, tables, jobs and pipelines from a notebook's filesystem
//! path plus git/user context, and builds deployable job/pipeline
//! configurations by merging defaults, user config and derived names/tags.
//!
//! # Architecture Overview
//!
//! The crate is organized around a small deterministic "naming compiler":
//! a notebook path encoding the data-mesh hierarchy
//! (`domains/<domain>/projects/<project>/flows|explore/...`) is parsed into a
//! structured record, a per-resource naming template is resolved (from an
//! optional `.lakeopscfg/config.yml` or built-in defaults), and the template
//! placeholders are filled from path, environment, username and git state.
//!
//! Everything that talks to the platform REST API goes through the
//! [`api::PlatformApi`] trait, so the naming and config-building core stays
//! synchronous, deterministic and testable with in-memory fakes.
//!
//! # Core Modules
//!
//! ## Naming
//! - [`mesh::parsepath`] - data-mesh path grammar (two-tier, org-aware)
//! - [`mesh::template`] - naming templates with a closed placeholder set
//! - [`mesh::naming`] - name composition for tables, schemas, catalogs,
//!   jobs and pipelines, including SQL-name escaping
//! - [`mesh::cfg`] - discovery and loading of the optional naming config
//!
//! ## Deployment
//! - [`deploy::job`] - job configuration building and task enrichment
//! - [`deploy::pipeline`] - pipeline configuration building
//! - [`deploy`] - `deploy_job`/`deploy_pipeline` create-or-update entry points
//!
//! ## Platform Integration
//! - [`api`] - thin REST client wrapper and the `PlatformApi` capability trait
//! - [`gitinfo`] - git state resolution (repos API merged with widget overrides)
//! - [`context`] - workspace identity snapshot and environment detection
//!
//! ## Operations
//! - [`ops`] - run-by-name helpers and cleanup of per-user dev resources
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use lakeops::context::WorkspaceContext;
//! use lakeops::gitinfo::GitSourceInfo;
//! use lakeops::mesh::cfg::ConfigLoader;
//! use lakeops::mesh::naming::Namer;
//!
//! # fn main() -> lakeops::core::Result<()> {
//! let ctx = WorkspaceContext::new(
//!     "https://workspace.example.com",
//!     "token",
//!     "/Repos/user@example.com/nb/domains/transport/projects/taxi/flows/prep/revenue",
//!     "user@example.com",
//!     Default::default(),
//! );
//! let loader = ConfigLoader::discover()?;
//! let namer = Namer::new(&ctx, &loader, GitSourceInfo::default());
//! let table = namer.tablename("revenue", "gold", None, None)?;
//! # let _ = table;
//! # Ok(())
//! # }
//! ```

// Core functionality
pub mod api;
pub mod cli;
pub mod context;
pub mod core;
pub mod gitinfo;

// Naming
pub mod mesh;

// Deployment and operations
pub mod deploy;
pub mod ops;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
