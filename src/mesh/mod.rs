//! Data-mesh naming: path parsing, naming templates and name composition.
//!
//! A notebook path encodes the organizational hierarchy as directory
//! segments (`domains/<domain>/projects/<project>/flows|explore/...`).
//! This module turns that path, plus environment and git/identity context,
//! into stable resource names:
//!
//! 1. [`parsepath`] extracts the structured record from the path,
//! 2. [`template`] resolves a per-resource naming template (external config
//!    with built-in defaults) and substitutes its placeholders,
//! 3. [`naming`] orchestrates both with git and identity state into final,
//!    escaped names for tables, schemas, catalogs, jobs and pipelines,
//! 4. [`cfg`] finds and loads the optional `.lakeopscfg/config.yml`.

pub mod cfg;
pub mod naming;
pub mod parsepath;
pub mod template;
