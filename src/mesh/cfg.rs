//! Discovery and loading of the optional naming configuration.
//!
//! A repository can override the built-in naming templates by placing a
//! `.lakeopscfg/config.yml` at its root:
//!
//! ```yaml
//! naming:
//!   job:
//!     prod: "{domain}_{project}_{env}"
//!     other: "{domain}_{project}_{env}_{username}_{gitbranch}_{gitshortref}"
//!   db:
//!     prod: "{db}"
//!     other: "{env}_{username}_{gitbranch}_{gitshortref}_{db}"
//! fullmesh: false
//! ```
//!
//! The config directory is found by walking parent directories from the
//! working directory until a `.lakeopscfg` folder appears (a `.git` folder
//! cannot be used as the marker since it is not present in the workspace
//! filesystem). Absence of the file is not an error; built-in defaults apply.
//!
//! [`ConfigLoader`] is constructed once at process start and passed by
//! reference into the naming code. Tests construct fresh instances instead
//! of clearing any global cache; there is none.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::core::Result;

/// Marker directory searched for in parent directories.
pub const CONFIG_DIR: &str = ".lakeopscfg";

/// Config file name inside the marker directory.
pub const CONFIG_FILE: &str = "config.yml";

/// Parsed shape of `.lakeopscfg/config.yml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Per-resource naming templates, keyed by resource kind then
    /// environment bucket (`prod`, `other`, or a concrete env name).
    #[serde(default)]
    pub naming: HashMap<String, HashMap<String, String>>,
    /// Full-mesh mode: include an organization segment in path parsing.
    #[serde(default)]
    pub fullmesh: bool,
}

/// Handle to the loaded (or absent) naming configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: Option<ConfigFile>,
}

impl ConfigLoader {
    /// Loader with no external configuration; built-in defaults apply.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loader over an already-parsed config. Intended for tests.
    pub fn from_config(config: ConfigFile) -> Self {
        Self { config: Some(config) }
    }

    /// Discover the config by walking parents of the working directory.
    pub fn discover() -> Result<Self> {
        Self::from_dir(&std::env::current_dir()?)
    }

    /// Discover the config by walking parents of `start`.
    pub fn from_dir(start: &Path) -> Result<Self> {
        match find_config(start) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::empty()),
        }
    }

    /// Load the config from an explicit file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("loading naming config from {}", path.display());
        let config: ConfigFile = serde_yaml::from_reader(File::open(path)?)?;
        Ok(Self { config: Some(config) })
    }

    /// Naming entry for a resource kind, when the external config has one.
    pub fn naming(&self, resource: &str) -> Option<&HashMap<String, String>> {
        self.config.as_ref()?.naming.get(resource)
    }

    /// Whether full-mesh mode (org-aware path grammar) is enabled.
    pub fn fullmesh(&self) -> bool {
        self.config.as_ref().is_some_and(|config| config.fullmesh)
    }
}

/// Look for `.lakeopscfg/config.yml` in `start` and each parent directory.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_dir = dir.join(CONFIG_DIR);
        if config_dir.exists() {
            return Some(config_dir.join(CONFIG_FILE));
        }
        if !dir.pop() {
            return None;
        }
    }
}
