//! Notebook path helpers used during task enrichment.

use std::path::{Component, Path, PathBuf};

use crate::context::WorkspaceContext;
use crate::core::{LakeopsError, Result};

/// Relative path of the deploy notebook in its repo, derived from the full
/// workspace path by dropping the `/Repos/<user>/<repo>` prefix.
pub fn nbrelpath(context: &WorkspaceContext) -> String {
    context
        .notebook_path
        .split('/')
        .skip(4)
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative path of the notebook's folder under `root_folder`.
///
/// ```text
/// /Repos/user/nb/domains/transport/projects/taxinyc/flows/prep/revenue/deploy
///               └──────────────── returned ─────────────────┘
/// ```
///
/// A root that is not a prefix of the notebook path is an input error.
pub fn nbrelfolder(context: &WorkspaceContext, root_folder: &str) -> Result<String> {
    let root = if root_folder.is_empty() {
        nbrelpath(context)
    } else {
        root_folder.to_string()
    };
    let relative = Path::new(&context.notebook_path)
        .strip_prefix(Path::new(&root))
        .map_err(|_| {
            LakeopsError::invalid_argument(format!(
                "notebook path '{}' is not under root folder '{root}'",
                context.notebook_path
            ))
        })?;
    Ok(relative
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default())
}

/// Join a notebook path onto a base folder, dropping `.` components so that
/// user-written paths like `./notebook` come out clean.
pub fn join_notebook_path(base: &str, relative: &str) -> String {
    let joined: PathBuf = Path::new(base)
        .components()
        .chain(Path::new(relative).components())
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    joined.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn context(notebook_path: &str) -> WorkspaceContext {
        WorkspaceContext::new("url", "token", notebook_path, "TestUser", HashMap::new())
    }

    #[test]
    fn test_nbrelpath_drops_repo_prefix() {
        let ctx = context("/Repos/user@vlfk.no/dp-notebooks/domains/test/projects/p/flows/f/deploy");
        assert_eq!(nbrelpath(&ctx), "domains/test/projects/p/flows/f/deploy");
    }

    #[test]
    fn test_nbrelfolder_strips_root_folder() {
        let ctx = context(
            "/Users/john.erik.sloper@vlfk.no/dp-notebooks/domains/test/projects/project/flows/flow/testflow/deploy.py",
        );
        let result = nbrelfolder(&ctx, "/Users/john.erik.sloper@vlfk.no/dp-notebooks").unwrap();
        assert_eq!(result, "domains/test/projects/project/flows/flow/testflow");
    }

    #[test]
    fn test_nbrelfolder_tolerates_trailing_slash_on_root() {
        let ctx = context("/Repos/test@vlfk.no/dp-notebooks/domains/d/projects/p/flows/prep/flowfoo");
        let result = nbrelfolder(&ctx, "/Repos/test@vlfk.no/dp-notebooks/").unwrap();
        assert_eq!(result, "domains/d/projects/p/flows/prep");
    }

    #[test]
    fn test_nbrelfolder_errors_when_root_folder_is_wrong() {
        let ctx = context(
            "/Users/john.erik.sloper@vlfk.no/dp-notebooks/domains/test/projects/project/flows/flow/testflow/deploy.py",
        );
        assert!(nbrelfolder(&ctx, "/Wrong/john.erik.sloper@vlfk.no/dp-notebooks").is_err());
    }

    #[test]
    fn test_nbrelfolder_single_segment_yields_empty_base() {
        let ctx = context("test/notebook_path");
        assert_eq!(nbrelfolder(&ctx, "test").unwrap(), "");
    }

    #[test]
    fn test_join_notebook_path_drops_dot_components() {
        assert_eq!(join_notebook_path("test", "./test_notebook"), "test/test_notebook");
        assert_eq!(join_notebook_path("", "task_key"), "task_key");
        assert_eq!(join_notebook_path("a/b", "c"), "a/b/c");
    }
}
