//! Symlink inspection (detect, resolve, canonicalize).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;
use super::path::normalize_path;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn resolve_link_impl(&self, path: &Path) -> Result<PathBuf> {
        let target = fs::read_link(path).context("Failed to read symlink")?;
        if target.is_absolute() {
            Ok(target)
        } else {
            let parent = path
                .parent()
                .context("Failed to get parent directory of symlink")?;
            Ok(normalize_path(&parent.join(&target)))
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).context("Failed to canonicalize path")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use std::os::unix::fs::symlink;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_symlink_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        runtime.create_dir_all(&target).unwrap();

        let link = dir.path().join("link");
        symlink(&target, &link).unwrap();
        assert!(runtime.is_symlink(&link));
        assert!(!runtime.is_symlink(&target));
        // is_dir follows the link
        assert!(runtime.is_dir(&link));

        let canonical = runtime.canonicalize(&link).unwrap();
        assert!(canonical.ends_with("target"));
    }

    #[test]
    fn test_resolve_link_absolute_target() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("pkg");
        runtime.create_dir_all(&target).unwrap();

        let link = dir.path().join("link");
        symlink(&target, &link).unwrap();

        let resolved = runtime.resolve_link(&link).unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_resolve_link_relative_target() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/foo");
        runtime.create_dir_all(&target).unwrap();
        let node_modules = dir.path().join("node_modules");
        runtime.create_dir_all(&node_modules).unwrap();

        // node_modules/foo -> ../packages/foo
        let link = node_modules.join("foo");
        symlink(Path::new("../packages/foo"), &link).unwrap();

        let resolved = runtime.resolve_link(&link).unwrap();
        assert_eq!(resolved, target);
    }

    #[test]
    fn test_dangling_symlink() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let link = dir.path().join("dangling");
        symlink(dir.path().join("missing"), &link).unwrap();

        assert!(runtime.is_symlink(&link));
        assert!(!runtime.exists(&link));
        assert!(!runtime.is_dir(&link));
        assert!(runtime.canonicalize(&link).is_err());
    }

    #[test]
    fn test_resolve_link_on_regular_dir_fails() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        assert!(!runtime.is_symlink(dir.path()));
        assert!(runtime.resolve_link(dir.path()).is_err());
    }
}
