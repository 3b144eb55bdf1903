use anyhow::Result;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::runtime::{Runtime, is_path_under};

use super::cache::LinkCache;
use super::discovery::{Excludes, own_package_names};
use super::manifest::ProjectManifest;
use super::selection::DependencyIndex;

/// Directory holding installed dependencies inside a project.
pub const DEPENDENCY_STORE: &str = "node_modules";

/// Decides whether declared dependencies are linked into the project's dependency store.
///
/// A dependency counts as linked when its store entry is a symlink to a directory
/// that lives outside the project, and the project itself does not contain a
/// package with that name (workspace packages symlinked into the store are not
/// "linked" in this sense).
pub struct LinkInspector<'a, R: Runtime> {
    runtime: &'a R,
    project_dir: PathBuf,
    excludes: Excludes,
    cache: LinkCache,
    own_names: Option<BTreeSet<String>>,
}

impl<'a, R: Runtime> LinkInspector<'a, R> {
    pub fn new(runtime: &'a R, project_dir: &Path, excludes: Excludes, cache: LinkCache) -> Self {
        Self {
            runtime,
            project_dir: project_dir.to_path_buf(),
            excludes,
            cache,
            own_names: None,
        }
    }

    /// `<project>/node_modules/<name>`; scoped names map to nested directories.
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.project_dir.join(DEPENDENCY_STORE).join(name)
    }

    #[tracing::instrument(skip(self))]
    pub fn is_linked(&mut self, name: &str) -> Result<bool> {
        let store_path = self.store_path(name);

        if !self.runtime.exists(&store_path) || !self.runtime.is_dir(&store_path) {
            return Ok(false);
        }
        if !self.runtime.is_symlink(&store_path) {
            return Ok(false);
        }
        if self.target_inside_project(&store_path) {
            debug!("{} links back into the project", name);
            return Ok(false);
        }

        self.points_outside(name)
    }

    /// Compute the link status of every declared dependency, then persist the cache.
    ///
    /// Failing to write the cache is logged; the index is returned regardless.
    #[tracing::instrument(skip(self, manifest))]
    pub fn index(mut self, manifest: &ProjectManifest) -> Result<DependencyIndex> {
        let mut statuses = Vec::new();
        for name in manifest.declared_names() {
            let linked = self.is_linked(&name)?;
            statuses.push((name, linked));
        }
        if let Err(e) = self.cache.save(self.runtime) {
            warn!("Could not save link cache {:?}: {:#}", self.cache.path(), e);
        }
        Ok(DependencyIndex::new(statuses))
    }

    fn target_inside_project(&self, store_path: &Path) -> bool {
        let target = match self
            .runtime
            .canonicalize(store_path)
            .or_else(|_| self.runtime.resolve_link(store_path))
        {
            Ok(target) => target,
            Err(e) => {
                debug!("Cannot resolve {:?}: {:#}", store_path, e);
                return false;
            }
        };
        let root = self
            .runtime
            .canonicalize(&self.project_dir)
            .unwrap_or_else(|_| self.project_dir.clone());
        is_path_under(&target, &root)
    }

    /// Cached answer to "is `name` absent from the project's own tree?".
    fn points_outside(&mut self, name: &str) -> Result<bool> {
        if let Some(answer) = self.cache.get(name) {
            debug!("Cache hit for {}: {}", name, answer);
            return Ok(answer);
        }

        if self.own_names.is_none() {
            self.own_names = Some(own_package_names(
                self.runtime,
                &self.project_dir,
                &self.excludes,
            )?);
        }
        let answer = !self
            .own_names
            .as_ref()
            .is_some_and(|names| names.contains(name));

        debug!("Computed {} points outside project: {}", name, answer);
        self.cache.insert(name, answer);
        Ok(answer)
    }
}
