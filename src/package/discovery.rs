use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::manifest::{CandidatePackage, MANIFEST_FILE, Manifest};

/// Names skipped while walking the project's own tree.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", ".git", "*__*", ".DS_Store", "reports", "dist"];

/// List the package directories directly inside `packages_dir`.
///
/// Hidden entries (leading `.`) are ignored; symlinked directories count as directories.
#[tracing::instrument(skip(runtime))]
pub fn candidate_dirs<R: Runtime>(runtime: &R, packages_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    let packages_dir = packages_dir.context(
        "Need a RELATIVE path to the directory with packages you want to link, eg: (../../my-monorepo/packages)",
    )?;

    let mut dirs: Vec<PathBuf> = runtime
        .read_dir(packages_dir)?
        .into_iter()
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .filter(|path| runtime.is_dir(path))
        .collect();
    dirs.sort();

    debug!("Found {} directories in {:?}", dirs.len(), packages_dir);
    Ok(dirs)
}

/// Turn directories into candidate packages, dropping those without a usable name.
#[tracing::instrument(skip(runtime, dirs))]
pub fn candidate_packages<R: Runtime>(runtime: &R, dirs: &[PathBuf]) -> Vec<CandidatePackage> {
    dirs.iter()
        .filter_map(|dir| CandidatePackage::load(runtime, dir))
        .collect()
}

/// Compiled exclusion patterns for the project tree walk.
#[derive(Debug, Clone)]
pub struct Excludes {
    patterns: Vec<glob::Pattern>,
}

impl Excludes {
    /// Build from the defaults plus `extra` user patterns.
    pub fn new(extra: &[String]) -> Result<Self> {
        let patterns = DEFAULT_EXCLUDES
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().cloned())
            .map(|p| {
                glob::Pattern::new(&p).with_context(|| format!("Invalid exclude pattern '{}'", p))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }
}

/// Collect the name of every package declared inside `root`, depth-first.
///
/// Excluded names are skipped and symlinked directories are never entered, so
/// packages merely linked into the tree are not counted.
#[tracing::instrument(skip(runtime, excludes))]
pub fn own_package_names<R: Runtime>(
    runtime: &R,
    root: &Path,
    excludes: &Excludes,
) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    walk(runtime, root, excludes, &mut names)?;
    debug!("Found {} package name(s) under {:?}", names.len(), root);
    Ok(names)
}

fn walk<R: Runtime>(
    runtime: &R,
    dir: &Path,
    excludes: &Excludes,
    names: &mut BTreeSet<String>,
) -> Result<()> {
    let mut entries = runtime.read_dir(dir)?;
    entries.sort();

    for entry in entries {
        let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if excludes.is_excluded(file_name) {
            continue;
        }

        if runtime.is_dir(&entry) {
            if runtime.is_symlink(&entry) {
                debug!("Not descending into symlinked directory {:?}", entry);
                continue;
            }
            if let Err(e) = walk(runtime, &entry, excludes, names) {
                warn!("Skipping {:?}: {:#}", entry, e);
            }
        } else if file_name == MANIFEST_FILE {
            let parent = entry.parent().unwrap_or(dir);
            match Manifest::load(runtime, parent) {
                Ok(manifest) => {
                    if let Some(name) = manifest.valid_name() {
                        names.insert(name.to_string());
                    }
                }
                Err(e) => warn!("Skipping {:?}: {:#}", entry, e),
            }
        }
    }
    Ok(())
}
