use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    package::{
        CandidatePackage, DependencyIndex, LinkCache, LinkInspector, ProjectManifest,
        candidate_dirs, candidate_packages,
    },
    runtime::Runtime,
};

pub mod config;
mod link;
mod output;
mod show;
mod unlink;

pub use link::link;
pub use output::format_block;
pub use show::{ShowFilter, show};
pub use unlink::unlink;

use config::{Config, ConfigOverrides};

/// What a single invocation was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Actions {
    /// Directory containing the candidate packages, relative to the project.
    pub packages_dir: Option<PathBuf>,
    pub link: bool,
    pub unlink: bool,
    pub show: Option<ShowFilter>,
    /// Restore installed copies after unlinking.
    pub reinstall: bool,
}

impl Actions {
    pub fn is_empty(&self) -> bool {
        !self.link && !self.unlink && self.show.is_none()
    }
}

/// Run the requested actions in order: link, show, unlink.
#[tracing::instrument(skip(runtime, overrides))]
pub fn run<R: Runtime>(runtime: &R, actions: Actions, overrides: ConfigOverrides) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let packages_dir = actions.packages_dir.as_deref();

    if actions.link {
        link(runtime, &config, packages_dir)?;
    }
    if let Some(filter) = actions.show {
        show(runtime, &config, packages_dir, filter)?;
    }
    if actions.unlink {
        unlink(runtime, &config, packages_dir, actions.reinstall)?;
    }
    Ok(())
}

/// Read the project manifest and work out which declared dependencies are linked.
#[tracing::instrument(skip(runtime, config))]
pub(crate) fn load_index<R: Runtime>(runtime: &R, config: &Config) -> Result<DependencyIndex> {
    let manifest = ProjectManifest::load(runtime, &config.project_dir)?;
    let cache = LinkCache::load(runtime, &config.cache_file);
    let inspector = LinkInspector::new(
        runtime,
        &config.project_dir,
        config.excludes.clone(),
        cache,
    );
    inspector.index(&manifest)
}

/// Scan `packages_dir` for candidate packages.
#[tracing::instrument(skip(runtime, config))]
pub(crate) fn load_candidates<R: Runtime>(
    runtime: &R,
    config: &Config,
    packages_dir: Option<&Path>,
) -> Result<Vec<CandidatePackage>> {
    let resolved = packages_dir.map(|p| config.resolve(p));
    let dirs = candidate_dirs(runtime, resolved.as_deref())?;
    let packages = candidate_packages(runtime, &dirs);
    debug!(
        "{} of {} directories are packages",
        packages.len(),
        dirs.len()
    );
    Ok(packages)
}
