use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    client::Client,
    package::{DEPENDENCY_STORE, Excludes},
    runtime::{Runtime, path::normalize_path},
};

/// Relative location of the default cache inside the project.
const CACHE_FILE: &str = ".cache/nlx.json";

/// Settings supplied on the command line (or their environment fallbacks).
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub cache_file: Option<PathBuf>,
    pub excludes: Vec<String>,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub client: Client,
    pub cache_file: PathBuf,
    pub excludes: Excludes,
}

impl Config {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let project_dir = runtime.current_dir()?;
        debug!("Using project directory {:?}", project_dir);

        let cache_file = match overrides.cache_file {
            Some(path) => resolve(&project_dir, &path),
            None => project_dir.join(DEPENDENCY_STORE).join(CACHE_FILE),
        };
        debug!("Using cache file {:?}", cache_file);

        let excludes = Excludes::new(&overrides.excludes)?;
        let client = Client::detect(runtime, &project_dir);

        Ok(Self {
            project_dir,
            client,
            cache_file,
            excludes,
        })
    }

    /// Resolve a user-supplied path against the project directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve(&self.project_dir, path)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}
