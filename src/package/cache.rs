use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::runtime::Runtime;

/// On-disk form of the link-status cache.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheFile {
    /// Milliseconds since the Unix epoch of the last write.
    #[serde(default)]
    pub last_updated: u64,
    /// Dependency name -> whether a symlink for it points outside the project's own tree.
    #[serde(default)]
    pub cache: BTreeMap<String, bool>,
}

/// Persisted answers to "does this dependency live outside the project tree?".
///
/// Entries never expire; deleting the file is the only way to invalidate them.
#[derive(Debug)]
pub struct LinkCache {
    path: PathBuf,
    file: CacheFile,
    dirty: bool,
}

impl LinkCache {
    /// Load the cache at `path`. A missing or unreadable file yields an empty cache.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Self {
        let file = if runtime.exists(path) {
            match runtime
                .read_to_string(path)
                .and_then(|s| serde_json::from_str::<CacheFile>(&s).map_err(Into::into))
            {
                Ok(file) => {
                    debug!("Loaded {} cache entries from {:?}", file.cache.len(), path);
                    file
                }
                Err(e) => {
                    warn!("Ignoring unreadable cache {:?}: {:#}", path, e);
                    CacheFile::default()
                }
            }
        } else {
            CacheFile::default()
        };

        Self {
            path: path.to_path_buf(),
            file,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.file.cache.get(name).copied()
    }

    pub fn insert(&mut self, name: &str, points_outside: bool) {
        if self.file.cache.insert(name.to_string(), points_outside) != Some(points_outside) {
            self.dirty = true;
        }
    }

    /// Write the cache back if anything changed since it was loaded.
    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&mut self, runtime: &R) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        self.file.last_updated = now_millis();
        let json = serde_json::to_string_pretty(&self.file)?;

        if let Some(parent) = self.path.parent() {
            if !runtime.exists(parent) {
                runtime.create_dir_all(parent)?;
            }
        }

        // Write then rename so readers never see a partial file
        let tmp_path = self.path.with_extension("json.tmp");
        runtime
            .write(&tmp_path, json.as_bytes())
            .with_context(|| format!("Failed to write cache {}", tmp_path.display()))?;
        runtime
            .rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace cache {}", self.path.display()))?;

        debug!("Saved {} cache entries to {:?}", self.file.cache.len(), self.path);
        self.dirty = false;
        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
