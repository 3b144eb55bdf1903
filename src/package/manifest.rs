use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const MANIFEST_FILE: &str = "package.json";

/// Read and parse `<dir>/package.json`.
fn read_manifest<R: Runtime, T: DeserializeOwned>(runtime: &R, dir: &Path) -> Result<T> {
    let path = dir.join(MANIFEST_FILE);
    let content = runtime
        .read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// A string `name`; anything else counts as absent.
fn lenient_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => Some(name),
        _ => None,
    })
}

/// A dependency partition; `null` or a non-object is treated as empty.
fn lenient_partition<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

/// The only part of a `package.json` that identifies a package: its name.
///
/// Every other field, dependency partitions included, is ignored.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: Option<String>,
}

impl Manifest {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, dir: &Path) -> Result<Self> {
        read_manifest(runtime, dir)
    }

    /// The declared name, if it is present and non-empty.
    pub fn valid_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// The declared dependencies of the project the tool runs in.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    #[serde(default, deserialize_with = "lenient_partition")]
    pub dependencies: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_partition")]
    pub dev_dependencies: BTreeMap<String, Value>,
}

impl ProjectManifest {
    /// Load `<project_dir>/package.json`. Failure is fatal for the caller.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, project_dir: &Path) -> Result<Self> {
        read_manifest(runtime, project_dir).with_context(|| {
            format!(
                "No usable {} in project directory {}",
                MANIFEST_FILE,
                project_dir.display()
            )
        })
    }

    /// Every declared dependency name, runtime and development combined.
    pub fn declared_names(&self) -> BTreeSet<String> {
        self.dev_dependencies
            .keys()
            .chain(self.dependencies.keys())
            .cloned()
            .collect()
    }
}

/// A package directory found next to the project, identified by its manifest name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePackage {
    pub name: String,
    pub dir: PathBuf,
}

impl CandidatePackage {
    /// Read the candidate in `dir`.
    ///
    /// Returns `None` when the manifest cannot be read or parsed, or has no name.
    pub fn load<R: Runtime>(runtime: &R, dir: &Path) -> Option<Self> {
        let manifest = match Manifest::load(runtime, dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(
                    "No {} at {}: {:#}",
                    MANIFEST_FILE,
                    dir.join(MANIFEST_FILE).display(),
                    e
                );
                return None;
            }
        };

        let name = manifest.valid_name()?.to_string();
        Some(Self {
            name,
            dir: dir.to_path_buf(),
        })
    }
}
