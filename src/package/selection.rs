//! Matching candidate packages against the project's declared dependencies.

use log::debug;
use std::collections::{BTreeMap, HashSet};

use super::manifest::CandidatePackage;

/// Declared dependency names of the project with their link status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyIndex {
    linked: BTreeMap<String, bool>,
}

impl DependencyIndex {
    pub fn new(statuses: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self {
            linked: statuses.into_iter().collect(),
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.linked.contains_key(name)
    }

    pub fn is_linked(&self, name: &str) -> bool {
        self.linked.get(name).copied().unwrap_or(false)
    }

    /// Declared dependencies that are currently linked, sorted by name.
    pub fn linked_names(&self) -> Vec<&str> {
        self.linked
            .iter()
            .filter(|(_, linked)| **linked)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Candidates that are declared dependencies, in candidate order.
    ///
    /// When several directories declare the same name only the first is kept.
    pub fn shared_packages<'c>(&self, candidates: &'c [CandidatePackage]) -> Vec<&'c CandidatePackage> {
        let mut seen = HashSet::new();
        candidates
            .iter()
            .filter(|pkg| self.declares(&pkg.name))
            .filter(|pkg| seen.insert(pkg.name.as_str()))
            .collect()
    }

    pub fn shared_names<'c>(&self, candidates: &'c [CandidatePackage]) -> Vec<&'c str> {
        self.shared_packages(candidates)
            .into_iter()
            .map(|pkg| pkg.name.as_str())
            .collect()
    }

    /// Shared packages that still need linking.
    pub fn linkable<'c>(&self, candidates: &'c [CandidatePackage]) -> Vec<&'c CandidatePackage> {
        self.shared_packages(candidates)
            .into_iter()
            .filter(|pkg| {
                let linked = self.is_linked(&pkg.name);
                if linked {
                    debug!("Ignoring already linked: {}.", pkg.name);
                }
                !linked
            })
            .collect()
    }

    /// Shared dependency names that are currently linked.
    pub fn unlinkable<'c>(&self, candidates: &'c [CandidatePackage]) -> Vec<&'c str> {
        self.shared_names(candidates)
            .into_iter()
            .filter(|name| self.is_linked(name))
            .collect()
    }
}
