mod cache;
mod discovery;
mod link_status;
mod manifest;
mod selection;

pub use cache::{CacheFile, LinkCache};
pub use discovery::{DEFAULT_EXCLUDES, Excludes, candidate_dirs, candidate_packages, own_package_names};
pub use link_status::{DEPENDENCY_STORE, LinkInspector};
pub use manifest::{CandidatePackage, MANIFEST_FILE, Manifest, ProjectManifest};
pub use selection::DependencyIndex;
