//! Common types for manifests and dependency snapshots

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MANIFEST_PATH;

/// A repository taking part in the audit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    /// Repository name under the organisation (e.g., "crm.web")
    pub slug: String,
    /// Short name used in report headers (e.g., "CRM")
    pub display_name: String,
    /// Path of package.json inside the repository
    pub manifest_path: String,
}

impl Repository {
    /// Repository with no catalog entry: identity display name, default path
    pub fn fallback(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            display_name: slug.to_string(),
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
        }
    }
}

/// The dependency sections of a package.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_dependencies: Option<IndexMap<String, String>>,
}

impl Manifest {
    /// Declared range of a runtime dependency
    pub fn dependency(&self, name: &str) -> Option<&str> {
        self.dependencies
            .as_ref()
            .and_then(|deps| deps.get(name))
            .map(String::as_str)
    }

    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .flat_map(|deps| deps.keys())
            .map(String::as_str)
    }
}

/// Manifests by repository slug; `None` when the fetch failed
pub type ManifestSet = IndexMap<String, Option<Manifest>>;

/// Latest published version by package name
pub type LatestVersions = IndexMap<String, String>;

/// One dependency across every repository of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySnapshot {
    pub name: String,
    /// Latest published version, or the unresolved marker
    pub latest: String,
    /// Declared version per repository slug, or the absent marker
    pub versions: IndexMap<String, String>,
}
