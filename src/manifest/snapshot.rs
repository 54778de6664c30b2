//! Turn fetched manifests and resolved versions into per-dependency snapshots

use std::collections::BTreeSet;

use crate::manifest::types::{DependencySnapshot, LatestVersions, ManifestSet, Repository};
use crate::version::comparator::{ABSENT_VERSION, UNRESOLVED_VERSION, strip_range_operator};

/// Unique runtime dependency names across every fetched manifest, sorted
pub fn collect_dependency_names(manifests: &ManifestSet) -> Vec<String> {
    manifests
        .values()
        .flatten()
        .flat_map(|manifest| manifest.dependency_names())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build one snapshot per dependency name, in the order given
pub fn build_snapshots(
    names: &[String],
    repositories: &[Repository],
    manifests: &ManifestSet,
    latest_versions: &LatestVersions,
) -> Vec<DependencySnapshot> {
    names
        .iter()
        .map(|name| {
            let versions = repositories
                .iter()
                .map(|repository| {
                    let declared = manifests
                        .get(&repository.slug)
                        .and_then(Option::as_ref)
                        .and_then(|manifest| manifest.dependency(name))
                        .filter(|version| !version.is_empty())
                        .map(|version| strip_range_operator(version).to_string())
                        .unwrap_or_else(|| ABSENT_VERSION.to_string());
                    (repository.slug.clone(), declared)
                })
                .collect();

            DependencySnapshot {
                name: name.clone(),
                latest: latest_versions
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| UNRESOLVED_VERSION.to_string()),
                versions,
            }
        })
        .collect()
}
