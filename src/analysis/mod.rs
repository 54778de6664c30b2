//! Drift analysis over dependency snapshots
//!
//! Produces three independent views of a run:
//! - outdated packages: max gap across repositories of at least
//!   [`OUTDATED_THRESHOLD`] majors
//! - lagging applications: repositories with at least
//!   [`LAGGING_APP_THRESHOLD`] dependencies behind by any amount
//! - archived packages: archived internal packages still declared somewhere
//!
//! Every sort is stable, so identical input always gives identical output.

pub mod types;

use indexmap::IndexMap;
use tracing::debug;

pub use types::{
    AnalysisResult, ArchivedPackageUsage, ArchivedUsage, LaggingApplication, LaggingDependency,
    OutdatedPackage, OutdatedUsage,
};

use crate::manifest::types::{DependencySnapshot, Repository};
use crate::version::comparator::{ABSENT_VERSION, version_gap};

/// Minimum max gap for a package to count as critically outdated
pub const OUTDATED_THRESHOLD: u64 = 2;

/// Minimum number of outdated dependencies for an application to lag
pub const LAGGING_APP_THRESHOLD: usize = 5;

/// Archived internal packages, expanded under the organisation scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchivedPackages {
    scope: String,
    names: Vec<String>,
}

impl ArchivedPackages {
    pub fn new(scope: &str, names: &[String]) -> Self {
        Self {
            scope: scope.trim_end_matches('/').to_string(),
            names: names.to_vec(),
        }
    }

    /// Names with the scope prefix, in configuration order
    pub fn qualified_names(&self) -> impl Iterator<Item = String> + '_ {
        self.names
            .iter()
            .map(move |name| format!("{}/{}", self.scope, name))
    }
}

/// Declared version of a repository, if it declares one at all
fn declared_version<'a>(snapshot: &'a DependencySnapshot, repo: &str) -> Option<&'a str> {
    snapshot
        .versions
        .get(repo)
        .map(String::as_str)
        .filter(|version| !version.is_empty() && *version != ABSENT_VERSION)
}

/// Classify snapshots into outdated packages, lagging apps and archived usage
///
/// `snapshots` are expected in dependency-name order; `repositories` gives
/// the run's repositories in order, with their display names.
pub fn analyze(
    snapshots: &[DependencySnapshot],
    repositories: &[Repository],
    archived: &ArchivedPackages,
) -> AnalysisResult {
    let mut outdated_packages = Vec::new();
    let mut app_outdated: IndexMap<&str, Vec<LaggingDependency>> = repositories
        .iter()
        .map(|repository| (repository.slug.as_str(), Vec::new()))
        .collect();

    for snapshot in snapshots {
        let mut apps_using_old_versions = Vec::new();
        let mut max_versions_behind = 0;

        for repository in repositories {
            let Some(current) = declared_version(snapshot, &repository.slug) else {
                continue;
            };

            let versions_behind = version_gap(current, &snapshot.latest);
            if versions_behind == 0 {
                continue;
            }

            apps_using_old_versions.push(OutdatedUsage {
                repo: repository.slug.clone(),
                version: current.to_string(),
                versions_behind,
            });

            if let Some(bucket) = app_outdated.get_mut(repository.slug.as_str()) {
                bucket.push(LaggingDependency {
                    name: snapshot.name.clone(),
                    current_version: current.to_string(),
                    latest_version: snapshot.latest.clone(),
                    versions_behind,
                });
            }

            max_versions_behind = max_versions_behind.max(versions_behind);
        }

        if max_versions_behind >= OUTDATED_THRESHOLD {
            outdated_packages.push(OutdatedPackage {
                name: snapshot.name.clone(),
                latest: snapshot.latest.clone(),
                major_versions_behind: max_versions_behind,
                apps_using_old_versions,
            });
        }
    }

    outdated_packages.sort_by(|a, b| b.major_versions_behind.cmp(&a.major_versions_behind));

    let mut lagging_apps: Vec<LaggingApplication> = repositories
        .iter()
        .filter_map(|repository| {
            let mut outdated = app_outdated.shift_remove(repository.slug.as_str())?;
            if outdated.len() < LAGGING_APP_THRESHOLD {
                return None;
            }
            outdated.sort_by(|a, b| b.versions_behind.cmp(&a.versions_behind));
            Some(LaggingApplication {
                repo: repository.slug.clone(),
                display_name: repository.display_name.clone(),
                outdated_packages: outdated,
            })
        })
        .collect();

    lagging_apps.sort_by(|a, b| b.outdated_packages.len().cmp(&a.outdated_packages.len()));

    let mut archived_packages: Vec<ArchivedPackageUsage> = archived
        .qualified_names()
        .filter_map(|name| {
            let snapshot = snapshots.iter().find(|s| s.name == name)?;
            let apps_using: Vec<ArchivedUsage> = repositories
                .iter()
                .filter_map(|repository| {
                    declared_version(snapshot, &repository.slug).map(|version| ArchivedUsage {
                        repo: repository.slug.clone(),
                        display_name: repository.display_name.clone(),
                        version: version.to_string(),
                    })
                })
                .collect();

            (!apps_using.is_empty()).then_some(ArchivedPackageUsage { name, apps_using })
        })
        .collect();

    archived_packages.sort_by(|a, b| b.apps_using.len().cmp(&a.apps_using.len()));

    debug!(
        "Analysis found {} outdated packages, {} lagging apps, {} archived packages in use",
        outdated_packages.len(),
        lagging_apps.len(),
        archived_packages.len()
    );

    AnalysisResult {
        outdated_packages,
        lagging_apps,
        archived_packages,
    }
}
