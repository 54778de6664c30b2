//! Audit workflow: cache lookup, fetching, snapshot building and analysis

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisResult, ArchivedPackages, analyze};
use crate::manifest::snapshot::{build_snapshots, collect_dependency_names};
use crate::manifest::source::{ManifestError, ManifestSource};
use crate::manifest::types::{DependencySnapshot, LatestVersions, ManifestSet, Repository};
use crate::version::cache::SnapshotStorer;
use crate::version::resolver::LatestVersionSource;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("No GitHub token found in ~/.npmrc")]
    MissingCredential,
}

/// Everything a report needs from one run
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub repositories: Vec<Repository>,
    pub snapshots: Vec<DependencySnapshot>,
    pub analysis: AnalysisResult,
    /// Whether manifests and latest versions came from the cache
    pub from_cache: bool,
}

pub struct Auditor<S: SnapshotStorer> {
    storer: Option<Arc<S>>,
    manifests: Arc<dyn ManifestSource>,
    versions: Arc<dyn LatestVersionSource>,
    archived: ArchivedPackages,
}

impl<S: SnapshotStorer> Auditor<S> {
    /// Build an auditor; pass `None` as storer to always fetch fresh data
    pub fn new(
        storer: Option<Arc<S>>,
        manifests: Arc<dyn ManifestSource>,
        versions: Arc<dyn LatestVersionSource>,
        archived: ArchivedPackages,
    ) -> Self {
        Self {
            storer,
            manifests,
            versions,
            archived,
        }
    }

    /// Run a full audit of `repositories` at `branch`
    pub async fn run(
        &self,
        branch: &str,
        repositories: &[Repository],
    ) -> Result<AuditOutcome, AuditError> {
        let slugs: Vec<String> = repositories.iter().map(|r| r.slug.clone()).collect();

        if let Some(storer) = &self.storer {
            let evicted = storer.evict_expired();
            if evicted > 0 {
                debug!("Evicted {} expired cache entries", evicted);
            }
        }

        let cached = self
            .storer
            .as_ref()
            .and_then(|storer| storer.load(branch, &slugs));

        let (manifests, latest_versions, from_cache) = match cached {
            Some(entry) => {
                info!("Using cached data from {}", entry.timestamp);
                (entry.manifests, entry.latest_versions, true)
            }
            None => {
                let manifests = self.fetch_manifests(branch, repositories).await?;
                let latest_versions = self.resolve_latest_versions(&manifests).await;

                if let Some(storer) = &self.storer {
                    storer.save(branch, &slugs, &manifests, &latest_versions);
                }

                (manifests, latest_versions, false)
            }
        };

        let names = collect_dependency_names(&manifests);
        info!("Analyzing {} unique dependencies", names.len());

        let snapshots = build_snapshots(&names, repositories, &manifests, &latest_versions);
        let analysis = analyze(&snapshots, repositories, &self.archived);

        Ok(AuditOutcome {
            repositories: repositories.to_vec(),
            snapshots,
            analysis,
            from_cache,
        })
    }

    async fn fetch_manifests(
        &self,
        branch: &str,
        repositories: &[Repository],
    ) -> Result<ManifestSet, AuditError> {
        let mut manifests = IndexMap::new();

        for repository in repositories {
            info!("Fetching manifest for {}", repository.slug);
            let manifest = match self.manifests.fetch_manifest(repository, branch).await {
                Ok(manifest) => manifest,
                Err(ManifestError::MissingCredential) => return Err(AuditError::MissingCredential),
                Err(e) => {
                    warn!("Failed to fetch manifest for {}: {}", repository.slug, e);
                    None
                }
            };
            manifests.insert(repository.slug.clone(), manifest);
        }

        Ok(manifests)
    }

    async fn resolve_latest_versions(&self, manifests: &ManifestSet) -> LatestVersions {
        let names = collect_dependency_names(manifests);
        info!("Resolving latest versions for {} packages", names.len());

        let mut latest_versions = IndexMap::new();
        for name in names {
            let latest = self.versions.resolve_latest_version(&name).await;
            debug!("{} -> {}", name, latest);
            latest_versions.insert(name, latest);
        }

        latest_versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::source::MockManifestSource;
    use crate::manifest::types::Manifest;
    use crate::version::cache::{CacheEntry, MockSnapshotStorer};
    use crate::version::resolver::MockLatestVersionSource;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn repository(slug: &str) -> Repository {
        Repository::fallback(slug)
    }

    fn manifest(deps: &[(&str, &str)]) -> Manifest {
        Manifest {
            dependencies: Some(
                deps.iter()
                    .map(|(name, version)| (name.to_string(), version.to_string()))
                    .collect(),
            ),
            dev_dependencies: None,
        }
    }

    fn manifest_source() -> MockManifestSource {
        let mut source = MockManifestSource::new();
        source
            .expect_fetch_manifest()
            .returning(|repository, _| match repository.slug.as_str() {
                "web" => Ok(Some(manifest(&[("react", "^16.0.0"), ("lodash", "4.17.21")]))),
                "api" => Ok(Some(manifest(&[("lodash", "~3.0.0")]))),
                _ => Ok(None),
            });
        source
    }

    fn version_source() -> MockLatestVersionSource {
        let mut source = MockLatestVersionSource::new();
        source
            .expect_resolve_latest_version()
            .returning(|name| match name {
                "react" => "19.1.0".to_string(),
                "lodash" => "4.17.21".to_string(),
                _ => "N/A".to_string(),
            });
        source
    }

    #[tokio::test]
    async fn run_without_storer_fetches_and_analyzes() {
        let auditor = Auditor::<MockSnapshotStorer>::new(
            None,
            Arc::new(manifest_source()),
            Arc::new(version_source()),
            ArchivedPackages::default(),
        );
        let repositories = vec![repository("web"), repository("api"), repository("gone")];

        let outcome = auditor.run("master", &repositories).await.unwrap();

        assert!(!outcome.from_cache);
        let names: Vec<_> = outcome.snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["lodash", "react"]);
        assert_eq!(outcome.snapshots[0].versions["api"], "3.0.0");
        assert_eq!(outcome.snapshots[0].versions["gone"], "-");
        assert_eq!(outcome.snapshots[1].versions["web"], "16.0.0");

        assert_eq!(outcome.analysis.outdated_packages.len(), 1);
        assert_eq!(outcome.analysis.outdated_packages[0].name, "react");
        assert_eq!(outcome.analysis.outdated_packages[0].major_versions_behind, 3);
    }

    #[tokio::test]
    async fn run_on_cache_miss_saves_fetched_data() {
        let mut storer = MockSnapshotStorer::new();
        storer.expect_evict_expired().times(1).return_const(0usize);
        storer
            .expect_load()
            .withf(|branch, repos| branch == "main" && repos == ["web", "api"])
            .times(1)
            .returning(|_, _| None);
        storer
            .expect_save()
            .times(1)
            .withf(|branch, repos, manifests, latest| {
                branch == "main"
                    && repos.len() == 2
                    && manifests.len() == 2
                    && latest.get("react").map(String::as_str) == Some("19.1.0")
            })
            .return_const(());

        let auditor = Auditor::new(
            Some(Arc::new(storer)),
            Arc::new(manifest_source()),
            Arc::new(version_source()),
            ArchivedPackages::default(),
        );

        let outcome = auditor
            .run("main", &[repository("web"), repository("api")])
            .await
            .unwrap();

        assert!(!outcome.from_cache);
    }

    #[tokio::test]
    async fn run_on_cache_hit_skips_network() {
        let mut storer = MockSnapshotStorer::new();
        storer.expect_evict_expired().return_const(2usize);
        storer.expect_load().times(1).returning(|_, _| {
            Some(CacheEntry {
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                manifests: IndexMap::from([(
                    "web".to_string(),
                    Some(manifest(&[("@acme/legacy", "1.2.0")])),
                )]),
                latest_versions: IndexMap::from([(
                    "@acme/legacy".to_string(),
                    "1.2.0".to_string(),
                )]),
            })
        });
        storer.expect_save().never();

        let mut manifests = MockManifestSource::new();
        manifests.expect_fetch_manifest().never();
        let mut versions = MockLatestVersionSource::new();
        versions.expect_resolve_latest_version().never();

        let auditor = Auditor::new(
            Some(Arc::new(storer)),
            Arc::new(manifests),
            Arc::new(versions),
            ArchivedPackages::new("@acme", &["legacy".to_string()]),
        );

        let outcome = auditor.run("master", &[repository("web")]).await.unwrap();

        assert!(outcome.from_cache);
        assert_eq!(outcome.analysis.archived_packages.len(), 1);
        assert_eq!(outcome.analysis.archived_packages[0].name, "@acme/legacy");
    }

    #[tokio::test]
    async fn run_aborts_on_missing_credential() {
        let mut manifests = MockManifestSource::new();
        manifests
            .expect_fetch_manifest()
            .times(1)
            .returning(|_, _| Err(ManifestError::MissingCredential));
        let mut versions = MockLatestVersionSource::new();
        versions.expect_resolve_latest_version().never();

        let auditor = Auditor::<MockSnapshotStorer>::new(
            None,
            Arc::new(manifests),
            Arc::new(versions),
            ArchivedPackages::default(),
        );

        let result = auditor
            .run("master", &[repository("web"), repository("api")])
            .await;

        assert!(matches!(result, Err(AuditError::MissingCredential)));
    }

    #[tokio::test]
    async fn run_treats_decode_failure_as_missing_manifest() {
        let mut manifests = MockManifestSource::new();
        manifests
            .expect_fetch_manifest()
            .returning(|_, _| Err(ManifestError::Decode("bad base64".to_string())));
        let mut versions = MockLatestVersionSource::new();
        versions.expect_resolve_latest_version().never();

        let auditor = Auditor::<MockSnapshotStorer>::new(
            None,
            Arc::new(manifests),
            Arc::new(versions),
            ArchivedPackages::default(),
        );

        let outcome = auditor.run("master", &[repository("web")]).await.unwrap();

        assert!(outcome.snapshots.is_empty());
        assert_eq!(outcome.analysis, AnalysisResult::default());
    }
}
