//! Manifest source test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;

use dependency_drift::manifest::source::{ManifestError, ManifestSource};
use dependency_drift::manifest::types::{Manifest, Repository};

/// In-memory manifest source keyed by repository slug
pub struct FakeManifestSource {
    manifests: HashMap<String, Manifest>,
    calls: Arc<AtomicUsize>,
}

impl FakeManifestSource {
    pub fn new() -> Self {
        Self {
            manifests: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_dependencies(mut self, slug: &str, dependencies: &[(&str, &str)]) -> Self {
        let dependencies: IndexMap<String, String> = dependencies
            .iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect();
        self.manifests.insert(
            slug.to_string(),
            Manifest {
                dependencies: Some(dependencies),
                dev_dependencies: None,
            },
        );
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ManifestSource for FakeManifestSource {
    async fn fetch_manifest(
        &self,
        repository: &Repository,
        _branch: &str,
    ) -> Result<Option<Manifest>, ManifestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.manifests.get(&repository.slug).cloned())
    }
}
