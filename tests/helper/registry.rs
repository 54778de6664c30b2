//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use dependency_drift::version::error::RegistryError;
use dependency_drift::version::registry::Registry;
use dependency_drift::version::resolver::RegistryResolver;

/// In-memory registry counting lookups
pub struct MockRegistry {
    name: &'static str,
    latest: HashMap<String, String>,
    calls: Arc<AtomicUsize>,
}

impl MockRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            latest: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_latest(mut self, package: &str, version: &str) -> Self {
        self.latest.insert(package.to_string(), version.to_string());
        self
    }

    /// Shared counter of `fetch_latest_version` calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.latest
            .get(package_name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }
}

/// Resolver routing `scope` packages to `scoped` and the rest to `public`
pub fn create_test_resolver(
    scope: &str,
    scoped: MockRegistry,
    public: MockRegistry,
) -> RegistryResolver {
    RegistryResolver::new(scope, vec![Arc::new(scoped)], vec![Arc::new(public)])
}
