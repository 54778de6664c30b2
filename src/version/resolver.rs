//! Latest version resolution across registries
//!
//! Packages under the organisation scope are looked up in the private
//! registries; everything else goes to the public npm registry. Any failure
//! degrades to [`UNRESOLVED_VERSION`] instead of an error.

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use tracing::{debug, warn};

use crate::version::comparator::UNRESOLVED_VERSION;
use crate::version::registry::Registry;

/// Trait for resolving the latest published version of a package
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait LatestVersionSource: Send + Sync {
    /// Returns the latest version, or [`UNRESOLVED_VERSION`] on any failure
    async fn resolve_latest_version(&self, package_name: &str) -> String;
}

/// Routes packages to registries by scope, trying each in order
pub struct RegistryResolver {
    /// Scope prefix including the trailing slash (e.g., "@acme/")
    scope_prefix: String,
    scoped: Vec<Arc<dyn Registry>>,
    public: Vec<Arc<dyn Registry>>,
}

impl RegistryResolver {
    pub fn new(scope: &str, scoped: Vec<Arc<dyn Registry>>, public: Vec<Arc<dyn Registry>>) -> Self {
        Self {
            scope_prefix: format!("{}/", scope.trim_end_matches('/')),
            scoped,
            public,
        }
    }

    fn registries_for(&self, package_name: &str) -> &[Arc<dyn Registry>] {
        if package_name.starts_with(&self.scope_prefix) {
            &self.scoped
        } else {
            &self.public
        }
    }
}

#[async_trait::async_trait]
impl LatestVersionSource for RegistryResolver {
    async fn resolve_latest_version(&self, package_name: &str) -> String {
        for registry in self.registries_for(package_name) {
            match registry.fetch_latest_version(package_name).await {
                Ok(version) => {
                    debug!("{} resolved {} to {}", registry.name(), package_name, version);
                    return version;
                }
                Err(e) => {
                    debug!("{} failed for {}: {}", registry.name(), package_name, e);
                }
            }
        }

        warn!("Unable to resolve latest version of {}", package_name);
        UNRESOLVED_VERSION.to_string()
    }
}
