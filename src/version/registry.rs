//! Registry trait for fetching the latest published version of a package

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;

/// Trait for fetching package versions from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Short name used in log messages (e.g., "npm")
    fn name(&self) -> &'static str;

    /// Fetches the latest published version of a package
    ///
    /// # Arguments
    /// * `package_name` - The full package name (e.g., "@types/node")
    ///
    /// # Returns
    /// * `Ok(String)` - The latest version string
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError>;
}
