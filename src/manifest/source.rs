//! Manifest source trait for fetching package.json files from repositories

#[cfg(test)]
use mockall::automock;

use thiserror::Error;

use crate::manifest::types::{Manifest, Repository};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("No GitHub token found in ~/.npmrc")]
    MissingCredential,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode manifest: {0}")]
    Decode(String),
}

/// Trait for fetching a repository's manifest
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetches the manifest of a repository at a branch
    ///
    /// # Returns
    /// * `Ok(Some(Manifest))` - The parsed manifest
    /// * `Ok(None)` - The manifest could not be fetched; the repository
    ///   contributes no declared versions
    /// * `Err(ManifestError::MissingCredential)` - Fatal, the run must stop
    async fn fetch_manifest(
        &self,
        repository: &Repository,
        branch: &str,
    ) -> Result<Option<Manifest>, ManifestError>;
}
