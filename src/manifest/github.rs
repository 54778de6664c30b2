//! GitHub contents API manifest source

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{FETCH_TIMEOUT_MS, USER_AGENT};
use crate::manifest::source::{ManifestError, ManifestSource};
use crate::manifest::types::{Manifest, Repository};

/// Default base URL for GitHub API
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Response from GitHub contents API
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
}

/// Manifest source reading package.json through the GitHub contents API
pub struct GitHubManifestSource {
    client: reqwest::Client,
    base_url: String,
    org: String,
    token: Option<String>,
}

impl GitHubManifestSource {
    /// Creates a new GitHubManifestSource with a custom base URL
    pub fn new(base_url: &str, org: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            org: org.to_string(),
            token,
        }
    }

    pub fn with_default_base_url(org: &str, token: Option<String>) -> Self {
        Self::new(DEFAULT_BASE_URL, org, token)
    }

    /// Branch tried when the requested one has no manifest
    pub fn fallback_branch(branch: &str) -> &'static str {
        if branch == "master" { "main" } else { "master" }
    }

    /// Fetch the manifest at one branch
    ///
    /// `Ok(None)` means GitHub answered with a non-success status.
    async fn fetch_at(
        &self,
        repository: &Repository,
        branch: &str,
        token: &str,
    ) -> Result<Option<Manifest>, ManifestError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.base_url, self.org, repository.slug, repository.manifest_path, branch
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("GitHub returned status {} for {}", status, url);
            return Ok(None);
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| ManifestError::Decode(e.to_string()))?;

        decode_manifest(&contents.content).map(Some)
    }
}

/// Decode the base64 payload of a contents API response into a manifest
fn decode_manifest(encoded: &str) -> Result<Manifest, ManifestError> {
    // GitHub wraps the base64 payload at 60 columns
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ManifestError::Decode(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| ManifestError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl ManifestSource for GitHubManifestSource {
    async fn fetch_manifest(
        &self,
        repository: &Repository,
        branch: &str,
    ) -> Result<Option<Manifest>, ManifestError> {
        let Some(token) = self.token.as_deref() else {
            return Err(ManifestError::MissingCredential);
        };

        let attempt = match self.fetch_at(repository, branch, token).await {
            Ok(None) => {
                let fallback = Self::fallback_branch(branch);
                debug!(
                    "Retrying {}/{} on branch {}",
                    repository.slug, repository.manifest_path, fallback
                );
                self.fetch_at(repository, fallback, token).await
            }
            other => other,
        };

        match attempt {
            Ok(Some(manifest)) => Ok(Some(manifest)),
            Ok(None) => {
                warn!(
                    "Unable to fetch {}/{}",
                    repository.slug, repository.manifest_path
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Error while fetching {}: {}", repository.slug, e);
                Ok(None)
            }
        }
    }
}
