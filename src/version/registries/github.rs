//! GitHub Packages npm registry implementation

use std::time::Duration;

use semver::Version;
use serde::Deserialize;
use tracing::warn;

use crate::config::{FETCH_TIMEOUT_MS, USER_AGENT};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

/// Default base URL for GitHub API
const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Entry of the GitHub package versions API
#[derive(Debug, Deserialize)]
struct PackageVersion {
    name: String,
}

/// Registry implementation for npm packages published to GitHub Packages
pub struct GitHubPackagesRegistry {
    client: reqwest::Client,
    base_url: String,
    org: String,
    token: Option<String>,
}

impl GitHubPackagesRegistry {
    /// Creates a new GitHubPackagesRegistry with a custom base URL
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

    /// Package name without its `@scope/` prefix
    fn unscoped_name(package_name: &str) -> &str {
        match package_name.strip_prefix('@') {
            Some(rest) => rest.split_once('/').map_or(rest, |(_, name)| name),
            None => package_name,
        }
    }
}

/// Pick the latest from GitHub's listing (newest first)
///
/// Prefers the semantic maximum; falls back to the first entry when no name
/// parses as semver.
fn pick_latest(names: Vec<String>) -> Option<String> {
    let names: Vec<String> = names
        .into_iter()
        .map(|name| name.strip_prefix('v').map(str::to_string).unwrap_or(name))
        .collect();

    names
        .iter()
        .filter_map(|name| Version::parse(name).ok().map(|parsed| (name, parsed)))
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(name, _)| name.clone())
        .or_else(|| names.into_iter().next())
}

#[async_trait::async_trait]
impl Registry for GitHubPackagesRegistry {
    fn name(&self) -> &'static str {
        "github-packages"
    }

    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        let Some(token) = self.token.as_deref() else {
            return Err(RegistryError::MissingCredential("GitHub Packages"));
        };

        let url = format!(
            "{}/orgs/{}/packages/npm/{}/versions",
            self.base_url,
            self.org,
            Self::unscoped_name(package_name)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RegistryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let versions: Vec<PackageVersion> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub package versions response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        pick_latest(versions.into_iter().map(|v| v.name).collect())
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))
    }
}
