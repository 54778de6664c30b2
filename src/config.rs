use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::manifest::types::Repository;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default cache validity window in hours
pub const DEFAULT_CACHE_VALIDITY_HOURS: i64 = 24;

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// User agent sent with every HTTP request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Manifest path used when a repository has no explicit one
pub const DEFAULT_MANIFEST_PATH: &str = "package.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Audit configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    pub github: GitHubConfig,
    pub npm: NpmConfig,
    pub default_branch: String,
    pub repositories: Vec<RepositoryConfig>,
    /// Archived internal packages, without the organisation scope
    pub archived_packages: Vec<String>,
    pub cache: CacheConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            npm: NpmConfig::default(),
            default_branch: "master".to_string(),
            repositories: default_repositories(),
            archived_packages: Vec::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file. Missing fields use defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// npm scope of the organisation's internal packages, e.g. `@acme`
    pub fn internal_scope(&self) -> String {
        format!("@{}", self.github.org)
    }

    pub fn catalog(&self) -> RepositoryCatalog {
        RepositoryCatalog::new(&self.repositories)
    }
}

/// GitHub-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub org: String,
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            org: "fulll".to_string(),
            api_base: "https://api.github.com".to_string(),
        }
    }
}

/// npm registry configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct NpmConfig {
    pub registry_base: String,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            registry_base: "https://registry.npmjs.org".to_string(),
        }
    }
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// How long a cached snapshot stays valid, in hours
    pub validity_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            validity_hours: DEFAULT_CACHE_VALIDITY_HOURS,
        }
    }
}

impl CacheConfig {
    /// Validity window; out-of-range values fall back to the default
    pub fn validity(&self) -> TimeDelta {
        TimeDelta::try_hours(self.validity_hours)
            .filter(|validity| *validity >= TimeDelta::zero())
            .unwrap_or_else(|| TimeDelta::hours(DEFAULT_CACHE_VALIDITY_HOURS))
    }
}

/// A repository entry in the configuration file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub slug: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub manifest_path: Option<String>,
}

impl RepositoryConfig {
    fn new(slug: &str, display_name: &str, manifest_path: &str) -> Self {
        Self {
            slug: slug.to_string(),
            display_name: Some(display_name.to_string()),
            manifest_path: Some(manifest_path.to_string()),
        }
    }
}

fn default_repositories() -> Vec<RepositoryConfig> {
    [
        ("training.web", "Training", "package.json"),
        ("crm.web", "CRM", "package.json"),
        ("portal.web", "Portal", "package.json"),
        ("bridge-admin.web", "Admin", "package.json"),
        ("marketing.web", "Marketing", "package.json"),
        ("store.web", "Store", "package.json"),
        ("task-manager", "Tasks", "package.json"),
        ("document-manager.web", "Document", "package.json"),
        ("pdp-gateway.web", "PA", "package.json"),
        ("messenger", "Messenger", "package.json"),
        ("simulators.web", "Simulator", "package.json"),
        ("pilotage", "Pilotage", "front-end/package.json"),
        ("taxation", "VAT Assistant", "front-end/package.json"),
    ]
    .into_iter()
    .map(|(slug, name, path)| RepositoryConfig::new(slug, name, path))
    .collect()
}

/// Immutable slug -> repository lookup table
///
/// Unknown slugs resolve to a repository whose display name is the slug
/// itself and whose manifest lives at the default path.
#[derive(Debug, Clone, Default)]
pub struct RepositoryCatalog {
    repositories: IndexMap<String, Repository>,
}

impl RepositoryCatalog {
    pub fn new(entries: &[RepositoryConfig]) -> Self {
        let repositories = entries
            .iter()
            .map(|entry| {
                let repository = Repository {
                    slug: entry.slug.clone(),
                    display_name: entry
                        .display_name
                        .clone()
                        .unwrap_or_else(|| entry.slug.clone()),
                    manifest_path: entry
                        .manifest_path
                        .clone()
                        .unwrap_or_else(|| DEFAULT_MANIFEST_PATH.to_string()),
                };
                (entry.slug.clone(), repository)
            })
            .collect();

        Self { repositories }
    }

    pub fn resolve(&self, slug: &str) -> Repository {
        self.repositories
            .get(slug)
            .cloned()
            .unwrap_or_else(|| Repository::fallback(slug))
    }

    /// Resolve a list of slugs, preserving order and dropping duplicates
    pub fn resolve_all<S: AsRef<str>>(&self, slugs: &[S]) -> Vec<Repository> {
        let mut seen = std::collections::HashSet::new();
        slugs
            .iter()
            .map(AsRef::as_ref)
            .filter(|slug| seen.insert(slug.to_string()))
            .map(|slug| self.resolve(slug))
            .collect()
    }

    pub fn all(&self) -> Vec<Repository> {
        self.repositories.values().cloned().collect()
    }
}

/// Returns the path to the cache directory for dependency-drift.
/// Uses $XDG_CACHE_HOME/dependency-drift if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/dependency-drift,
/// or ./dependency-drift if neither is available.
pub fn cache_dir() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the user's npmrc file holding the registry token.
pub fn npmrc_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".npmrc"))
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));

    cache_dir.join("dependency-drift")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn audit_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<AuditConfig>(json!({
            "cache": {
                "validityHours": 6
            }
        }))
        .unwrap();

        assert_eq!(result.cache.validity_hours, 6);
        assert_eq!(result.default_branch, "master");
        assert_eq!(result.github, GitHubConfig::default());
        assert_eq!(result.repositories.len(), 13);
    }

    #[test]
    fn audit_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<AuditConfig>(json!({
            "github": { "org": "acme", "apiBase": "http://localhost:1234" },
            "npm": { "registryBase": "http://localhost:5678" },
            "defaultBranch": "main",
            "repositories": [
                { "slug": "shop.web", "displayName": "Shop", "manifestPath": "app/package.json" },
                { "slug": "billing" }
            ],
            "archivedPackages": ["legacy-ui"],
            "cache": { "validityHours": 12 }
        }))
        .unwrap();

        assert_eq!(
            result,
            AuditConfig {
                github: GitHubConfig {
                    org: "acme".to_string(),
                    api_base: "http://localhost:1234".to_string(),
                },
                npm: NpmConfig {
                    registry_base: "http://localhost:5678".to_string(),
                },
                default_branch: "main".to_string(),
                repositories: vec![
                    RepositoryConfig::new("shop.web", "Shop", "app/package.json"),
                    RepositoryConfig {
                        slug: "billing".to_string(),
                        display_name: None,
                        manifest_path: None,
                    },
                ],
                archived_packages: vec!["legacy-ui".to_string()],
                cache: CacheConfig { validity_hours: 12 },
            }
        );
        assert_eq!(result.internal_scope(), "@acme");
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = AuditConfig::from_file(&path);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn catalog_resolves_known_repository() {
        let catalog = AuditConfig::default().catalog();

        let repository = catalog.resolve("pilotage");

        assert_eq!(repository.display_name, "Pilotage");
        assert_eq!(repository.manifest_path, "front-end/package.json");
    }

    #[test]
    fn catalog_falls_back_to_identity_for_unknown_slug() {
        let catalog = AuditConfig::default().catalog();

        let repository = catalog.resolve("unknown.web");

        assert_eq!(
            repository,
            Repository {
                slug: "unknown.web".to_string(),
                display_name: "unknown.web".to_string(),
                manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            }
        );
    }

    #[test]
    fn catalog_resolve_all_drops_duplicates_and_keeps_order() {
        let catalog = AuditConfig::default().catalog();

        let repositories = catalog.resolve_all(&["crm.web", "store.web", "crm.web"]);

        let slugs: Vec<_> = repositories.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["crm.web", "store.web"]);
    }

    #[test]
    fn cache_dir_with_env_uses_xdg_cache_home_when_set() {
        let path = cache_dir_with_env(
            Some("/tmp/test-cache".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-cache/dependency-drift"));
    }

    #[test]
    fn cache_dir_with_env_falls_back_to_home_cache() {
        let path = cache_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.cache/dependency-drift"));
    }

    #[test]
    fn cache_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = cache_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./dependency-drift"));
    }

    #[rstest::rstest]
    #[case(12, 12)]
    #[case(-1, DEFAULT_CACHE_VALIDITY_HOURS)]
    #[case(i64::MAX, DEFAULT_CACHE_VALIDITY_HOURS)]
    fn cache_validity_rejects_out_of_range_hours(#[case] hours: i64, #[case] expected: i64) {
        let config = CacheConfig {
            validity_hours: hours,
        };

        assert_eq!(config.validity(), TimeDelta::hours(expected));
    }
}
