//! GitHub token lookup in the user's npmrc

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

static AUTH_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*//npm\.pkg\.github\.com/:_authToken=(.+)$").expect("valid regex")
});

/// Extract the GitHub Packages token from npmrc content
pub fn parse_npmrc_token(content: &str) -> Option<String> {
    AUTH_TOKEN_PATTERN
        .captures(content)
        .map(|captures| captures[1].trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Read the GitHub Packages token from an npmrc file
///
/// A missing file or missing entry is logged and yields `None`; whether that
/// is fatal is up to the caller.
pub fn load_npmrc_token(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path)
        .inspect_err(|e| warn!("Unable to read {:?}: {}", path, e))
        .ok()?;

    match parse_npmrc_token(&content) {
        Some(token) => {
            info!("GitHub token loaded from {:?}", path);
            Some(token)
        }
        None => {
            warn!("No GitHub token found in {:?}", path);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("//npm.pkg.github.com/:_authToken=ghp_abc123\n", Some("ghp_abc123"))]
    #[case(
        "registry=https://registry.npmjs.org/\n@acme:registry=https://npm.pkg.github.com\n//npm.pkg.github.com/:_authToken=ghp_xyz  \n",
        Some("ghp_xyz")
    )]
    #[case("//registry.npmjs.org/:_authToken=npm_token\n", None)]
    #[case("//npm.pkg.github.com/:_authToken=\n", None)]
    #[case("", None)]
    fn parse_npmrc_token_returns_expected(#[case] content: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_npmrc_token(content), expected.map(str::to_string));
    }

    #[test]
    fn load_npmrc_token_returns_none_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();

        assert_eq!(load_npmrc_token(&temp_dir.path().join(".npmrc")), None);
    }

    #[test]
    fn load_npmrc_token_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".npmrc");
        std::fs::write(&path, "//npm.pkg.github.com/:_authToken=ghp_file\n").unwrap();

        assert_eq!(load_npmrc_token(&path), Some("ghp_file".to_string()));
    }
}
