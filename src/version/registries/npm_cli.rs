//! Latest version lookup through the local `npm view` command
//!
//! Used as a last resort for private packages: npm picks up whatever
//! registry and credentials the user's npmrc configures.

use tokio::process::Command;
use tracing::debug;

use crate::version::error::RegistryError;
use crate::version::registry::Registry;

/// Registry implementation shelling out to the npm CLI
pub struct NpmCliRegistry {
    program: String,
}

impl NpmCliRegistry {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn parse_output(package_name: &str, stdout: &[u8]) -> Result<String, RegistryError> {
        let output = String::from_utf8_lossy(stdout);
        let version = output.trim();
        if version.is_empty() {
            Err(RegistryError::NotFound(package_name.to_string()))
        } else {
            Ok(version.to_string())
        }
    }
}

impl Default for NpmCliRegistry {
    fn default() -> Self {
        Self::new("npm")
    }
}

#[async_trait::async_trait]
impl Registry for NpmCliRegistry {
    fn name(&self) -> &'static str {
        "npm-cli"
    }

    async fn fetch_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        let output = Command::new(&self.program)
            .args(["view", package_name, "version"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RegistryError::Command(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            debug!(
                "{} view {} exited with {}",
                self.program, package_name, output.status
            );
            return Err(RegistryError::Command(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        Self::parse_output(package_name, &output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"4.2.0\n".as_slice(), Some("4.2.0"))]
    #[case(b"  1.0.0  ".as_slice(), Some("1.0.0"))]
    #[case(b"\n".as_slice(), None)]
    #[case(b"".as_slice(), None)]
    fn parse_output_returns_expected(#[case] stdout: &[u8], #[case] expected: Option<&str>) {
        let result = NpmCliRegistry::parse_output("@acme/ui", stdout).ok();
        assert_eq!(result.as_deref(), expected);
    }

    #[tokio::test]
    async fn fetch_latest_version_reports_missing_program() {
        let registry = NpmCliRegistry::new("definitely-not-an-npm-binary");

        let result = registry.fetch_latest_version("@acme/ui").await;

        assert!(matches!(result, Err(RegistryError::Command(_))));
    }
}
