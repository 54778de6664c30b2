//! Report sinks
//! - csv.rs: latest and per-repository version tables
//! - markdown.rs: narrative report of the analysis

pub mod csv;
pub mod markdown;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

use crate::audit::AuditOutcome;
use crate::report::markdown::MarkdownContext;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Files produced for an output path `X.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// `X-latest.csv`
    pub latest: PathBuf,
    /// `X-versions.csv`
    pub versions: PathBuf,
    /// `X.md`
    pub markdown: PathBuf,
}

impl ReportPaths {
    pub fn from_output(output: &Path) -> Self {
        let base = match output.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => output.with_extension(""),
            _ => output.to_path_buf(),
        };
        let stem = base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sibling = |suffix: &str| base.with_file_name(format!("{stem}{suffix}"));

        Self {
            latest: sibling("-latest.csv"),
            versions: sibling("-versions.csv"),
            markdown: sibling(".md"),
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)
}

/// Write the CSV tables and the Markdown report next to `output`
pub fn write_reports(
    outcome: &AuditOutcome,
    output: &Path,
    scope: &str,
    generated_at: NaiveDateTime,
) -> Result<ReportPaths, ReportError> {
    let paths = ReportPaths::from_output(output);

    write_file(&paths.latest, &csv::latest_table(&outcome.snapshots))?;
    write_file(
        &paths.versions,
        &csv::versions_table(&outcome.snapshots, &outcome.repositories),
    )?;
    info!("CSV reports written to {:?} and {:?}", paths.latest, paths.versions);

    let markdown = markdown::render(
        &outcome.analysis,
        &MarkdownContext {
            repositories: &outcome.repositories,
            scope,
            generated_at,
        },
    );
    write_file(&paths.markdown, &markdown)?;
    info!("Markdown report written to {:?}", paths.markdown);

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;
    use crate::manifest::types::{DependencySnapshot, Repository};
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("reports/run.csv", "reports/run-latest.csv", "reports/run-versions.csv", "reports/run.md")]
    #[case("run.CSV", "run-latest.csv", "run-versions.csv", "run.md")]
    #[case("out/run", "out/run-latest.csv", "out/run-versions.csv", "out/run.md")]
    #[case("a.b/run.v2.csv", "a.b/run.v2-latest.csv", "a.b/run.v2-versions.csv", "a.b/run.v2.md")]
    fn from_output_derives_sibling_files(
        #[case] output: &str,
        #[case] latest: &str,
        #[case] versions: &str,
        #[case] markdown: &str,
    ) {
        let paths = ReportPaths::from_output(Path::new(output));

        assert_eq!(
            paths,
            ReportPaths {
                latest: PathBuf::from(latest),
                versions: PathBuf::from(versions),
                markdown: PathBuf::from(markdown),
            }
        );
    }

    #[test]
    fn write_reports_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("nested/dir/run.csv");
        let outcome = AuditOutcome {
            repositories: vec![Repository::fallback("web")],
            snapshots: vec![DependencySnapshot {
                name: "react".to_string(),
                latest: "19.0.0".to_string(),
                versions: IndexMap::from([("web".to_string(), "16.0.0".to_string())]),
            }],
            analysis: AnalysisResult::default(),
            from_cache: false,
        };
        let generated_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let paths = write_reports(&outcome, &output, "@acme", generated_at).unwrap();

        let latest = std::fs::read_to_string(&paths.latest).unwrap();
        assert_eq!(latest, "\u{FEFF}Package,Latest\r\nreact,19.0.0");
        let versions = std::fs::read_to_string(&paths.versions).unwrap();
        assert_eq!(versions, "\u{FEFF}Package,web\r\nreact,16.0.0");
        let markdown = std::fs::read_to_string(&paths.markdown).unwrap();
        assert!(markdown.contains("**Date:** 2024-05-01"));
    }
}
