//! Result types of the drift analysis

/// A repository declaring an outdated version of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedUsage {
    pub repo: String,
    pub version: String,
    pub versions_behind: u64,
}

/// A package at least two major versions behind in some repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedPackage {
    pub name: String,
    pub latest: String,
    /// Largest gap across all repositories
    pub major_versions_behind: u64,
    /// Every repository with a positive gap, in repository order
    pub apps_using_old_versions: Vec<OutdatedUsage>,
}

/// One outdated dependency of a lagging application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaggingDependency {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub versions_behind: u64,
}

/// A repository with many dependencies behind their latest major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaggingApplication {
    pub repo: String,
    pub display_name: String,
    /// Sorted by gap, largest first
    pub outdated_packages: Vec<LaggingDependency>,
}

impl LaggingApplication {
    /// Dependencies two or more majors behind
    pub fn critical_count(&self) -> usize {
        self.outdated_packages
            .iter()
            .filter(|pkg| pkg.versions_behind >= 2)
            .count()
    }

    /// Dependencies exactly one major behind
    pub fn warning_count(&self) -> usize {
        self.outdated_packages
            .iter()
            .filter(|pkg| pkg.versions_behind == 1)
            .count()
    }
}

/// A repository still declaring an archived package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedUsage {
    pub repo: String,
    pub display_name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPackageUsage {
    /// Fully qualified name (e.g., "@acme/legacy-ui")
    pub name: String,
    pub apps_using: Vec<ArchivedUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub outdated_packages: Vec<OutdatedPackage>,
    pub lagging_apps: Vec<LaggingApplication>,
    pub archived_packages: Vec<ArchivedPackageUsage>,
}
