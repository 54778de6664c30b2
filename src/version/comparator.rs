//! Major-version gap between a declared version and the latest release
//!
//! Only major numbers are compared. Anything that does not start with a
//! decimal digit (after stripping one range operator) counts as major 0,
//! which biases toward reporting a gap when the declared version is odd.

/// Marker for a dependency a repository does not declare
pub const ABSENT_VERSION: &str = "-";

/// Marker for a package whose latest version could not be resolved
pub const UNRESOLVED_VERSION: &str = "N/A";

/// Remove a single leading `^` or `~` range operator
pub fn strip_range_operator(version: &str) -> &str {
    version
        .strip_prefix('^')
        .or_else(|| version.strip_prefix('~'))
        .unwrap_or(version)
}

/// Extract the major version number
///
/// Returns 0 for the absent and unresolved markers, and for strings with no
/// leading digits.
pub fn major_version(version: &str) -> u64 {
    let cleaned = strip_range_operator(version).trim();
    if cleaned == ABSENT_VERSION || cleaned == UNRESOLVED_VERSION {
        return 0;
    }

    let digits_end = cleaned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(cleaned.len());

    // Saturate absurdly long digit runs instead of failing
    cleaned[..digits_end]
        .parse::<u64>()
        .unwrap_or(if digits_end == 0 { 0 } else { u64::MAX })
}

/// Number of major versions `current` is behind `latest`, never negative
pub fn version_gap(current: &str, latest: &str) -> u64 {
    major_version(latest).saturating_sub(major_version(current))
}
