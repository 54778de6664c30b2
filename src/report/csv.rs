//! CSV tables of latest and declared versions
//!
//! Both tables start with a UTF-8 byte order mark so spreadsheet tools pick
//! the right encoding, and use CRLF line endings.

use crate::manifest::types::{DependencySnapshot, Repository};
use crate::version::comparator::ABSENT_VERSION;

const BOM: &str = "\u{FEFF}";
const LINE_ENDING: &str = "\r\n";

/// Quote a field when it holds a delimiter, a quote or a line break
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_rows(rows: impl Iterator<Item = Vec<String>>) -> String {
    let lines: Vec<String> = rows
        .map(|row| {
            row.iter()
                .map(|field| escape_field(field))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();

    format!("{}{}", BOM, lines.join(LINE_ENDING))
}

/// `Package,Latest` table, one row per snapshot
pub fn latest_table(snapshots: &[DependencySnapshot]) -> String {
    let header = vec!["Package".to_string(), "Latest".to_string()];
    let rows = snapshots
        .iter()
        .map(|snapshot| vec![snapshot.name.clone(), snapshot.latest.clone()]);

    render_rows(std::iter::once(header).chain(rows))
}

/// `Package` plus one column per repository display name
pub fn versions_table(snapshots: &[DependencySnapshot], repositories: &[Repository]) -> String {
    let header: Vec<String> = std::iter::once("Package".to_string())
        .chain(repositories.iter().map(|r| r.display_name.clone()))
        .collect();

    let rows = snapshots.iter().map(|snapshot| {
        std::iter::once(snapshot.name.clone())
            .chain(repositories.iter().map(|repository| {
                snapshot
                    .versions
                    .get(&repository.slug)
                    .filter(|version| !version.is_empty())
                    .cloned()
                    .unwrap_or_else(|| ABSENT_VERSION.to_string())
            }))
            .collect::<Vec<String>>()
    });

    render_rows(std::iter::once(header).chain(rows))
}
