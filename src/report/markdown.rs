//! Markdown narrative of an analysis

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::analysis::{AnalysisResult, OutdatedPackage, OutdatedUsage};
use crate::manifest::types::Repository;

const TOP_OUTDATED: usize = 5;
const TOP_LAGGING: usize = 3;
const TOP_ARCHIVED: usize = 5;

/// Severity badge of a major version gap
pub fn gap_badge(versions_behind: u64) -> &'static str {
    match versions_behind {
        0 | 1 => "🟡",
        2 => "🟠",
        _ => "🔴",
    }
}

/// Inputs of the Markdown report besides the analysis itself
pub struct MarkdownContext<'a> {
    pub repositories: &'a [Repository],
    /// Internal npm scope, e.g. `@acme`
    pub scope: &'a str,
    pub generated_at: NaiveDateTime,
}

impl MarkdownContext<'_> {
    fn display_name<'b>(&'b self, slug: &'b str) -> &'b str {
        self.repositories
            .iter()
            .find(|r| r.slug == slug)
            .map(|r| r.display_name.as_str())
            .unwrap_or(slug)
    }

    fn is_internal(&self, package_name: &str) -> bool {
        package_name
            .strip_prefix(self.scope)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn sorted_usages(package: &OutdatedPackage) -> Vec<&OutdatedUsage> {
    let mut usages: Vec<_> = package.apps_using_old_versions.iter().collect();
    usages.sort_by(|a, b| b.versions_behind.cmp(&a.versions_behind));
    usages
}

fn write_usages(out: &mut String, ctx: &MarkdownContext<'_>, package: &OutdatedPackage) {
    for usage in sorted_usages(package) {
        let _ = writeln!(
            out,
            "  - {} **{}**: `{}` ({} major versions behind)",
            gap_badge(usage.versions_behind),
            ctx.display_name(&usage.repo),
            usage.version,
            usage.versions_behind
        );
    }
}

fn write_header(out: &mut String, ctx: &MarkdownContext<'_>) {
    let repositories: Vec<_> = ctx
        .repositories
        .iter()
        .map(|r| r.display_name.as_str())
        .collect();

    let _ = write!(
        out,
        "# 📊 Dependency Analysis Report\n\n\
         **Date:** {}  \n\
         **Repositories analyzed:** {}\n\n\
         ---\n\n",
        ctx.generated_at.format("%Y-%m-%d"),
        repositories.join(", ")
    );
}

fn write_outdated(out: &mut String, ctx: &MarkdownContext<'_>, analysis: &AnalysisResult) {
    out.push_str("## 🚨 Critically Outdated Packages (≥2 major versions)\n\n");

    if analysis.outdated_packages.is_empty() {
        out.push_str("✅ **Excellent!** No package is critically outdated (≥2 major versions).\n\n");
        return;
    }

    let _ = write!(
        out,
        "🚨 **{} critically outdated package(s) detected**\n\n\
         <details>\n<summary>Show critically outdated packages</summary>\n\n",
        analysis.outdated_packages.len()
    );

    for package in &analysis.outdated_packages {
        let _ = writeln!(out, "### 📦 `{}`", package.name);
        let _ = writeln!(out, "- **Latest version:** `{}`", package.latest);
        let _ = writeln!(
            out,
            "- **Largest gap:** {} major version(s)",
            package.major_versions_behind
        );
        out.push_str("- **Affected applications:**\n");
        write_usages(out, ctx, package);
        out.push('\n');
    }

    out.push_str("</details>\n\n");
}

fn write_internal(out: &mut String, ctx: &MarkdownContext<'_>, analysis: &AnalysisResult) {
    let _ = write!(out, "---\n\n## 🏢 Internal Packages ({}/*)\n\n", ctx.scope);

    let internal: Vec<_> = analysis
        .outdated_packages
        .iter()
        .filter(|package| ctx.is_internal(&package.name))
        .collect();

    if internal.is_empty() {
        let _ = write!(
            out,
            "✅ **Excellent!** No {} package is critically outdated.\n\n",
            ctx.scope
        );
        return;
    }

    let _ = write!(
        out,
        "📊 **{} internal package(s) critically outdated**\n\n\
         <details>\n<summary>Show outdated {} packages</summary>\n\n",
        internal.len(),
        ctx.scope
    );

    for package in internal {
        let _ = writeln!(out, "### 🏢 `{}`", package.name);
        let _ = writeln!(out, "- **Latest version:** `{}`", package.latest);
        let _ = writeln!(
            out,
            "- **Gap:** {} major version(s)",
            package.major_versions_behind
        );
        let _ = writeln!(
            out,
            "- **Impact:** {} application(s)",
            package.apps_using_old_versions.len()
        );
        out.push_str("- **Applications on obsolete versions:**\n");
        write_usages(out, ctx, package);
        out.push_str(
            "\n**🚨 Recommended action:** coordinate the upgrade of this internal package with its maintainers.\n\n",
        );
    }

    out.push_str("</details>\n\n");
}

fn write_archived(out: &mut String, ctx: &MarkdownContext<'_>, analysis: &AnalysisResult) {
    let _ = write!(out, "---\n\n## ⚠️ Archived {} Packages\n\n", ctx.scope);

    if analysis.archived_packages.is_empty() {
        let _ = write!(
            out,
            "✅ **Excellent!** No archived {} package is used by the applications.\n\n",
            ctx.scope
        );
        return;
    }

    let _ = write!(
        out,
        "🚨 **CRITICAL**: {} archived package(s) still in use!\n\n\
         <details>\n<summary>Show archived packages still in use</summary>\n\n",
        analysis.archived_packages.len()
    );

    for package in &analysis.archived_packages {
        let _ = writeln!(out, "### 📦 `{}` ❌ ARCHIVED", package.name);
        let _ = writeln!(
            out,
            "- **Applications still using it:** {}\n",
            package.apps_using.len()
        );
        for usage in &package.apps_using {
            let _ = writeln!(out, "  - 🏢 **{}**: `{}`", usage.display_name, usage.version);
        }
        out.push_str("\n**🚨 Urgent:** plan the migration away from this archived package.\n\n");
    }

    out.push_str("</details>\n\n");
}

fn write_lagging(out: &mut String, analysis: &AnalysisResult) {
    out.push_str("---\n\n## 🐌 Lagging Applications\n\n");

    if analysis.lagging_apps.is_empty() {
        out.push_str("✅ **Well done!** No application lags significantly (≥5 outdated packages).\n\n");
        return;
    }

    let _ = write!(
        out,
        "🐌 **{} lagging application(s)**\n\n\
         <details>\n<summary>Show lagging applications</summary>\n\n",
        analysis.lagging_apps.len()
    );

    for app in &analysis.lagging_apps {
        let _ = write!(
            out,
            "### 🏢 {name}\n\
             - **Outdated packages:** {total}\n\
             - **Critical (≥2 versions):** {critical} 🔴\n\
             - **To watch (1 version):** {warning} 🟡\n\n\
             <details>\n<summary>Show packages to upgrade in {name}</summary>\n\n",
            name = app.display_name,
            total = app.outdated_packages.len(),
            critical = app.critical_count(),
            warning = app.warning_count(),
        );

        for dependency in &app.outdated_packages {
            let _ = writeln!(
                out,
                "- {} `{}`: `{}` → `{}` ({} versions)",
                gap_badge(dependency.versions_behind),
                dependency.name,
                dependency.current_version,
                dependency.latest_version,
                dependency.versions_behind
            );
        }

        out.push_str("\n</details>\n\n");
    }

    out.push_str("</details>\n\n");
}

fn write_recommendations(out: &mut String, ctx: &MarkdownContext<'_>, analysis: &AnalysisResult) {
    out.push_str("---\n\n## 📈 Recommendations\n\n### 🎯 Priority Actions\n");

    let mut priority = 0;

    if !analysis.outdated_packages.is_empty() {
        priority += 1;
        let _ = writeln!(out, "{priority}. **Critical packages to upgrade now:**");
        for package in analysis.outdated_packages.iter().take(TOP_OUTDATED) {
            let internal = ctx.is_internal(&package.name);
            let _ = writeln!(
                out,
                "   - {} `{}` ({} versions behind){}",
                if internal { "🏢" } else { "📦" },
                package.name,
                package.major_versions_behind,
                if internal { " (internal package)" } else { "" }
            );
        }
    }

    if !analysis.lagging_apps.is_empty() {
        priority += 1;
        let _ = writeln!(out, "\n{priority}. **Applications needing attention:**");
        for app in analysis.lagging_apps.iter().take(TOP_LAGGING) {
            let _ = writeln!(
                out,
                "   - **{}** ({} outdated packages)",
                app.display_name,
                app.outdated_packages.len()
            );
        }
    }

    if !analysis.archived_packages.is_empty() {
        priority += 1;
        let _ = writeln!(out, "\n{priority}. **🚨 URGENT - archived packages to migrate:**");
        for package in analysis.archived_packages.iter().take(TOP_ARCHIVED) {
            let _ = writeln!(
                out,
                "   - ❌ `{}` (used by {} applications)",
                package.name,
                package.apps_using.len()
            );
        }
        if analysis.archived_packages.len() > TOP_ARCHIVED {
            let _ = writeln!(
                out,
                "   - ... and {} more archived packages",
                analysis.archived_packages.len() - TOP_ARCHIVED
            );
        }
    }

    if priority == 0 {
        out.push_str("Nothing to do, every dependency is within one major version.\n");
    }
}

/// Render the full report
pub fn render(analysis: &AnalysisResult, ctx: &MarkdownContext<'_>) -> String {
    let mut out = String::new();

    write_header(&mut out, ctx);
    write_outdated(&mut out, ctx, analysis);
    write_internal(&mut out, ctx, analysis);
    write_archived(&mut out, ctx, analysis);
    write_lagging(&mut out, analysis);
    write_recommendations(&mut out, ctx, analysis);

    let _ = write!(
        out,
        "\n\n---\n\n*Report generated on {}*\n",
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    out
}
