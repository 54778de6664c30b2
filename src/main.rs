use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dependency_drift::analysis::ArchivedPackages;
use dependency_drift::audit::{AuditOutcome, Auditor};
use dependency_drift::config::{AuditConfig, cache_dir, npmrc_path};
use dependency_drift::manifest::GitHubManifestSource;
use dependency_drift::manifest::credentials::load_npmrc_token;
use dependency_drift::report::{ReportPaths, write_reports};
use dependency_drift::version::cache::Cache;
use dependency_drift::version::registries::{GitHubPackagesRegistry, NpmCliRegistry, NpmRegistry};
use dependency_drift::version::registry::Registry;
use dependency_drift::version::resolver::RegistryResolver;

#[derive(Parser)]
#[command(name = "dependency-drift")]
#[command(version, about = "Audit npm dependency drift across GitHub repositories")]
struct Cli {
    /// Branch to read package.json from (defaults to the configured branch)
    #[arg(short, long)]
    branch: Option<String>,

    /// Output CSV path; the Markdown report and version tables are written next to it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Repositories to audit (defaults to every configured repository)
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    repos: Vec<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache directory (defaults to $XDG_CACHE_HOME/dependency-drift)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Always fetch fresh data
    #[arg(long)]
    no_cache: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dependency_drift=info"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}

fn default_output_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "./reports/dependencies-analysis-{}.csv",
        now.format("%Y-%m-%dT%H-%M-%S")
    ))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli
        .config
        .as_deref()
        .map(AuditConfig::from_file)
        .transpose()?
        .unwrap_or_default();

    let branch = cli.branch.unwrap_or_else(|| config.default_branch.clone());
    let catalog = config.catalog();
    let repositories = if cli.repos.is_empty() {
        catalog.all()
    } else {
        catalog.resolve_all(cli.repos.as_slice())
    };
    let scope = config.internal_scope();

    let token = npmrc_path().and_then(|path| load_npmrc_token(&path));

    let manifests = Arc::new(GitHubManifestSource::new(
        &config.github.api_base,
        &config.github.org,
        token.clone(),
    ));

    let scoped: Vec<Arc<dyn Registry>> = vec![
        Arc::new(GitHubPackagesRegistry::new(
            &config.github.api_base,
            &config.github.org,
            token,
        )),
        Arc::new(NpmCliRegistry::default()),
    ];
    let public: Vec<Arc<dyn Registry>> = vec![Arc::new(NpmRegistry::new(&config.npm.registry_base))];
    let resolver = Arc::new(RegistryResolver::new(&scope, scoped, public));

    let storer = if cli.no_cache {
        None
    } else {
        let dir = cli.cache_dir.unwrap_or_else(cache_dir);
        info!("Using cache directory {:?}", dir);
        Some(Arc::new(Cache::new(&dir, config.cache.validity())))
    };

    let auditor = Auditor::new(
        storer,
        manifests,
        resolver,
        ArchivedPackages::new(&scope, &config.archived_packages),
    );

    info!(
        "Auditing {} repositories on branch {}",
        repositories.len(),
        branch
    );
    let outcome = auditor.run(&branch, &repositories).await?;

    let now = Local::now();
    let output = cli.output.unwrap_or_else(|| default_output_path(now));
    let paths = write_reports(&outcome, &output, &scope, now.naive_local())?;

    print_summary(&outcome, &paths);
    Ok(())
}

fn print_summary(outcome: &AuditOutcome, paths: &ReportPaths) {
    let analysis = &outcome.analysis;

    println!("\nSummary:");
    println!("  Repositories:        {}", outcome.repositories.len());
    println!("  Dependencies:        {}", outcome.snapshots.len());
    println!("  Critically outdated: {}", analysis.outdated_packages.len());
    println!("  Lagging apps:        {}", analysis.lagging_apps.len());
    println!("  Archived in use:     {}", analysis.archived_packages.len());
    if outcome.from_cache {
        println!("  (data served from cache)");
    }
    println!("\nReports:");
    println!("  {}", paths.latest.display());
    println!("  {}", paths.versions.display());
    println!("  {}", paths.markdown.display());
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
