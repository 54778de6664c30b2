//! Manifest layer
//! - types.rs: Repository, Manifest and DependencySnapshot
//! - source.rs: ManifestSource trait definition
//! - github.rs: GitHub contents API implementation
//! - credentials.rs: GitHub token lookup in ~/.npmrc
//! - snapshot.rs: Per-dependency snapshots from fetched manifests

pub mod credentials;
pub mod github;
pub mod snapshot;
pub mod source;
pub mod types;

pub use github::GitHubManifestSource;
pub use source::{ManifestError, ManifestSource};
pub use types::{DependencySnapshot, Manifest, Repository};
