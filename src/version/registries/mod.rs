//! Registry implementations for fetching latest package versions

pub mod github;
pub mod npm;
pub mod npm_cli;

pub use github::GitHubPackagesRegistry;
pub use npm::NpmRegistry;
pub use npm_cli::NpmCliRegistry;
