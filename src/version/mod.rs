//! Version management layer for dependency drift auditing
//!
//! This module provides the pieces that turn package names into latest
//! versions, compare them with declared ranges, and keep fetched data
//! around between runs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Resolver   │────▶│  Registry   │     │    Cache    │
//! │ (by scope)  │     │  (fetch)    │     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ Registries  │     │ Comparator  │
//!                     │(npm,github) │     │ (major gap) │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: JSON file cache of fetched manifests and latest versions
//! - [`comparator`]: Major version extraction and gap computation
//! - [`registry`]: Registry trait for fetching latest versions
//! - [`registries`]: Concrete registry implementations (npm, GitHub Packages, npm CLI)
//! - [`resolver`]: Scope-based routing over registries with graceful fallback
//! - [`error`]: Error types for cache and registry operations

pub mod cache;
pub mod comparator;
pub mod error;
pub mod registries;
pub mod registry;
pub mod resolver;
