//! Registry client for the Bale package manager
//!
//! This crate provides HTTP client functionality for searching, fetching and
//! publishing packages and collections against a Bale registry, with
//! connection pooling and retry logic.

pub mod api;
pub mod client;

// Re-export main types
pub use api::{
    Collection, CollectionListResponse, CollectionPackage, DependencyNode, InstallPlan,
    InstallPlanEntry, NewCollection, Package, PackageSummary, PackageVersion, PublishReceipt,
    ResolveResponse, SearchResponse, User,
};
pub use client::{
    CollectionListOptions, DownloadOptions, InstallOptions, RegistryClient, RegistryConfig,
    SearchOptions, DEFAULT_RETRIES,
};

use bale_core::error::BaleError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, BaleError>;
