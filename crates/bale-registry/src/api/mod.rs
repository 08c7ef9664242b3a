//! Bale registry API response types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One package entry in a search/listing response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageSummary {
    /// Package identifier (may be scoped, e.g. "@acme/code-review")
    pub id: String,
    /// Latest published version
    pub version: String,
    pub description: Option<String>,
    /// Package kind (e.g. "prompt", "rules")
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub downloads: Option<u64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Paged search response envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub packages: Vec<PackageSummary>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

/// Envelope for trending/featured listings; pagination metadata is not
/// carried through to callers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageListResponse {
    pub packages: Vec<PackageSummary>,
}

/// Full package record returned by a direct lookup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Package {
    pub id: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(rename = "latestVersion")]
    pub latest_version: Option<String>,
    pub downloads: Option<u64>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Metadata for a specific package version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageVersion {
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    /// Tarball download URL for this version
    #[serde(rename = "tarballUrl")]
    pub tarball_url: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Envelope for the versions listing endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionsResponse {
    pub versions: Vec<PackageVersion>,
}

/// Envelope for the dependencies endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependenciesResponse {
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
}

/// One node of a resolved dependency tree
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyNode {
    pub version: String,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
}

/// Result of a dependency resolution query
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolveResponse {
    /// Package id -> pinned version
    #[serde(default)]
    pub resolved: HashMap<String, String>,
    /// Dependency tree keyed by package id
    #[serde(default)]
    pub tree: HashMap<String, DependencyNode>,
}

/// Registry acknowledgement of a successful publish
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishReceipt {
    pub id: String,
    pub version: String,
    pub message: Option<String>,
}

/// Identity of the authenticated user
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub username: String,
    pub email: Option<String>,
}

/// A curated collection of packages
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Collection {
    pub scope: String,
    pub id: String,
    pub version: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub official: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub packages: Vec<CollectionPackage>,
}

/// One package reference inside a collection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionPackage {
    pub id: String,
    pub version: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Paged collection listing envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionListResponse {
    pub collections: Vec<Collection>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

/// Body for creating a new collection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewCollection {
    pub scope: String,
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub packages: Vec<CollectionPackage>,
}

/// Ordered plan for realizing a collection install
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstallPlan {
    pub packages: Vec<InstallPlanEntry>,
}

/// One step of an install plan
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstallPlanEntry {
    pub id: String,
    pub version: String,
    pub format: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}
