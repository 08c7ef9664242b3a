//! HTTP client implementation with connection pooling and retry logic

use std::collections::HashMap;
use std::time::Duration;

use reqwest::multipart;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use bale_core::error::BaleError;
use bale_core::types::PackageManifest;

use crate::api::{
    Collection, CollectionListResponse, DependenciesResponse, InstallPlan, NewCollection, Package,
    PackageListResponse, PackageSummary, PackageVersion, PublishReceipt, ResolveResponse,
    SearchResponse, User, VersionsResponse,
};
use crate::RegistryResult;

/// Total attempts made per request (first try included)
pub const DEFAULT_RETRIES: u32 = 3;

/// Default page size for trending/featured listings
const DEFAULT_LIST_LIMIT: u32 = 20;

/// Placeholder version used when a collection lookup omits one
const LATEST_VERSION: &str = "latest";

/// Configuration for registry access
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry base URL; a trailing slash is stripped at construction
    pub url: String,
    /// Bearer token for authenticated operations
    pub token: Option<String>,
}

impl RegistryConfig {
    /// Create an unauthenticated configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    /// Attach a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Optional filters for package search
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Package kind filter (e.g. "prompt", "rules")
    pub package_type: Option<String>,
    /// Tag filters; each tag becomes a repeated `tags=` query parameter
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Optional filters for collection listing
#[derive(Debug, Clone, Default)]
pub struct CollectionListOptions {
    pub query: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub official: Option<bool>,
    pub scope: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Parameters for a collection install-plan query
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub scope: String,
    pub id: String,
    /// Pin the collection version; appended to the path as `{id}@{version}`
    pub version: Option<String>,
    /// Preferred artifact format for planned packages
    pub format: Option<String>,
    /// Leave optional collection members out of the plan
    pub skip_optional: bool,
}

impl InstallOptions {
    pub fn new(scope: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            id: id.into(),
            version: None,
            format: None,
            skip_optional: false,
        }
    }
}

/// Options for tarball download
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Requested artifact format; only forwarded to the configured registry
    pub format: Option<String>,
}

/// Error body shape the registry uses for non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Main HTTP client for Bale registry operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    http: Client,
    /// Base registry URL, trailing slash normalized away
    base: Url,
    /// Bearer token; always wins over caller-supplied Authorization headers
    token: Option<String>,
}

impl RegistryClient {
    /// Create a new registry client. No network activity happens here.
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        let trimmed = config.url.trim_end_matches('/');
        let base = Url::parse(trimmed).map_err(|e| BaleError::InvalidUrl {
            url: config.url.clone(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(BaleError::InvalidUrl {
                url: config.url.clone(),
                message: "URL cannot be used as a registry base".to_string(),
            });
        }

        let http = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            // Per-attempt request timeout
            .timeout(Duration::from_secs(30))
            // Enable gzip compression
            .gzip(true)
            // User agent
            .user_agent(concat!("bale/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BaleError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            http,
            base,
            token: config.token,
        })
    }

    /// Normalized base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Build an `/api/v1` endpoint URL. Path segments are percent-encoded,
    /// so scoped package ids survive insertion.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // base is validated as a base URL at construction
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    /// Issue a request with bounded retries and exponential backoff.
    ///
    /// The request is rebuilt from `build` on every attempt so non-cloneable
    /// bodies (multipart) can be retried. The configured bearer token is
    /// applied after the builder, so it wins over any caller-set
    /// Authorization header.
    ///
    /// Retried: 429 (honoring `Retry-After` seconds), 5xx, and transient
    /// transport failures (connect/timeout). Everything else settles on the
    /// first attempt; the final response is returned regardless of status.
    ///
    /// Content-Type comes from the builder: `.json(..)` sets
    /// `application/json`, `.multipart(..)` sets the form boundary, and
    /// bodyless requests carry no Content-Type header at all.
    async fn send_with_retry<F>(&self, build: F, retries: u32) -> RegistryResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        for attempt in 0..retries {
            let last = attempt + 1 >= retries;
            let mut request = build();
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS && !last {
                        let wait = retry_after(&response).unwrap_or_else(|| backoff_delay(attempt));
                        warn!(
                            "Registry rate limited request, retrying in {:?} (attempt {}/{})",
                            wait,
                            attempt + 1,
                            retries
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    if status.is_server_error() && !last {
                        let wait = backoff_delay(attempt);
                        warn!(
                            "Registry returned {}, retrying in {:?} (attempt {}/{})",
                            status,
                            wait,
                            attempt + 1,
                            retries
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    debug!("Request settled with status {}", status);
                    return Ok(response);
                }
                Err(error) => {
                    let transient = error.is_connect() || error.is_timeout();
                    if transient && !last {
                        let wait = backoff_delay(attempt);
                        warn!(
                            "Transport error ({}), retrying in {:?} (attempt {}/{})",
                            error,
                            wait,
                            attempt + 1,
                            retries
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(BaleError::network(
                        format!("Request failed: {}", error),
                        error,
                    ));
                }
            }
        }

        // Only reachable with a zero retry budget
        Err(BaleError::Network {
            message: "Request failed after retries".to_string(),
            source: None,
        })
    }

    /// Send with the default retry budget and decode a JSON success body
    async fn request_json<T, F>(&self, build: F) -> RegistryResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let response = self.send_with_retry(build, DEFAULT_RETRIES).await?;
        if !response.status().is_success() {
            return Err(response_error(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BaleError::InvalidResponse {
                message: e.to_string(),
            })
    }

    /// Fail fast with an authentication error when no token is configured
    fn require_token(&self, hint: &str) -> RegistryResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| BaleError::authentication_required(hint))
    }

    /// Search packages by free-text query with optional filters
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> RegistryResult<SearchResponse> {
        let mut url = self.endpoint(&["search"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(kind) = &options.package_type {
                pairs.append_pair("type", kind);
            }
            for tag in &options.tags {
                pairs.append_pair("tags", tag);
            }
            if let Some(author) = &options.author {
                pairs.append_pair("author", author);
            }
            if let Some(limit) = options.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = options.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// Fetch a package record by id
    pub async fn get_package(&self, id: &str) -> RegistryResult<Package> {
        let url = self.endpoint(&["packages", id]);
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// Fetch metadata for one version of a package
    pub async fn get_package_version(
        &self,
        id: &str,
        version: &str,
    ) -> RegistryResult<PackageVersion> {
        let url = self.endpoint(&["packages", id, version]);
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// List all published versions of a package
    pub async fn get_package_versions(&self, id: &str) -> RegistryResult<Vec<PackageVersion>> {
        let url = self.endpoint(&["packages", id, "versions"]);
        let response: VersionsResponse = self.request_json(|| self.http.get(url.clone())).await?;
        Ok(response.versions)
    }

    /// Fetch the direct dependencies of a package, optionally at a version
    pub async fn get_package_dependencies(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> RegistryResult<HashMap<String, String>> {
        let url = match version {
            Some(version) => self.endpoint(&["packages", id, version, "dependencies"]),
            None => self.endpoint(&["packages", id, "dependencies"]),
        };
        let response: DependenciesResponse =
            self.request_json(|| self.http.get(url.clone())).await?;
        Ok(response.dependencies)
    }

    /// Resolve the full dependency tree for a package
    pub async fn resolve_dependencies(
        &self,
        id: &str,
        version: Option<&str>,
    ) -> RegistryResult<ResolveResponse> {
        let mut url = self.endpoint(&["packages", id, "resolve"]);
        if let Some(version) = version {
            url.query_pairs_mut().append_pair("version", version);
        }
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// List trending packages
    pub async fn get_trending(
        &self,
        package_type: Option<&str>,
        limit: Option<u32>,
    ) -> RegistryResult<Vec<PackageSummary>> {
        self.package_listing("trending", package_type, limit).await
    }

    /// List featured packages
    pub async fn get_featured(
        &self,
        package_type: Option<&str>,
        limit: Option<u32>,
    ) -> RegistryResult<Vec<PackageSummary>> {
        self.package_listing("featured", package_type, limit).await
    }

    async fn package_listing(
        &self,
        kind: &str,
        package_type: Option<&str>,
        limit: Option<u32>,
    ) -> RegistryResult<Vec<PackageSummary>> {
        let mut url = self.endpoint(&["search", kind]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(package_type) = package_type {
                pairs.append_pair("type", package_type);
            }
            pairs.append_pair(
                "limit",
                &limit.unwrap_or(DEFAULT_LIST_LIMIT).to_string(),
            );
        }
        let response: PackageListResponse = self.request_json(|| self.http.get(url.clone())).await?;
        Ok(response.packages)
    }

    /// Download a package tarball as raw bytes.
    ///
    /// Downloads make exactly one attempt; any non-2xx status is a hard
    /// failure. When a format is requested and the URL points at this
    /// client's registry, the format is forwarded as a query parameter.
    pub async fn download_package(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> RegistryResult<Vec<u8>> {
        let mut target = Url::parse(url).map_err(|e| BaleError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if let Some(format) = &options.format {
            // Full-origin match (scheme, host, port); a mirror on the same
            // hostname but a different port must not receive the parameter
            if target.origin() == self.base.origin() {
                target.query_pairs_mut().append_pair("format", format);
            }
        }

        let response = self.send_with_retry(|| self.http.get(target.clone()), 1).await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(BaleError::Download {
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown")
                    .to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BaleError::network("Failed to read package tarball".to_string(), e))?;
        Ok(bytes.to_vec())
    }

    /// Publish a package as a multipart upload of manifest plus tarball.
    ///
    /// Requires a bearer token; fails before any network call without one.
    /// The multipart content type (and boundary) is left to the HTTP layer.
    pub async fn publish(
        &self,
        manifest: &PackageManifest,
        tarball: Vec<u8>,
    ) -> RegistryResult<PublishReceipt> {
        self.require_token("log in before publishing packages")?;

        let manifest_json = serde_json::to_string(manifest).map_err(|e| BaleError::Encode {
            message: e.to_string(),
        })?;
        let url = self.endpoint(&["packages"]);

        self.request_json(|| {
            let form = multipart::Form::new()
                .text("manifest", manifest_json.clone())
                .part(
                    "tarball",
                    multipart::Part::bytes(tarball.clone()).file_name("package.tgz"),
                );
            self.http.post(url.clone()).multipart(form)
        })
        .await
    }

    /// Identify the authenticated user
    pub async fn whoami(&self) -> RegistryResult<User> {
        self.require_token("no credentials configured; log in to identify yourself")?;
        let url = self.endpoint(&["auth", "me"]);
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// List collections with optional filters
    pub async fn get_collections(
        &self,
        options: &CollectionListOptions,
    ) -> RegistryResult<CollectionListResponse> {
        let mut url = self.endpoint(&["collections"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(query) = &options.query {
                pairs.append_pair("query", query);
            }
            if let Some(category) = &options.category {
                pairs.append_pair("category", category);
            }
            if let Some(tag) = &options.tag {
                pairs.append_pair("tag", tag);
            }
            if let Some(official) = options.official {
                pairs.append_pair("official", if official { "true" } else { "false" });
            }
            if let Some(scope) = &options.scope {
                pairs.append_pair("scope", scope);
            }
            if let Some(limit) = options.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = options.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// Fetch one collection; the version defaults to "latest"
    pub async fn get_collection(
        &self,
        scope: &str,
        id: &str,
        version: Option<&str>,
    ) -> RegistryResult<Collection> {
        let url = self.endpoint(&["collections", scope, id, version.unwrap_or(LATEST_VERSION)]);
        self.request_json(|| self.http.get(url.clone())).await
    }

    /// Ask the registry to plan a collection install.
    ///
    /// This is a planning query only; nothing is installed or mutated.
    pub async fn install_collection(&self, options: &InstallOptions) -> RegistryResult<InstallPlan> {
        let id_segment = match &options.version {
            Some(version) => format!("{}@{}", options.id, version),
            None => options.id.clone(),
        };
        let mut url = self.endpoint(&["collections", &options.scope, &id_segment, "install"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(format) = &options.format {
                pairs.append_pair("format", format);
            }
            if options.skip_optional {
                pairs.append_pair("skipOptional", "true");
            }
        }
        self.request_json(|| self.http.post(url.clone())).await
    }

    /// Create a new collection. Requires a bearer token.
    pub async fn create_collection(&self, data: &NewCollection) -> RegistryResult<Collection> {
        self.require_token("log in before creating collections")?;
        let url = self.endpoint(&["collections"]);
        self.request_json(|| self.http.post(url.clone()).json(data))
            .await
    }
}

/// Exponential backoff: 2^attempt seconds
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1u64 << attempt))
}

/// Parse a Retry-After header as whole seconds
fn retry_after(response: &Response) -> Option<Duration> {
    let seconds = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_millis(seconds * 1000))
}

/// Turn a settled non-2xx response into a registry error.
///
/// Prefers the JSON body's `error` field, then `message`, then the HTTP
/// status line.
async fn response_error(response: Response) -> BaleError {
    let status = response.status();
    let fallback = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error.or(body.message).unwrap_or(fallback),
        Err(_) => fallback,
    };
    BaleError::Registry {
        status: status.as_u16(),
        message,
    }
}
