//! Package manifest types.
//!
//! Defines the manifest record a package carries when it is published to the
//! registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Manifest describing a publishable package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Package kind as understood by the registry (e.g. "prompt", "rules")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dependencies: HashMap<String, String>,
}

impl PackageManifest {
    /// Create new manifest with required fields
    pub fn new(name: String, version: String) -> Self {
        Self {
            name,
            version,
            description: None,
            package_type: None,
            tags: Vec::new(),
            author: None,
            license: None,
            dependencies: HashMap::new(),
        }
    }

    /// Check if this is a valid package name.
    ///
    /// Scoped names like `@scope/pkg` are allowed; the scope separator is the
    /// only place a `/` may appear.
    pub fn is_valid_name(name: &str) -> bool {
        let bare = match name.strip_prefix('@') {
            Some(rest) => match rest.split_once('/') {
                Some((scope, pkg)) if !scope.is_empty() => pkg,
                _ => return false,
            },
            None => name,
        };
        !bare.is_empty()
            && bare
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
            && !bare.starts_with('-')
            && !bare.ends_with('-')
    }

    /// Check if this package carries a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_creation() {
        let manifest = PackageManifest::new("code-review".to_string(), "1.0.0".to_string());

        assert_eq!(manifest.name, "code-review");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.description, None);
        assert!(manifest.tags.is_empty());
    }

    #[test]
    fn test_valid_package_names() {
        assert!(PackageManifest::is_valid_name("my-package"));
        assert!(PackageManifest::is_valid_name("my_package"));
        assert!(PackageManifest::is_valid_name("package123"));
        assert!(PackageManifest::is_valid_name("@acme/my-package"));

        assert!(!PackageManifest::is_valid_name(""));
        assert!(!PackageManifest::is_valid_name("-invalid"));
        assert!(!PackageManifest::is_valid_name("invalid-"));
        assert!(!PackageManifest::is_valid_name("@/no-scope"));
        assert!(!PackageManifest::is_valid_name("invalid@name"));
    }

    #[test]
    fn test_tags() {
        let mut manifest = PackageManifest::new("test".to_string(), "1.0.0".to_string());
        manifest.tags = vec!["react".to_string(), "typescript".to_string()];

        assert!(manifest.has_tag("react"));
        assert!(manifest.has_tag("typescript"));
        assert!(!manifest.has_tag("python"));
    }

    #[test]
    fn test_manifest_serializes_type_field() {
        let mut manifest = PackageManifest::new("test".to_string(), "1.0.0".to_string());
        manifest.package_type = Some("prompt".to_string());

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["type"], "prompt");
        assert!(json.get("description").is_none());
    }
}
