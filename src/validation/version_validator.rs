//! Version Validator - SemVer checks and release tag normalization
//!
//! Release decisions compare plain strings. SemVer parsing here is advisory
//! only: it produces warnings, never a different decision.
//!
//! # Example
//!
//! ```
//! use release_deployer::validation::version_validator::{normalize_tag, VersionValidator};
//!
//! assert_eq!(normalize_tag("v1.2.3"), "1.2.3");
//! assert!(VersionValidator::new().validate("1.2.3").is_valid);
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref TAG_PREFIX: Regex = Regex::new(r"^[A-Za-z\s]+").unwrap();
}

/// Strip the leading alphabetic/whitespace prefix of a release tag.
///
/// `"v1.2.3"` → `"1.2.3"`, `"Release 2.0.0"` → `"2.0.0"`.
pub fn normalize_tag(tag: &str) -> String {
    TAG_PREFIX.replace(tag.trim(), "").trim().to_string()
}

/// Result of version validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionValidationResult {
    /// Whether the version is valid semver
    pub is_valid: bool,
    /// Validation error message (if any)
    pub error: Option<String>,
    /// Whether the version carries a pre-release part (e.g., "alpha.1")
    pub is_prerelease: bool,
}

/// Validator for semantic versioning
pub struct VersionValidator;

impl Default for VersionValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a version string
    ///
    /// # Examples
    ///
    /// ```
    /// use release_deployer::validation::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    /// assert!(validator.validate("1.2.3-beta.1").is_prerelease);
    /// assert!(!validator.validate("invalid").is_valid);
    /// ```
    pub fn validate(&self, version_str: &str) -> VersionValidationResult {
        match Version::parse(version_str) {
            Ok(version) => VersionValidationResult {
                is_valid: true,
                error: None,
                is_prerelease: !version.pre.is_empty(),
            },
            Err(e) => VersionValidationResult {
                is_valid: false,
                error: Some(e.to_string()),
                is_prerelease: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_v_prefix() {
        assert_eq!(normalize_tag("v1.2.3"), "1.2.3");
        assert_eq!(normalize_tag("V1.2.3"), "1.2.3");
    }

    #[test]
    fn test_normalize_word_prefix() {
        assert_eq!(normalize_tag("Release 2.0.0"), "2.0.0");
        assert_eq!(normalize_tag("release v2.0.0"), "2.0.0");
    }

    #[test]
    fn test_normalize_surrounding_whitespace() {
        assert_eq!(normalize_tag("  v1.0.0\n"), "1.0.0");
    }

    #[test]
    fn test_normalize_keeps_unprefixed_tag() {
        assert_eq!(normalize_tag("1.2.3"), "1.2.3");
        assert_eq!(normalize_tag("1.2.3-beta.1"), "1.2.3-beta.1");
    }

    #[test]
    fn test_normalize_only_strips_leading_prefix() {
        assert_eq!(normalize_tag("v2.0.0-rc.1"), "2.0.0-rc.1");
    }

    #[test]
    fn test_validate_valid_versions() {
        let validator = VersionValidator::new();
        assert!(validator.validate("1.0.0").is_valid);
        assert!(validator.validate("2.0.0+build.123").is_valid);
        assert!(!validator.validate("2.0.0+build.123").is_prerelease);
    }

    #[test]
    fn test_validate_invalid_versions() {
        let validator = VersionValidator::new();

        let result = validator.validate("1.0");
        assert!(!result.is_valid);
        assert!(result.error.is_some());

        assert!(!validator.validate("latest").is_valid);
    }
}
