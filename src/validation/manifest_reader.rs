//! Manifest Reader - Reads the declared version from package.json or Cargo.toml
//!
//! # Example
//!
//! ```no_run
//! use release_deployer::validation::ManifestReader;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), release_deployer::core::ReleaseError> {
//! let manifest = ManifestReader::new().read(Path::new("package.json")).await?;
//! println!("declared version: {}", manifest.version);
//! # Ok(())
//! # }
//! ```

use crate::core::error::ReleaseError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Type of manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestType {
    Npm,
    Cargo,
}

impl ManifestType {
    /// `.toml` files are Cargo manifests, everything else is read as package.json
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => ManifestType::Cargo,
            _ => ManifestType::Npm,
        }
    }
}

/// Metadata extracted from manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: Option<String>,
    pub version: String,
    pub manifest_type: ManifestType,
}

/// Reader for package manifest files
pub struct ManifestReader;

impl Default for ManifestReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a manifest file.
    ///
    /// # Errors
    ///
    /// - `ReleaseError::ManifestNotFound` - the file does not exist
    /// - `ReleaseError::ManifestInvalid` - unreadable, malformed, or no string `version`
    pub async fn read(&self, path: &Path) -> Result<ManifestMetadata, ReleaseError> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ReleaseError::ManifestNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                invalid(path, e.to_string())
            }
        })?;

        match ManifestType::from_path(path) {
            ManifestType::Npm => self.parse_npm(path, &content),
            ManifestType::Cargo => self.parse_cargo(path, &content),
        }
    }

    /// Read only the declared version
    pub async fn read_version(&self, path: &Path) -> Result<String, ReleaseError> {
        Ok(self.read(path).await?.version)
    }

    /// Parse NPM package.json
    fn parse_npm(&self, path: &Path, content: &str) -> Result<ManifestMetadata, ReleaseError> {
        let parsed: serde_json::Value =
            serde_json::from_str(content).map_err(|e| invalid(path, format!("Invalid JSON: {}", e)))?;

        let version = parsed
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| invalid(path, "Missing required field: version".to_string()))?;

        Ok(ManifestMetadata {
            name: parsed.get("name").and_then(|v| v.as_str()).map(String::from),
            version: version.trim().to_string(),
            manifest_type: ManifestType::Npm,
        })
    }

    /// Parse Cargo.toml
    fn parse_cargo(&self, path: &Path, content: &str) -> Result<ManifestMetadata, ReleaseError> {
        let parsed: toml::Value =
            toml::from_str(content).map_err(|e| invalid(path, format!("Invalid TOML: {}", e)))?;

        let package = parsed
            .get("package")
            .ok_or_else(|| invalid(path, "Missing [package] section".to_string()))?;

        let version = package
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| invalid(path, "Missing required field: package.version".to_string()))?;

        Ok(ManifestMetadata {
            name: package.get("name").and_then(|v| v.as_str()).map(String::from),
            version: version.trim().to_string(),
            manifest_type: ManifestType::Cargo,
        })
    }
}

fn invalid(path: &Path, message: String) -> ReleaseError {
    ReleaseError::ManifestInvalid {
        path: PathBuf::from(path),
        message,
    }
}
