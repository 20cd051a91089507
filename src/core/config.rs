//! Configuration structures and types for release-deployer
//!
//! This module provides the deployment intent resolved once per run and the
//! optional `.release-config.yaml` file schema.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Deployment target kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployType {
    /// Publish the package to its registry
    Package,
    /// Deploy the service with the deployment framework
    Service,
}

impl DeployType {
    /// Get string representation of deploy type
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployType::Package => "package",
            DeployType::Service => "service",
        }
    }

    /// Parse a deploy type, ignoring case and surrounding whitespace
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "package" => Some(DeployType::Package),
            "service" => Some(DeployType::Service),
            _ => None,
        }
    }
}

/// Which optional actions a run performs.
///
/// Resolved once at run start and never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentIntent {
    /// Create a release when the manifest version is new
    pub release: bool,

    /// Publish the package right after creating a release
    pub publish: bool,

    /// Run the deployment step
    pub deploy: bool,

    /// Deployment branch taken by the deployment step
    #[serde(rename = "deployType", skip_serializing_if = "Option::is_none")]
    pub deploy_type: Option<DeployType>,

    /// Deploy only in a run that created a release (`deploy: <type>` input form)
    #[serde(rename = "deployAfterRelease", default)]
    pub deploy_after_release: bool,

    /// Let a gated `service` deploy run on an unchanged version
    #[serde(rename = "skipVersionCheck", default)]
    pub skip_version_check: bool,
}

impl DeploymentIntent {
    /// Whether the deployment step runs, given whether this run created a release
    pub fn deploys(&self, released: bool) -> bool {
        if !self.deploy {
            return false;
        }
        if !self.deploy_after_release || released {
            return true;
        }
        self.skip_version_check && self.deploy_type == Some(DeployType::Service)
    }
}

/// Cloud credential pair for service deployments
#[derive(Debug)]
pub struct AwsCredentials {
    pub access_key_id: SecretString,
    pub secret_access_key: SecretString,
}

/// Root object of `.release-config.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReleaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<bool>,

    /// "package" | "service"
    #[serde(
        rename = "deployType",
        alias = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub deploy_type: Option<String>,

    /// Manifest path relative to the workspace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    #[serde(
        rename = "skipVersionCheck",
        alias = "skip_version_check",
        skip_serializing_if = "Option::is_none"
    )]
    pub skip_version_check: Option<bool>,

    /// Only set by the `deploy: <type>` input form
    #[serde(skip)]
    pub deploy_after_release: Option<bool>,
}

impl ReleaseConfig {
    /// Overlay `other` on top of `self`; fields set in `other` win
    pub fn merge(self, other: ReleaseConfig) -> ReleaseConfig {
        ReleaseConfig {
            release: other.release.or(self.release),
            publish: other.publish.or(self.publish),
            deploy: other.deploy.or(self.deploy),
            deploy_type: other.deploy_type.or(self.deploy_type),
            manifest: other.manifest.or(self.manifest),
            skip_version_check: other.skip_version_check.or(self.skip_version_check),
            deploy_after_release: other.deploy_after_release.or(self.deploy_after_release),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_type_parse() {
        assert_eq!(DeployType::parse("package"), Some(DeployType::Package));
        assert_eq!(DeployType::parse(" Service "), Some(DeployType::Service));
        assert_eq!(DeployType::parse("lambda"), None);
        assert_eq!(DeployType::parse(""), None);
    }

    #[test]
    fn test_intent_default_is_all_off() {
        let intent = DeploymentIntent::default();

        assert!(!intent.release);
        assert!(!intent.publish);
        assert!(!intent.deploy);
        assert!(intent.deploy_type.is_none());
    }

    #[test]
    fn test_release_config_from_yaml() {
        let yaml = "release: true\npublish: false\ntype: service\nmanifest: app/package.json\n";
        let config: ReleaseConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.release, Some(true));
        assert_eq!(config.publish, Some(false));
        assert_eq!(config.deploy, None);
        assert_eq!(config.deploy_type.as_deref(), Some("service"));
        assert_eq!(config.manifest.as_deref(), Some("app/package.json"));
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let base = ReleaseConfig {
            release: Some(true),
            deploy_type: Some("package".to_string()),
            ..Default::default()
        };
        let overlay = ReleaseConfig {
            release: Some(false),
            deploy: Some(true),
            ..Default::default()
        };

        let merged = base.merge(overlay);

        assert_eq!(merged.release, Some(false));
        assert_eq!(merged.deploy, Some(true));
        assert_eq!(merged.deploy_type.as_deref(), Some("package"));
    }

    #[test]
    fn test_intent_serialization() {
        let intent = DeploymentIntent {
            release: true,
            publish: false,
            deploy: true,
            deploy_type: Some(DeployType::Service),
            ..Default::default()
        };

        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains(r#""deployType":"service""#));
    }

    #[test]
    fn test_plain_deploy_ignores_release_outcome() {
        let intent = DeploymentIntent {
            deploy: true,
            deploy_type: Some(DeployType::Package),
            ..Default::default()
        };

        assert!(intent.deploys(false));
        assert!(intent.deploys(true));
        assert!(!DeploymentIntent::default().deploys(true));
    }

    #[test]
    fn test_gated_deploy_needs_a_new_release() {
        let intent = DeploymentIntent {
            deploy: true,
            deploy_type: Some(DeployType::Package),
            deploy_after_release: true,
            ..Default::default()
        };

        assert!(intent.deploys(true));
        assert!(!intent.deploys(false));
    }

    #[test]
    fn test_skip_version_check_only_opens_service_deploys() {
        let service = DeploymentIntent {
            deploy: true,
            deploy_type: Some(DeployType::Service),
            deploy_after_release: true,
            skip_version_check: true,
            ..Default::default()
        };
        let package = DeploymentIntent {
            deploy_type: Some(DeployType::Package),
            ..service
        };

        assert!(service.deploys(false));
        assert!(!package.deploys(false));
    }
}
