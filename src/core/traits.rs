//! Core traits and types for the release workflow
//!
//! The orchestrator talks to the outside world only through the traits in
//! this module: the hosting API ([`ReleaseHost`]), external commands
//! ([`CommandRunner`]) and the CI runner ([`ActionRuntime`]).

use crate::core::config::DeployType;
use crate::core::error::ReleaseError;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Sentinel rendered when no previous release exists
pub const NO_RELEASE_SENTINEL: &str = "none";

// ============================================================================
// Releases
// ============================================================================

/// A release as returned by the hosting API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRelease {
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// Request for a new release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
}

impl NewRelease {
    /// Release for `version`, named `Release v<version>`
    pub fn for_version(version: &str) -> Self {
        Self {
            tag_name: version.to_string(),
            name: format!("Release v{}", version),
        }
    }
}

/// Outcome of the latest-release lookup, tag already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestRelease {
    Found(String),
    NotFound,
}

impl LatestRelease {
    /// Tag string, or the `"none"` sentinel
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(tag) => tag,
            Self::NotFound => NO_RELEASE_SENTINEL,
        }
    }

    /// Plain string comparison against the manifest version
    pub fn matches(&self, version: &str) -> bool {
        self.as_str() == version
    }
}

// ============================================================================
// Release Host Trait
// ============================================================================

/// Source-hosting API holding the repository's releases
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Host name used in logs (e.g., "github")
    fn name(&self) -> &str;

    /// Fetch the most recent published release.
    ///
    /// `Ok(None)` means the repository has no release yet.
    async fn latest_release(&self) -> Result<Option<PublishedRelease>, ReleaseError>;

    /// Create a release resource
    async fn create_release(&self, release: &NewRelease)
    -> Result<PublishedRelease, ReleaseError>;
}

// ============================================================================
// Command Runner Trait
// ============================================================================

/// A single external command invocation.
///
/// Secrets travel in `envs` only, never in `args`.
#[derive(Debug)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, SecretString)>,
}

impl CommandInvocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            envs: Vec::new(),
        }
    }

    /// Add an environment entry for the child process
    pub fn env(mut self, name: &str, value: SecretString) -> Self {
        self.envs.push((name.to_string(), value));
        self
    }

    /// Command line for logging; never includes env values
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command and wait for it to exit.
    ///
    /// A non-zero exit status is an error.
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, ReleaseError>;
}

// ============================================================================
// Action Runtime Trait
// ============================================================================

/// The CI runner the action executes in
pub trait ActionRuntime: Send {
    /// Export a variable to this process and to later steps of the job
    fn export_variable(&mut self, name: &str, value: &str) -> Result<(), ReleaseError>;

    /// Set a step output
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), ReleaseError>;

    /// Register a value the runner must mask in job logs
    fn add_mask(&mut self, value: &str);
}

// ============================================================================
// Deploy Plugin Trait
// ============================================================================

/// One branch of the deployment step
///
/// Implementations only describe which commands to run; execution goes
/// through the [`CommandRunner`] they are handed.
#[async_trait]
pub trait DeployPlugin: Send + Sync {
    /// Plugin name (e.g., "npm", "serverless")
    fn name(&self) -> &str;

    /// Deploy type this plugin serves
    fn deploy_type(&self) -> DeployType;

    /// Run the deployment to completion
    async fn deploy(&self, runner: &dyn CommandRunner) -> Result<(), ReleaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_new_release_for_version() {
        let release = NewRelease::for_version("2.0.0");

        assert_eq!(release.tag_name, "2.0.0");
        assert_eq!(release.name, "Release v2.0.0");
    }

    #[test]
    fn test_latest_release_not_found_renders_sentinel() {
        assert_eq!(LatestRelease::NotFound.as_str(), "none");
        assert!(!LatestRelease::NotFound.matches("1.0.0"));
    }

    #[test]
    fn test_latest_release_matches_is_plain_string_equality() {
        let latest = LatestRelease::Found("1.10.0".to_string());

        assert!(latest.matches("1.10.0"));
        assert!(!latest.matches("1.9.0"));
        assert!(!latest.matches("1.10.0 "));
    }

    #[test]
    fn test_invocation_display_excludes_env() {
        let invocation = CommandInvocation::new("serverless", &["deploy"])
            .env("AWS_SECRET_ACCESS_KEY", SecretString::from("super-secret".to_string()));

        assert_eq!(invocation.display(), "serverless deploy");
        assert!(!format!("{:?}", invocation).contains("super-secret"));
        assert_eq!(invocation.envs[0].1.expose_secret(), "super-secret");
    }

    #[test]
    fn test_published_release_deserialization() {
        let json = r#"{"tag_name":"v1.9.0","name":"Release v1.9.0","id":42}"#;
        let release: PublishedRelease = serde_json::from_str(json).unwrap();

        assert_eq!(release.tag_name, "v1.9.0");
        assert_eq!(release.name.as_deref(), Some("Release v1.9.0"));
        assert!(release.html_url.is_none());
    }
}
