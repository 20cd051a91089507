//! Action context - everything a run needs, resolved once at start
//!
//! The context replaces reads of the process environment scattered through
//! the run: it is built from an environment snapshot plus CLI overrides and
//! then passed by reference to every step.

use crate::core::config::{AwsCredentials, DeploymentIntent};
use crate::core::config_loader::{ConfigLoadOptions, ConfigLoader, get_input};
use crate::core::error::ReleaseError;
use crate::hosting::github_client::{DEFAULT_API_URL, Repository};
use crate::plugins::DeployCredentials;
use crate::security::SecureTokenManager;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// Sources the context is built from
#[derive(Clone, Default)]
pub struct ContextOptions {
    /// Environment snapshot (action inputs included)
    pub env: HashMap<String, String>,

    /// Overrides `GITHUB_WORKSPACE`
    pub workspace: Option<PathBuf>,

    /// Overrides the `manifest` input and config
    pub manifest: Option<PathBuf>,

    /// Explicit config file
    pub config_path: Option<PathBuf>,
}

// The snapshot carries plaintext credentials; only its size is shown
impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("env", &format_args!("<{} variables>", self.env.len()))
            .field("workspace", &self.workspace)
            .field("manifest", &self.manifest)
            .field("config_path", &self.config_path)
            .finish()
    }
}

/// Resolved run context
#[derive(Debug)]
pub struct ActionContext {
    pub workspace: PathBuf,
    pub manifest_path: PathBuf,
    pub repository: Option<Repository>,
    pub git_ref: Option<String>,
    pub api_url: String,
    pub token: Option<SecretString>,
    pub aws: Option<AwsCredentials>,
    pub intent: DeploymentIntent,
}

fn env_value(env: &HashMap<String, String>, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ActionContext {
    /// Build the context from an environment snapshot and overrides
    pub async fn load(options: ContextOptions) -> Result<Self, ReleaseError> {
        let env = &options.env;

        let workspace = options
            .workspace
            .clone()
            .or_else(|| env_value(env, "GITHUB_WORKSPACE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let loaded = ConfigLoader::load(ConfigLoadOptions {
            workspace: workspace.clone(),
            config_path: options.config_path.clone(),
            env: env.clone(),
        })
        .await?;

        let manifest_path = match options.manifest {
            Some(manifest) => workspace.join(manifest),
            None => workspace.join(&loaded.manifest),
        };

        let repository = env_value(env, "GITHUB_REPOSITORY")
            .map(|r| r.parse::<Repository>())
            .transpose()?;

        Ok(Self {
            manifest_path,
            repository,
            git_ref: env_value(env, "GITHUB_REF"),
            api_url: env_value(env, "GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: env_value(env, "GITHUB_TOKEN").map(SecretString::from),
            aws: Self::aws_credentials(env),
            intent: loaded.intent,
            workspace,
        })
    }

    /// Cloud credentials from the `awsKey`/`awsSecret` inputs, else the environment
    fn aws_credentials(env: &HashMap<String, String>) -> Option<AwsCredentials> {
        let key = get_input(env, "awsKey").or_else(|| env_value(env, "AWS_ACCESS_KEY_ID"));
        let secret =
            get_input(env, "awsSecret").or_else(|| env_value(env, "AWS_SECRET_ACCESS_KEY"));

        match (key, secret) {
            (Some(key), Some(secret)) => Some(AwsCredentials {
                access_key_id: SecretString::from(key),
                secret_access_key: SecretString::from(secret),
            }),
            (None, None) => None,
            _ => {
                warn!("only one of the AWS access key id / secret access key is set, ignoring both");
                None
            }
        }
    }

    /// Branch name: the text after the final `/` of the ref
    pub fn branch_name(&self) -> Option<&str> {
        self.git_ref
            .as_deref()
            .and_then(|r| r.rsplit('/').next())
            .filter(|b| !b.is_empty())
    }

    /// Credentials the deploy plugins may use
    pub fn deploy_credentials(&self) -> DeployCredentials<'_> {
        DeployCredentials {
            npm_token: self.token.as_ref(),
            aws: self.aws.as_ref(),
        }
    }

    /// Token manager tracking every credential of this context
    pub fn token_manager(&self) -> SecureTokenManager {
        let mut manager = SecureTokenManager::new();
        let copy = |s: &SecretString| SecretString::from(s.expose_secret().to_string());

        if let Some(token) = &self.token {
            manager.register("GITHUB_TOKEN", copy(token));
            manager.register("NODE_AUTH_TOKEN", copy(token));
        }
        if let Some(aws) = &self.aws {
            manager.register("AWS_ACCESS_KEY_ID", copy(&aws.access_key_id));
            manager.register("AWS_SECRET_ACCESS_KEY", copy(&aws.secret_access_key));
        }
        manager
    }
}
