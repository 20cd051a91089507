//! NPM Plugin - package publish through the npm CLI
//!
//! The registry token reaches npm as `NODE_AUTH_TOKEN` in the child
//! environment, which is what `.npmrc` files generated by
//! `actions/setup-node` read.

use crate::core::config::DeployType;
use crate::core::error::ReleaseError;
use crate::core::traits::{CommandInvocation, CommandRunner, DeployPlugin};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// NPM package publish plugin
pub struct NpmPlugin<'a> {
    auth_token: Option<&'a SecretString>,
}

impl<'a> NpmPlugin<'a> {
    /// Create a new NPM plugin instance
    pub fn new(auth_token: Option<&'a SecretString>) -> Self {
        Self { auth_token }
    }

    /// `npm publish`, with the auth token in its environment when known
    pub fn publish_invocation(&self) -> CommandInvocation {
        let invocation = CommandInvocation::new("npm", &["publish"]);
        match self.auth_token {
            Some(token) => invocation.env(
                "NODE_AUTH_TOKEN",
                SecretString::from(token.expose_secret().to_string()),
            ),
            None => invocation,
        }
    }
}

#[async_trait]
impl DeployPlugin for NpmPlugin<'_> {
    fn name(&self) -> &str {
        "npm"
    }

    fn deploy_type(&self) -> DeployType {
        DeployType::Package
    }

    async fn deploy(&self, runner: &dyn CommandRunner) -> Result<(), ReleaseError> {
        runner.run(&self.publish_invocation()).await?;
        info!("package published");
        Ok(())
    }
}
