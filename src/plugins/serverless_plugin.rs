//! Serverless Plugin - service deploy through the Serverless Framework CLI
//!
//! The framework is installed globally with npm and then `serverless deploy`
//! runs with the AWS credential pair in its environment. Credentials are
//! never passed as arguments (no `serverless config credentials` step).

use crate::core::config::{AwsCredentials, DeployType};
use crate::core::error::ReleaseError;
use crate::core::traits::{CommandInvocation, CommandRunner, DeployPlugin};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// Serverless Framework deploy plugin
pub struct ServerlessPlugin<'a> {
    credentials: Option<&'a AwsCredentials>,
}

impl<'a> ServerlessPlugin<'a> {
    pub fn new(credentials: Option<&'a AwsCredentials>) -> Self {
        Self { credentials }
    }

    fn install_invocation() -> CommandInvocation {
        CommandInvocation::new("npm", &["install", "serverless", "-g"])
    }

    fn deploy_invocation(credentials: &AwsCredentials) -> CommandInvocation {
        CommandInvocation::new("serverless", &["deploy"])
            .env(
                "AWS_ACCESS_KEY_ID",
                SecretString::from(credentials.access_key_id.expose_secret().to_string()),
            )
            .env(
                "AWS_SECRET_ACCESS_KEY",
                SecretString::from(credentials.secret_access_key.expose_secret().to_string()),
            )
    }
}

#[async_trait]
impl DeployPlugin for ServerlessPlugin<'_> {
    fn name(&self) -> &str {
        "serverless"
    }

    fn deploy_type(&self) -> DeployType {
        DeployType::Service
    }

    async fn deploy(&self, runner: &dyn CommandRunner) -> Result<(), ReleaseError> {
        // Checked before installing anything
        let credentials = self
            .credentials
            .ok_or_else(|| ReleaseError::CredentialsMissing {
                deploy_type: DeployType::Service.as_str().to_string(),
            })?;

        runner.run(&Self::install_invocation()).await?;
        runner.run(&Self::deploy_invocation(credentials)).await?;

        info!("service deployed");
        Ok(())
    }
}
