//! Plugin Loader - Picks the deploy plugin for a deploy type
//!
//! # Example
//!
//! ```
//! use release_deployer::core::DeployType;
//! use release_deployer::plugins::{DeployCredentials, PluginLoader};
//!
//! let plugin = PluginLoader::load(DeployType::Package, DeployCredentials::default());
//! assert_eq!(plugin.name(), "npm");
//! ```

use super::npm_plugin::NpmPlugin;
use super::serverless_plugin::ServerlessPlugin;
use crate::core::config::{AwsCredentials, DeployType};
use crate::core::traits::DeployPlugin;
use secrecy::SecretString;

/// Credentials a plugin may hand to its commands
#[derive(Debug, Default, Clone, Copy)]
pub struct DeployCredentials<'a> {
    pub npm_token: Option<&'a SecretString>,
    pub aws: Option<&'a AwsCredentials>,
}

/// Plugin loader for deploy plugins
pub struct PluginLoader;

impl PluginLoader {
    /// Load the plugin serving `deploy_type`
    pub fn load<'a>(
        deploy_type: DeployType,
        credentials: DeployCredentials<'a>,
    ) -> Box<dyn DeployPlugin + 'a> {
        match deploy_type {
            DeployType::Package => Box::new(NpmPlugin::new(credentials.npm_token)),
            DeployType::Service => Box::new(ServerlessPlugin::new(credentials.aws)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_package_plugin() {
        let plugin = PluginLoader::load(DeployType::Package, DeployCredentials::default());
        assert_eq!(plugin.name(), "npm");
        assert_eq!(plugin.deploy_type(), DeployType::Package);
    }

    #[test]
    fn test_load_service_plugin() {
        let plugin = PluginLoader::load(DeployType::Service, DeployCredentials::default());
        assert_eq!(plugin.name(), "serverless");
        assert_eq!(plugin.deploy_type(), DeployType::Service);
    }
}
