//! Configuration loader for release-deployer
//!
//! Action inputs arrive as `INPUT_<NAME>` environment variables. They are
//! layered over the optional `.release-config.yaml` in the workspace, which
//! is layered over built-in defaults.

use super::config::*;
use crate::core::error::ReleaseError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Configuration file name
const CONFIG_FILENAME: &str = ".release-config.yaml";

/// Manifest used when neither inputs nor config name one
pub const DEFAULT_MANIFEST: &str = "package.json";

const TRUE_VALUES: &[&str] = &["true", "True", "TRUE"];
const FALSE_VALUES: &[&str] = &["false", "False", "FALSE"];

/// Configuration load options
#[derive(Clone)]
pub struct ConfigLoadOptions {
    /// Workspace the default config file is looked up in
    pub workspace: PathBuf,

    /// Explicit config file; must exist when given
    pub config_path: Option<PathBuf>,

    /// Environment variables (action inputs included)
    pub env: HashMap<String, String>,
}

impl fmt::Debug for ConfigLoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoadOptions")
            .field("workspace", &self.workspace)
            .field("config_path", &self.config_path)
            .field("env", &format_args!("<{} variables>", self.env.len()))
            .finish()
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub intent: DeploymentIntent,
    pub manifest: String,
}

/// Environment variable carrying the action input `name`
pub fn input_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Read an action input; empty values count as unset
pub fn get_input(env: &HashMap<String, String>, name: &str) -> Option<String> {
    env.get(&input_key(name))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a boolean action input (`true|True|TRUE|false|False|FALSE`)
pub fn get_boolean_input(
    env: &HashMap<String, String>,
    name: &str,
) -> Result<Option<bool>, ReleaseError> {
    match get_input(env, name) {
        None => Ok(None),
        Some(value) => parse_bool(&value).map(Some).ok_or(ReleaseError::InvalidInput {
            name: name.to_string(),
            value,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    if TRUE_VALUES.contains(&value) {
        Some(true)
    } else if FALSE_VALUES.contains(&value) {
        Some(false)
    } else {
        None
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources.
    ///
    /// Priority (high to low):
    /// 1. Action inputs
    /// 2. Config file (explicit path, or `<workspace>/.release-config.yaml`)
    /// 3. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<LoadedConfig, ReleaseError> {
        let mut configs: Vec<ReleaseConfig> = vec![ReleaseConfig::default()];

        let file_config = match &options.config_path {
            Some(path) => Some(Self::load_config_file(path, true).await?),
            None => {
                let path = options.workspace.join(CONFIG_FILENAME);
                if path.exists() {
                    Some(Self::load_config_file(&path, false).await?)
                } else {
                    None
                }
            }
        };
        configs.extend(file_config);

        configs.push(Self::load_input_config(&options.env)?);

        let merged = configs
            .into_iter()
            .fold(ReleaseConfig::default(), ReleaseConfig::merge);

        Ok(Self::resolve(merged))
    }

    /// Load configuration from a YAML file
    async fn load_config_file(path: &Path, explicit: bool) -> Result<ReleaseConfig, ReleaseError> {
        if explicit && !path.exists() {
            return Err(ReleaseError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ReleaseError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: ReleaseConfig = serde_yaml::from_str(&content).map_err(|e| {
            ReleaseError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Load configuration from action inputs
    fn load_input_config(env: &HashMap<String, String>) -> Result<ReleaseConfig, ReleaseError> {
        let mut config = ReleaseConfig {
            release: get_boolean_input(env, "release")?,
            publish: get_boolean_input(env, "publish")?,
            manifest: get_input(env, "manifest"),
            skip_version_check: get_boolean_input(env, "skip_version_check")?,
            ..Default::default()
        };

        // `deploy` is either a boolean or, in the older form, the deploy type
        // itself; the older form only deploys after a new release
        if let Some(deploy) = get_input(env, "deploy") {
            if let Some(flag) = parse_bool(&deploy) {
                config.deploy = Some(flag);
            } else if DeployType::parse(&deploy).is_some() {
                config.deploy = Some(true);
                config.deploy_after_release = Some(true);
                config.deploy_type = Some(deploy);
            } else {
                return Err(ReleaseError::InvalidInput {
                    name: "deploy".to_string(),
                    value: deploy,
                });
            }
        }

        if let Some(deploy_type) = get_input(env, "deployType").or_else(|| get_input(env, "type"))
        {
            config.deploy_type = Some(deploy_type);
        }

        Ok(config)
    }

    fn resolve(config: ReleaseConfig) -> LoadedConfig {
        let deploy_type = config.deploy_type.as_deref().and_then(|raw| {
            let parsed = DeployType::parse(raw);
            if parsed.is_none() {
                warn!(deploy_type = raw, "unrecognized deploy type, deployment is a no-op");
            }
            parsed
        });

        LoadedConfig {
            intent: DeploymentIntent {
                release: config.release.unwrap_or(false),
                publish: config.publish.unwrap_or(false),
                deploy: config.deploy.unwrap_or(false),
                deploy_type,
                deploy_after_release: config.deploy_after_release.unwrap_or(false),
                skip_version_check: config.skip_version_check.unwrap_or(false),
            },
            manifest: config
                .manifest
                .unwrap_or_else(|| DEFAULT_MANIFEST.to_string()),
        }
    }
}
