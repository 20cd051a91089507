//! Release Orchestrator - runs one release/deploy pass end to end
//!
//! Steps, in order:
//! - export the branch name and the registry auth token
//! - read the manifest version
//! - look up the latest release and create one when the tags differ
//! - optionally publish the package after a new release
//! - optionally deploy (package publish or service deploy)
//! - scrub credential variables, on every exit path
//!
//! Collaborators are injected so the whole flow runs against fakes in tests.

use super::context::ActionContext;
use crate::core::config::DeployType;
use crate::core::error::ReleaseError;
use crate::core::state_machine::{RunState, RunStateMachine};
use crate::core::traits::{
    ActionRuntime, CommandRunner, LatestRelease, NewRelease, PublishedRelease, ReleaseHost,
};
use crate::hosting::error_command;
use crate::plugins::PluginLoader;
use crate::security::SecureTokenManager;
use crate::validation::{ManifestReader, VersionValidator, normalize_tag};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};

/// Variable receiving the branch name
pub const BRANCH_VARIABLE: &str = "BRANCH_NAME";

/// Variable receiving the registry auth token
pub const AUTH_TOKEN_VARIABLE: &str = "NODE_AUTH_TOKEN";

/// Step output holding the released version
pub const VERSION_OUTPUT: &str = "version";

/// Output value when no release was created
pub const NO_RELEASE_OUTPUT: &str = "false";

/// Outcome of the release decision
#[derive(Debug, Clone)]
pub struct ReleaseDecision {
    pub latest: LatestRelease,
    pub created: Option<PublishedRelease>,
}

/// Report returned after a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub version: Option<String>,
    pub latest_release: Option<String>,
    pub released_version: Option<String>,
    pub release_url: Option<String>,
    pub published: bool,
    pub deployed: Option<DeployType>,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub warnings: Vec<String>,
    pub state: RunState,
    pub duration: u64,
    pub history: String,
}

impl RunReport {
    fn new() -> Self {
        Self {
            success: false,
            version: None,
            latest_release: None,
            released_version: None,
            release_url: None,
            published: false,
            deployed: None,
            error: None,
            error_code: None,
            warnings: Vec::new(),
            state: RunState::Start,
            duration: 0,
            history: String::new(),
        }
    }

    /// Value written to the `version` step output
    pub fn version_output(&self) -> &str {
        self.released_version.as_deref().unwrap_or(NO_RELEASE_OUTPUT)
    }
}

/// Setup failed before a run could start.
///
/// Scrubs credential variables like a finished run would and returns the
/// `::error::` workflow command for the failure.
pub fn abort_setup(runtime: &mut dyn ActionRuntime, error: &ReleaseError) -> String {
    if let Err(e) = SecureTokenManager::scrub(runtime) {
        error!(error = %e, "credential scrub failed");
    }
    error!(code = error.code(), "{}", error);
    error_command(&error.to_string())
}

/// Main release orchestrator
pub struct ReleaseOrchestrator<H, C, R> {
    context: ActionContext,
    host: H,
    runner: C,
    runtime: R,
    manifest_reader: ManifestReader,
    version_validator: VersionValidator,
    token_manager: SecureTokenManager,
    state_machine: RunStateMachine,
    published: bool,
}

impl<H, C, R> ReleaseOrchestrator<H, C, R>
where
    H: ReleaseHost,
    C: CommandRunner,
    R: ActionRuntime,
{
    pub fn new(context: ActionContext, host: H, runner: C, runtime: R) -> Self {
        Self {
            token_manager: context.token_manager(),
            context,
            host,
            runner,
            runtime,
            manifest_reader: ManifestReader::new(),
            version_validator: VersionValidator::new(),
            state_machine: RunStateMachine::new(),
            published: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn runner(&self) -> &C {
        &self.runner
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn state_machine(&self) -> &RunStateMachine {
        &self.state_machine
    }

    /// Run the whole sequence.
    ///
    /// Never returns early: credential variables are scrubbed whether the
    /// steps succeeded or not, and the outcome is carried in the report.
    pub async fn run(&mut self) -> RunReport {
        let start_time = Instant::now();
        let mut report = RunReport::new();

        self.token_manager.register_masks(&mut self.runtime);

        let mut result = self.execute(&mut report).await;

        if let Err(e) = SecureTokenManager::scrub(&mut self.runtime) {
            error!(error = %e, "credential scrub failed");
            result = result.and(Err(e));
        }

        if result.is_ok()
            && let Err(e) = self
                .runtime
                .set_output(VERSION_OUTPUT, report.version_output())
        {
            result = Err(e);
        }

        if let Err(e) = &result {
            let message = self.token_manager.mask_secrets_in(&e.to_string());
            error!(code = e.code(), "{}", message);
            self.state_machine.fail(&message);
            report.error_code = Some(e.code().to_string());
        }

        if let Err(e) = self.state_machine.transition(RunState::Done, None) {
            warn!(error = %e, "could not record final state");
        }

        report.success = !self.state_machine.is_failed();
        report.error = self.state_machine.get_last_error().map(String::from);
        report.published = self.published;
        report.state = self.state_machine.get_state();
        report.history = self.state_machine.get_history();
        report.duration = start_time.elapsed().as_millis() as u64;
        report
    }

    async fn execute(&mut self, report: &mut RunReport) -> Result<(), ReleaseError> {
        // 1. Environment
        self.export_environment()?;

        // 2. Version
        let version = self.determine_current_version(report).await?;
        report.version = Some(version.clone());
        self.state_machine.transition(
            RunState::VersionResolved,
            Some(HashMap::from([(
                "version".to_string(),
                serde_json::json!(version),
            )])),
        )?;

        // 3. Release
        if self.context.intent.release {
            let decision = self.decide_and_create_release(&version).await?;
            report.latest_release = Some(decision.latest.as_str().to_string());
            if let Some(created) = decision.created {
                report.released_version = Some(version.clone());
                report.release_url = created.html_url;

                if self.context.intent.publish {
                    self.publish_package().await?;
                }
            }
        } else {
            info!("release step disabled");
        }
        self.state_machine.transition(
            RunState::ReleaseDecided,
            Some(HashMap::from([(
                "released".to_string(),
                serde_json::json!(report.released_version.is_some()),
            )])),
        )?;

        // 4. Deploy
        report.deployed = self
            .run_deployment(report.released_version.is_some())
            .await?;
        self.state_machine.transition(RunState::Deployed, None)?;

        Ok(())
    }

    /// Export `BRANCH_NAME` and `NODE_AUTH_TOKEN` for later steps
    fn export_environment(&mut self) -> Result<(), ReleaseError> {
        match self.context.branch_name() {
            Some(branch) => {
                info!(branch, "exporting branch name");
                self.runtime.export_variable(BRANCH_VARIABLE, branch)?;
            }
            None => warn!("GITHUB_REF is not set, skipping {}", BRANCH_VARIABLE),
        }

        match self.token_manager.get_token(AUTH_TOKEN_VARIABLE) {
            Some(token) => self
                .runtime
                .export_variable(AUTH_TOKEN_VARIABLE, token.expose_secret())?,
            None => warn!("GITHUB_TOKEN is not set, skipping {}", AUTH_TOKEN_VARIABLE),
        }

        Ok(())
    }

    /// Version field of the configured manifest
    pub async fn determine_current_version(
        &self,
        report: &mut RunReport,
    ) -> Result<String, ReleaseError> {
        let version = self
            .manifest_reader
            .read_version(&self.context.manifest_path)
            .await?;

        let validation = self.version_validator.validate(&version);
        if !validation.is_valid {
            let message = format!(
                "version '{}' is not valid semver: {}",
                version,
                validation.error.unwrap_or_default()
            );
            warn!("{}", message);
            report.warnings.push(message);
        }

        info!(version = %version, manifest = %self.context.manifest_path.display(), "current version");
        Ok(version)
    }

    /// Latest release tag, normalized; any lookup failure counts as no release
    pub async fn determine_release_tag(&self) -> LatestRelease {
        match self.host.latest_release().await {
            Ok(Some(release)) => {
                let tag = normalize_tag(&release.tag_name);
                info!(tag = %release.tag_name, normalized = %tag, "latest release");
                LatestRelease::Found(tag)
            }
            Ok(None) => {
                info!("no release published yet");
                LatestRelease::NotFound
            }
            Err(e) => {
                let message = self.token_manager.mask_secrets_in(&e.to_string());
                warn!(host = self.host.name(), "latest release lookup failed, treating as none: {}", message);
                LatestRelease::NotFound
            }
        }
    }

    /// Create a release when the latest tag differs from `version`
    pub async fn decide_and_create_release(
        &self,
        version: &str,
    ) -> Result<ReleaseDecision, ReleaseError> {
        let latest = self.determine_release_tag().await;

        if latest.matches(version) {
            info!(version, "version already released, nothing to do");
            return Ok(ReleaseDecision {
                latest,
                created: None,
            });
        }

        info!(version, latest = latest.as_str(), "creating release");
        let created = self
            .host
            .create_release(&NewRelease::for_version(version))
            .await?;
        if let Some(url) = &created.html_url {
            info!(url = %url, "release created");
        }

        Ok(ReleaseDecision {
            latest,
            created: Some(created),
        })
    }

    /// Publish the package; a second call in the same run is a no-op
    async fn publish_package(&mut self) -> Result<(), ReleaseError> {
        if self.published {
            info!("package already published in this run, skipping");
            return Ok(());
        }

        let plugin = PluginLoader::load(DeployType::Package, self.context.deploy_credentials());
        info!(plugin = plugin.name(), "publishing package");
        plugin.deploy(&self.runner).await?;

        self.published = true;
        Ok(())
    }

    async fn run_deployment(&mut self, released: bool) -> Result<Option<DeployType>, ReleaseError> {
        let intent = self.context.intent;
        if !intent.deploy {
            return Ok(None);
        }
        if !intent.deploys(released) {
            info!("no new release in this run, skipping deployment");
            return Ok(None);
        }

        match self.context.intent.deploy_type {
            None => {
                info!("deploy requested without a deploy type, skipping");
                Ok(None)
            }
            Some(DeployType::Package) => {
                self.publish_package().await?;
                Ok(Some(DeployType::Package))
            }
            Some(DeployType::Service) => {
                let plugin =
                    PluginLoader::load(DeployType::Service, self.context.deploy_credentials());
                info!(plugin = plugin.name(), "deploying service");
                plugin.deploy(&self.runner).await?;
                Ok(Some(DeployType::Service))
            }
        }
    }
}
