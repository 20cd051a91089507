//! SafeCommandExecutor: whitelisted external command execution
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only the package and deployment CLIs can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, never a shell
//! - **Secrets via environment only**: credentials reach the child through its
//!   environment, never through its argument list
//! - **Output masking**: captured output is masked before it is logged or
//!   embedded in an error
//!
//! # Example
//!
//! ```rust,no_run
//! use release_deployer::core::{CommandInvocation, CommandRunner};
//! use release_deployer::security::SafeCommandExecutor;
//!
//! # async fn example() -> Result<(), release_deployer::core::ReleaseError> {
//! let executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! let output = executor.run(&CommandInvocation::new("npm", &["--version"])).await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```

use crate::core::error::ReleaseError;
use crate::core::traits::{CommandInvocation, CommandOutput, CommandRunner};
use crate::security::token_manager::SecretMasker;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Allowed commands whitelist for security.
const ALLOWED_COMMANDS: &[&str] = &["npm", "serverless"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command ran and exited unsuccessfully
    #[error("Command '{command}' exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Masks credentials in captured output
    masker: SecretMasker,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            masker: SecretMasker::default(),
        })
    }

    /// Mask these secrets in every captured output
    pub fn with_masker(mut self, masker: SecretMasker) -> Self {
        self.masker = masker;
        self
    }

    fn validate(&self, command: &str) -> Result<(), CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }
        Ok(())
    }

    /// Execute a command with whitelist validation.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::NonZeroExit` - Command exited unsuccessfully
    pub async fn execute(
        &self,
        invocation: &CommandInvocation,
    ) -> Result<CommandOutput, CommandError> {
        self.validate(&invocation.program)?;

        // Windows-specific: npm and serverless are .cmd shims, not .exe
        #[cfg(target_os = "windows")]
        let command_name = format!("{}.cmd", invocation.program);

        #[cfg(not(target_os = "windows"))]
        let command_name = invocation.program.clone();

        let mut command = Command::new(&command_name);
        command
            .args(&invocation.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (name, value) in &invocation.envs {
            command.env(name, value.expose_secret());
        }

        // Per-invocation secrets are masked alongside the configured ones
        let masker = SecretMasker::new(
            invocation
                .envs
                .iter()
                .map(|(_, v)| v.expose_secret().to_string()),
        );

        debug!(command = %invocation.display(), "running command");
        let output = command
            .output()
            .await
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let stdout = masker.mask(&self.masker.mask(&String::from_utf8_lossy(&output.stdout)));
        let stderr = masker.mask(&self.masker.mask(&String::from_utf8_lossy(&output.stderr)));

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!(target: "release_deployer::command", "{}", line);
        }

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: invocation.display(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[async_trait]
impl CommandRunner for SafeCommandExecutor {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, ReleaseError> {
        Ok(self.execute(invocation).await?)
    }
}
