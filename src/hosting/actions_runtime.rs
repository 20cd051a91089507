//! GitHub Actions runtime - exported variables, step outputs and workflow commands
//!
//! Variables and outputs are written with the runner's file commands
//! (`GITHUB_ENV`, `GITHUB_OUTPUT`) using the heredoc form, so values may
//! contain newlines. Exported variables are mirrored into this process's
//! environment as well.

use crate::core::error::ReleaseError;
use crate::core::traits::ActionRuntime;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Escape data for a workflow command (`%`, CR, LF)
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// `::error::` workflow command marking the step failed
pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// Heredoc entry for a file command: `NAME<<DELIM\nVALUE\nDELIM\n`
pub fn prepare_key_value_message(name: &str, value: &str) -> Result<String, ReleaseError> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());

    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(ReleaseError::ConfigError(format!(
            "value for '{}' contains the file command delimiter",
            name
        )));
    }

    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Runtime backed by the GitHub Actions runner
#[derive(Debug, Clone)]
pub struct GitHubActionsRuntime {
    env_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    mirror_process_env: bool,
}

impl GitHubActionsRuntime {
    pub fn new(env_file: Option<PathBuf>, output_file: Option<PathBuf>) -> Self {
        Self {
            env_file,
            output_file,
            mirror_process_env: true,
        }
    }

    /// Runtime using the runner's `GITHUB_ENV` and `GITHUB_OUTPUT` files
    pub fn from_env(env: &HashMap<String, String>) -> Self {
        let file = |key: &str| {
            env.get(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };
        Self::new(file("GITHUB_ENV"), file("GITHUB_OUTPUT"))
    }

    /// Do not touch this process's environment, only the runner files
    pub fn without_process_env(mut self) -> Self {
        self.mirror_process_env = false;
        self
    }

    fn append(path: &Path, name: &str, value: &str) -> Result<(), ReleaseError> {
        let message = prepare_key_value_message(name, value)?;
        let file_error = |e: std::io::Error| ReleaseError::RuntimeFileError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(file_error)?;
        file.write_all(message.as_bytes()).map_err(file_error)?;

        Ok(())
    }
}

impl ActionRuntime for GitHubActionsRuntime {
    fn export_variable(&mut self, name: &str, value: &str) -> Result<(), ReleaseError> {
        if self.mirror_process_env {
            // SAFETY: the run is a single sequential flow; no other thread
            // reads or writes the environment concurrently.
            unsafe {
                std::env::set_var(name, value);
            }
        }

        if let Some(path) = &self.env_file {
            Self::append(path, name, value)?;
        }
        debug!(variable = name, "exported variable");
        Ok(())
    }

    fn set_output(&mut self, name: &str, value: &str) -> Result<(), ReleaseError> {
        match &self.output_file {
            Some(path) => Self::append(path, name, value)?,
            None => info!(output = name, value, "GITHUB_OUTPUT not set, output not written"),
        }
        Ok(())
    }

    fn add_mask(&mut self, value: &str) {
        if !value.is_empty() {
            println!("::add-mask::{}", escape_data(value));
        }
    }
}
