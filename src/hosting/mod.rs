//! Integrations with the hosting platform: its REST API and its CI runner.

pub mod actions_runtime;
pub mod github_client;

pub use actions_runtime::{GitHubActionsRuntime, error_command};
pub use github_client::{DEFAULT_API_URL, GitHubClient, Repository};
