pub mod core;
pub mod hosting;
pub mod orchestration;
pub mod plugins;
pub mod security;
pub mod validation;

pub use core::*;
pub use hosting::{GitHubActionsRuntime, GitHubClient, Repository};
pub use orchestration::{ActionContext, ContextOptions, ReleaseOrchestrator, RunReport};
pub use security::{CommandError, SafeCommandExecutor, SecretMasker, SecureTokenManager};
