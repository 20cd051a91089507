pub mod command_executor;
pub mod token_manager;

pub use command_executor::{CommandError, SafeCommandExecutor};
pub use token_manager::{REDACTED_PLACEHOLDER, SCRUBBED_VARIABLES, SecretMasker, SecureTokenManager};
