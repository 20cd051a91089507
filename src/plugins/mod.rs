pub mod npm_plugin;
pub mod plugin_loader;
pub mod serverless_plugin;

pub use npm_plugin::NpmPlugin;
pub use plugin_loader::{DeployCredentials, PluginLoader};
pub use serverless_plugin::ServerlessPlugin;
