//! Release Deployer CLI
//!
//! Release-and-deploy step for GitHub Actions workflows

use anyhow::Result;
use clap::Parser;
use release_deployer::core::ReleaseError;
use release_deployer::hosting::{GitHubActionsRuntime, GitHubClient, error_command};
use release_deployer::orchestration::{
    ActionContext, ContextOptions, ReleaseOrchestrator, abort_setup,
};
use release_deployer::security::SafeCommandExecutor;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILTER: &str = "release_deployer=info";

/// Create a release when the manifest version is new, then publish or deploy
#[derive(Parser)]
#[command(name = "release-deployer")]
#[command(version)]
#[command(about = "Release-and-deploy step for GitHub Actions", long_about = None)]
struct Cli {
    /// Workspace directory (defaults to GITHUB_WORKSPACE, then ".")
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Manifest path relative to the workspace (defaults to package.json)
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Config file (defaults to .release-config.yaml in the workspace)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            println!("{}", error_command(&e.to_string()));
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let env: HashMap<String, String> = std::env::vars().collect();
    let mut runtime = GitHubActionsRuntime::from_env(&env);

    println!("\n🚀 release-deployer\n");

    let context = match ActionContext::load(ContextOptions {
        env,
        workspace: cli.workspace,
        manifest: cli.manifest,
        config_path: cli.config,
    })
    .await
    {
        Ok(context) => context,
        Err(e) => return Ok(abort(&mut runtime, e)),
    };

    let host = match GitHubClient::new(
        &context.api_url,
        context.repository.clone(),
        context
            .token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string())),
    ) {
        Ok(host) => host,
        Err(e) => return Ok(abort(&mut runtime, e)),
    };

    let runner = match SafeCommandExecutor::new(&context.workspace) {
        Ok(runner) => runner.with_masker(context.token_manager().masker()),
        Err(e) => return Ok(abort(&mut runtime, e.into())),
    };

    let mut orchestrator = ReleaseOrchestrator::new(context, host, runner, runtime);
    let report = orchestrator.run().await;

    if let Some(version) = &report.version {
        println!("  📦 Version: {}", version);
    }
    if let Some(latest) = &report.latest_release {
        println!("  🏷️  Latest release: {}", latest);
    }
    match (&report.released_version, &report.release_url) {
        (Some(version), Some(url)) => println!("  ✅ Released {} ({})", version, url),
        (Some(version), None) => println!("  ✅ Released {}", version),
        _ => {}
    }
    if report.published {
        println!("  ✅ Package published");
    }
    if let Some(deploy_type) = report.deployed {
        println!("  ✅ Deployed ({})", deploy_type.as_str());
    }
    for warning in &report.warnings {
        println!("  ⚠️  {}", warning);
    }

    if report.success {
        println!("\n✅ Completed in {}ms", report.duration);
        Ok(0)
    } else {
        let message = report.error.unwrap_or_else(|| "release run failed".to_string());
        println!("{}", error_command(&message));
        eprintln!("\n❌ Run failed: {}", message);
        Ok(1)
    }
}

/// Setup failed before a run could start: scrub, report, exit code 1
fn abort(runtime: &mut GitHubActionsRuntime, error: ReleaseError) -> i32 {
    println!("{}", abort_setup(runtime, &error));
    eprintln!("\n❌ {}", error);
    for action in error.suggested_actions() {
        eprintln!("  - {}", action);
    }
    1
}
