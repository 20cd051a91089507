//! Orchestration layer for the release/deploy run
//!
//! This module resolves the run context and drives the steps of a run
//! against the injected release host, command runner, and CI runtime.

pub mod context;
pub mod release_orchestrator;

pub use context::{ActionContext, ContextOptions};
pub use release_orchestrator::{
    AUTH_TOKEN_VARIABLE, BRANCH_VARIABLE, NO_RELEASE_OUTPUT, ReleaseDecision,
    ReleaseOrchestrator, RunReport, VERSION_OUTPUT, abort_setup,
};
