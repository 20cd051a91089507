//! State machine for tracking a release run
//!
//! `Start → VersionResolved → ReleaseDecided → Deployed → Done`. Any
//! state may jump to `Done` when a step fails; the credential scrub runs
//! before that final transition either way. Nothing is persisted.

use crate::core::error::ReleaseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Run state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Start,
    VersionResolved,
    ReleaseDecided,
    Deployed,
    Done,
}

impl RunState {
    /// The state that follows this one on the success path
    fn next(self) -> Option<RunState> {
        match self {
            RunState::Start => Some(RunState::VersionResolved),
            RunState::VersionResolved => Some(RunState::ReleaseDecided),
            RunState::ReleaseDecided => Some(RunState::Deployed),
            RunState::Deployed => Some(RunState::Done),
            RunState::Done => None,
        }
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    /// From state
    pub from: RunState,

    /// To state
    pub to: RunState,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// State machine for a single run
#[derive(Debug)]
pub struct RunStateMachine {
    current_state: RunState,
    transitions: Vec<StateTransition>,
    error: Option<String>,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    /// Create a new state machine in `Start`
    pub fn new() -> Self {
        Self {
            current_state: RunState::Start,
            transitions: Vec::new(),
            error: None,
        }
    }

    /// Transition to a new state.
    ///
    /// Only the next state on the success path, or `Done`, is accepted.
    pub fn transition(
        &mut self,
        to: RunState,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<(), ReleaseError> {
        let allowed = self.current_state.next() == Some(to)
            || (to == RunState::Done && self.current_state != RunState::Done);
        if !allowed {
            return Err(ReleaseError::InvalidStateTransition {
                from: format!("{:?}", self.current_state),
                to: format!("{:?}", to),
            });
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
            metadata,
        });
        self.current_state = to;

        Ok(())
    }

    /// Record a fatal error; the run still has to reach `Done`
    pub fn fail(&mut self, error: &str) {
        self.error = Some(error.to_string());
    }

    /// Get current state
    pub fn get_state(&self) -> RunState {
        self.current_state
    }

    /// Whether a fatal error was recorded
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Get last error
    pub fn get_last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Get transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                let time = t.timestamp.to_rfc3339();
                let meta = if let Some(metadata) = &t.metadata {
                    format!(" ({})", serde_json::to_string(metadata).unwrap_or_default())
                } else {
                    String::new()
                };
                format!("{}: {:?} → {:?}{}", time, t.from, t.to, meta)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
