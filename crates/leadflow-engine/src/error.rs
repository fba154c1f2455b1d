//! # Engine Errors
//!
//! Every operation returns `Result<_, EngineError>`. Validation and
//! authorization failures are detected before anything is staged, and a
//! failed transaction commits nothing, so an error never leaves a partial
//! effect behind.

use leadflow_core::{Actor, AssignmentId, CanonicalizationError, CoreError, LeadId};
use leadflow_state::TransitionError;
use thiserror::Error;

use crate::config::ConfigError;

/// The kind of record a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Lead,
    Assignment,
    Employee,
    Comment,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Assignment => "assignment",
            Self::Employee => "employee",
            Self::Comment => "comment",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// A referenced lead, assignment, employee or comment does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// The lead already has its single assignment.
    #[error("{lead_id} is already assigned ({assignment_id})")]
    AlreadyAssigned {
        lead_id: LeadId,
        assignment_id: AssignmentId,
    },

    /// The requested status is not allowed from the current one.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// The actor's role does not permit the mutation.
    #[error("permission denied: {actor} may not {action}")]
    Permission { actor: Actor, action: &'static str },

    /// Malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The activity hash chain or a store index is inconsistent.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn not_found(kind: RecordKind, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn permission(actor: &Actor, action: &'static str) -> Self {
        Self::Permission {
            actor: *actor,
            action,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<CoreError> for EngineError {
    fn from(e: CoreError) -> Self {
        Self::Validation(e.to_string())
    }
}
