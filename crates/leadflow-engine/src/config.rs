//! Engine configuration.
//!
//! The two business policies that callers previously enforced implicitly
//! are explicit here: what happens when disbursements exceed the approved
//! amount, and how far a manager's reassignment reach extends. Defaults are
//! usable as-is; `from_env` overrides them for deployments.

use thiserror::Error;

/// What the ledger does with a tranche that pushes the running total above
/// the approved amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverdisbursementPolicy {
    /// Record it, flag the activity, and log a warning.
    #[default]
    Allow,
    /// Refuse it with a validation error.
    Reject,
}

impl OverdisbursementPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Which reassignments a manager may perform. Admins are never limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReassignScope {
    /// Managers may move leads between any employees.
    AnyTeam,
    /// Managers may only move leads between members of their own team.
    #[default]
    OwnTeam,
}

impl ReassignScope {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "any_team" | "any" => Some(Self::AnyTeam),
            "own_team" | "team" => Some(Self::OwnTeam),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub overdisbursement: OverdisbursementPolicy,
    pub reassign_scope: ReassignScope,
    /// Characters of a comment quoted in its activity description.
    pub comment_preview_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overdisbursement: OverdisbursementPolicy::default(),
            reassign_scope: ReassignScope::default(),
            comment_preview_chars: 50,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `LEADFLOW_OVERDISBURSEMENT`: `allow` (default) or `reject`
    /// - `LEADFLOW_REASSIGN_SCOPE`: `own_team` (default) or `any_team`
    /// - `LEADFLOW_COMMENT_PREVIEW_CHARS`: default 50
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup("LEADFLOW_OVERDISBURSEMENT") {
            config.overdisbursement =
                OverdisbursementPolicy::from_name(&v).ok_or_else(|| ConfigError::InvalidValue {
                    var: "LEADFLOW_OVERDISBURSEMENT",
                    value: v.clone(),
                })?;
        }
        if let Some(v) = lookup("LEADFLOW_REASSIGN_SCOPE") {
            config.reassign_scope =
                ReassignScope::from_name(&v).ok_or_else(|| ConfigError::InvalidValue {
                    var: "LEADFLOW_REASSIGN_SCOPE",
                    value: v.clone(),
                })?;
        }
        if let Some(v) = lookup("LEADFLOW_COMMENT_PREVIEW_CHARS") {
            config.comment_preview_chars = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: "LEADFLOW_COMMENT_PREVIEW_CHARS",
                    value: v,
                })?;
        }

        Ok(config)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}
