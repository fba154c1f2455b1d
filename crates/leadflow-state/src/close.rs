//! # Close Taxonomy
//!
//! Two vocabularies describe how a case ended:
//!
//! - [`CloseType`] is recorded on the assignment when its status becomes
//!   `closed` through the status engine.
//! - [`ClosureOutcome`] is the coarse success / not-doable choice made
//!   when a case is closed directly through the closure handler.

use serde::{Deserialize, Serialize};

use crate::status::LeadStatus;

/// Categorical reason a case was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseType {
    Approved,
    Rejected,
    NotDoable,
    Cancelled,
    Duplicate,
}

impl CloseType {
    pub const ALL: [CloseType; 5] = [
        Self::Approved,
        Self::Rejected,
        Self::NotDoable,
        Self::Cancelled,
        Self::Duplicate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NotDoable => "not_doable",
            Self::Cancelled => "cancelled",
            Self::Duplicate => "duplicate",
        }
    }

    /// Returns `None` for anything that is not a recognized close reason.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name.trim())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved => "Approved & Closed",
            Self::Rejected => "Rejected & Closed",
            Self::NotDoable => "Not Doable",
            Self::Cancelled => "Cancelled by Customer",
            Self::Duplicate => "Duplicate Lead",
        }
    }

    /// Close type implied by the status a case was in when it was closed
    /// without an explicit reason.
    pub fn infer_from(prior: LeadStatus) -> Self {
        match prior {
            LeadStatus::Approved | LeadStatus::Disbursed => Self::Approved,
            LeadStatus::Rejected => Self::Rejected,
            _ => Self::NotDoable,
        }
    }

    /// Short outcome word used in the final progress stage.
    pub fn outcome_word(&self) -> &'static str {
        match self {
            Self::Approved => "Success",
            Self::Rejected => "Rejected",
            Self::NotDoable => "Not Doable",
            Self::Cancelled => "Cancelled",
            Self::Duplicate => "Duplicate",
        }
    }
}

impl std::fmt::Display for CloseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome chosen when closing a case through the closure handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureOutcome {
    Success,
    NotDoable,
}

impl ClosureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotDoable => "not_doable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "success" => Some(Self::Success),
            "not_doable" => Some(Self::NotDoable),
            _ => None,
        }
    }

    pub fn close_message(&self) -> &'static str {
        match self {
            Self::Success => "Closed - Success",
            Self::NotDoable => "Closed - Not Doable",
        }
    }

    /// Close type recorded on the assignment for this outcome.
    pub fn close_type(&self) -> CloseType {
        match self {
            Self::Success => CloseType::Approved,
            Self::NotDoable => CloseType::NotDoable,
        }
    }
}

impl std::fmt::Display for ClosureOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
