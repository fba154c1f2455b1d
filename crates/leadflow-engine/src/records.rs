//! # Lead Store Records
//!
//! The durable record set of the workflow. Records carry data only; the
//! rules about how they change live in the component modules.
//!
//! Status lives on [`LeadAssignment`] alone. A [`Lead`] exposes it through
//! [`Lead::status`], which reads through to the assignment when one exists,
//! so the two can never disagree.

use chrono::NaiveDate;
use leadflow_core::{
    Amount, AssignmentId, CloseId, CommentId, DisbursementId, EmployeeId, LeadId, Role, TeamId,
    Timestamp,
};
use leadflow_state::{CloseType, ClosureOutcome, LeadState, LeadStatus};
use serde::{Deserialize, Serialize};

// ── Lead ─────────────────────────────────────────────────────────────

/// Channel a lead arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    Social,
    Manual,
    Referral,
    WalkIn,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Social => "social",
            Self::Manual => "manual",
            Self::Referral => "referral",
            Self::WalkIn => "walk_in",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "website" => Some(Self::Website),
            "social" => Some(Self::Social),
            "manual" => Some(Self::Manual),
            "referral" => Some(Self::Referral),
            "walk_in" => Some(Self::WalkIn),
            _ => None,
        }
    }
}

impl std::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-specific fields. The variant determines the lead's source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceDetails {
    Website {
        message: Option<String>,
    },
    Social {
        platform: String,
        message: Option<String>,
    },
    Manual {
        created_by: Option<EmployeeId>,
        date_of_birth: Option<NaiveDate>,
        /// Entered through a CSV bulk import rather than the form.
        #[serde(default)]
        imported: bool,
    },
    Referral {
        referred_by: Option<String>,
    },
    WalkIn {
        branch: Option<String>,
    },
}

impl SourceDetails {
    pub fn source(&self) -> LeadSource {
        match self {
            Self::Website { .. } => LeadSource::Website,
            Self::Social { .. } => LeadSource::Social,
            Self::Manual { .. } => LeadSource::Manual,
            Self::Referral { .. } => LeadSource::Referral,
            Self::WalkIn { .. } => LeadSource::WalkIn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Doable,
    NotDoable,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doable => "doable",
            Self::NotDoable => "not_doable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "doable" => Some(Self::Doable),
            "not_doable" => Some(Self::NotDoable),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound loan inquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    /// Phone number or other primary contact; duplicate detection keys on it.
    pub contact: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub loan_amount: Option<Amount>,
    pub loan_type: Option<String>,
    pub occupation: Option<String>,
    pub has_existing_loans: Option<bool>,
    pub source_details: SourceDetails,
    /// Free-form notes that fit no structured field.
    pub notes: Option<String>,
    pub state: LeadState,
    pub priority: Priority,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Lead {
    pub fn source(&self) -> LeadSource {
        self.source_details.source()
    }

    /// Workflow status: the assignment's when there is one, otherwise
    /// `new`, or `closed` for a lead closed before it was ever assigned.
    pub fn status(&self, assignment: Option<&LeadAssignment>) -> LeadStatus {
        match assignment {
            Some(a) => a.status,
            None if self.state == LeadState::Closed => LeadStatus::Closed,
            None => LeadStatus::New,
        }
    }
}

// ── Assignment ───────────────────────────────────────────────────────

/// The single work record binding a lead to its current owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadAssignment {
    pub id: AssignmentId,
    pub lead_id: LeadId,
    pub employee_id: EmployeeId,
    pub assigned_by: EmployeeId,
    pub status: LeadStatus,
    pub is_doable: bool,
    pub pd_loan_amount: Option<Amount>,
    pub approved_loan_amount: Option<Amount>,
    /// Set only when the status becomes `closed`.
    pub close_type: Option<CloseType>,
    pub notes: Option<String>,
    pub assigned_at: Timestamp,
    pub updated_at: Timestamp,
}

// ── Comments, disbursements, closures ────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadComment {
    pub id: CommentId,
    pub assignment_id: AssignmentId,
    pub lead_id: LeadId,
    pub author_id: EmployeeId,
    pub text: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursementType {
    Full,
    Partial,
    Tranche,
}

impl DisbursementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::Tranche => "tranche",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "full" => Some(Self::Full),
            "partial" => Some(Self::Partial),
            "tranche" => Some(Self::Tranche),
            _ => None,
        }
    }
}

impl std::fmt::Display for DisbursementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One payment against an assignment's approved amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    pub id: DisbursementId,
    pub assignment_id: AssignmentId,
    pub lead_id: LeadId,
    pub amount: Amount,
    pub disbursement_type: DisbursementType,
    pub tranche_number: Option<u32>,
    pub notes: Option<String>,
    pub processed_by: EmployeeId,
    pub created_at: Timestamp,
}

/// Snapshot of a case taken when it is closed. Survives a purge of the lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseLead {
    pub id: CloseId,
    pub lead_id: LeadId,
    pub name: String,
    pub contact: String,
    /// Approved amount, or the requested amount if never approved.
    pub amount: Option<Amount>,
    pub outcome: ClosureOutcome,
    pub close_message: String,
    pub close_reason: Option<String>,
    pub closed_by: EmployeeId,
    pub closed_at: Timestamp,
}

// ── Employees ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: Role,
    pub team: Option<TeamId>,
    pub active: bool,
}

impl Employee {
    pub fn new(name: impl Into<String>, role: Role, team: Option<TeamId>) -> Self {
        Self {
            id: EmployeeId::new(),
            name: name.into(),
            role,
            team,
            active: true,
        }
    }
}
