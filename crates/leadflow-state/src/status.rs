//! # Lead Status State Machine
//!
//! Eleven statuses, one forward table, and its inverse.
//!
//! ```text
//! new ─▶ assigned ─▶ qualified ─▶ pd ─▶ documentation ─▶ login ─▶ underwriter ─┬▶ approved ─▶ disbursed
//!            ▲            │        │          │            │           │        └▶ rejected
//!            └────────────┘◀───────┘◀─────────┘◀───────────┘◀──────────┘  (one step back)
//!
//! every non-terminal status except new ─▶ closed
//! ```
//!
//! ## Transition kinds
//!
//! | Kind | Allowed targets from `s` |
//! |---|---|
//! | `Forward` | `s.next_possible()` |
//! | `Undo` | `s.previous_possible()` (statuses that directly reach `s`) |
//! | `CompleteOnFullPayment` | `disbursed`, unless `s` is already disbursed or closed |
//! | `ForceClose` | `closed`, unless `s` is already closed |
//!
//! `closed` is terminal for every kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workflow status of a lead's assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Assigned,
    Qualified,
    /// Personal discussion with the applicant.
    Pd,
    Documentation,
    /// File logged in with the lender.
    Login,
    Underwriter,
    Approved,
    Rejected,
    Disbursed,
    Closed,
}

impl LeadStatus {
    /// All statuses in workflow order.
    pub const ALL: [LeadStatus; 11] = [
        Self::New,
        Self::Assigned,
        Self::Qualified,
        Self::Pd,
        Self::Documentation,
        Self::Login,
        Self::Underwriter,
        Self::Approved,
        Self::Rejected,
        Self::Disbursed,
        Self::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::Qualified => "qualified",
            Self::Pd => "pd",
            Self::Documentation => "documentation",
            Self::Login => "login",
            Self::Underwriter => "underwriter",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Disbursed => "disbursed",
            Self::Closed => "closed",
        }
    }

    /// Parse a status name. Returns `None` for anything unknown.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// Human-readable name for selection lists and timelines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::New => "New Lead",
            Self::Assigned => "Assigned",
            Self::Qualified => "Qualified",
            Self::Pd => "PD (Personal Discussion)",
            Self::Documentation => "Documentation",
            Self::Login => "Login",
            Self::Underwriter => "Underwriter",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Disbursed => "Disbursed",
            Self::Closed => "Closed",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::New => "Lead has been created and is awaiting assignment",
            Self::Assigned => "Lead has been assigned to an employee",
            Self::Qualified => "Lead has been qualified and is ready for processing",
            Self::Pd => "Personal discussion completed, collecting documents",
            Self::Documentation => "Documentation is being processed",
            Self::Login => "Application has been logged into the system",
            Self::Underwriter => "Case is under review by underwriter",
            Self::Approved => "Loan has been approved",
            Self::Rejected => "Loan has been rejected",
            Self::Disbursed => "Loan amount has been disbursed",
            Self::Closed => "Case has been closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Forward transition table.
    pub fn next_possible(&self) -> &'static [LeadStatus] {
        use LeadStatus::*;
        match self {
            New => &[Assigned],
            Assigned => &[Qualified, Closed],
            Qualified => &[Pd, Assigned, Closed],
            Pd => &[Documentation, Qualified, Closed],
            Documentation => &[Login, Pd, Closed],
            Login => &[Underwriter, Documentation, Closed],
            Underwriter => &[Approved, Rejected, Login, Closed],
            Approved => &[Disbursed, Underwriter, Closed],
            Rejected => &[Underwriter, Closed],
            Disbursed => &[Closed],
            Closed => &[],
        }
    }

    /// Inverse of [`next_possible`](Self::next_possible): every status from
    /// which `self` is directly reachable, in workflow order.
    pub fn previous_possible(&self) -> Vec<LeadStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.next_possible().contains(self))
            .collect()
    }

    /// Targets reachable from `self` by a transition of the given kind.
    pub fn targets(&self, kind: TransitionKind) -> Vec<LeadStatus> {
        if self.is_terminal() {
            return Vec::new();
        }
        match kind {
            TransitionKind::Forward => self.next_possible().to_vec(),
            TransitionKind::Undo => self.previous_possible(),
            TransitionKind::CompleteOnFullPayment => {
                if matches!(self, Self::Disbursed) {
                    Vec::new()
                } else {
                    vec![Self::Disbursed]
                }
            }
            TransitionKind::ForceClose => vec![Self::Closed],
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.trim()).ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

/// Lead-level open/closed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadState {
    #[default]
    Open,
    Closed,
}

impl LeadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn for_status(status: LeadStatus) -> Self {
        if status.is_terminal() {
            Self::Closed
        } else {
            Self::Open
        }
    }
}

impl std::fmt::Display for LeadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a status change was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// A normal step through the forward table.
    Forward,
    /// An explicit step back to a status that directly precedes the current one.
    Undo,
    /// Disbursements reached the approved amount.
    CompleteOnFullPayment,
    /// Closure of the case regardless of its stage.
    ForceClose,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Undo => "undo",
            Self::CompleteOnFullPayment => "complete_on_full_payment",
            Self::ForceClose => "force_close",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected status change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid {kind} transition from {from} to {to}")]
    NotAllowed {
        kind: TransitionKind,
        from: LeadStatus,
        to: LeadStatus,
    },

    /// `undo_from` did not match the status the case is actually in.
    #[error("cannot undo from {undo_from}: current status is {current}")]
    UndoSourceMismatch {
        undo_from: LeadStatus,
        current: LeadStatus,
    },

    #[error("unknown status {0:?}")]
    UnknownStatus(String),
}

/// Check one transition against the table.
pub fn validate_transition(
    kind: TransitionKind,
    from: LeadStatus,
    to: LeadStatus,
) -> Result<(), TransitionError> {
    if from.targets(kind).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::NotAllowed { kind, from, to })
    }
}
