//! # Activity Logger
//!
//! One immutable [`LeadActivity`] per logical mutation, appended in the
//! same commit as the mutation itself. Components never write activities
//! directly; they stage an [`ActivityEntry`] on the transaction and the
//! store stamps it with a commit sequence number and chain digest.
//!
//! ## Hash chain
//!
//! Each entry stores the digest of the lead's previous entry
//! (`previous_digest`, all zeros for the first) and its own `digest`:
//! SHA-256 over the canonical JSON of every other field. Rewriting or
//! dropping any past entry breaks verification of every later one.

use leadflow_core::{
    sha256_digest, ActivityId, Amount, CanonicalBytes, CanonicalizationError, CloseId, CommentId,
    ContentDigest, DisbursementId, EmployeeId, LeadId, Timestamp,
};
use leadflow_state::{CloseType, ClosureOutcome, LeadStatus};
use serde::{Deserialize, Serialize};

use crate::engine::LeadEngine;
use crate::error::{EngineError, RecordKind};
use crate::records::{DisbursementType, LeadSource, Priority};

/// Shown in place of an employee name for system-generated entries.
pub const SYSTEM_ACTOR_NAME: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    Assigned,
    #[serde(rename = "lead_reassigned")]
    Reassigned,
    StatusChanged,
    StatusUndone,
    CommentAdded,
    CommentDeleted,
    PdAmountUpdated,
    ApprovedAmountUpdated,
    DisbursementCreated,
    LeadClosed,
    LeadDetailsUpdated,
    PriorityUpdated,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::Reassigned => "lead_reassigned",
            Self::StatusChanged => "status_changed",
            Self::StatusUndone => "status_undone",
            Self::CommentAdded => "comment_added",
            Self::CommentDeleted => "comment_deleted",
            Self::PdAmountUpdated => "pd_amount_updated",
            Self::ApprovedAmountUpdated => "approved_amount_updated",
            Self::DisbursementCreated => "disbursement_created",
            Self::LeadClosed => "lead_closed",
            Self::LeadDetailsUpdated => "lead_details_updated",
            Self::PriorityUpdated => "priority_updated",
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed attribute in a lead detail edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Structured payload of an activity, one variant per shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityData {
    Created {
        source: LeadSource,
        imported: bool,
    },
    Assigned {
        employee_id: EmployeeId,
        notes: Option<String>,
    },
    Reassigned {
        old_employee_id: EmployeeId,
        new_employee_id: EmployeeId,
        notes: Option<String>,
    },
    StatusChanged {
        old_status: LeadStatus,
        new_status: LeadStatus,
        close_type: Option<CloseType>,
        /// The change also cleared the doable flag.
        doable_status_changed: bool,
        comment: Option<String>,
    },
    CommentAdded {
        comment_id: CommentId,
        comment: String,
    },
    CommentDeleted {
        comment_id: CommentId,
        author_id: EmployeeId,
        deleted_comment: String,
    },
    AmountUpdated {
        old_amount: Option<Amount>,
        new_amount: Amount,
    },
    DisbursementCreated {
        disbursement_id: DisbursementId,
        amount: Amount,
        disbursement_type: DisbursementType,
        tranche_number: Option<u32>,
        notes: Option<String>,
        total_disbursed: Amount,
        /// This tranche completed the case (`disbursed`).
        completed: bool,
        exceeds_approved: bool,
    },
    LeadClosed {
        close_id: CloseId,
        outcome: ClosureOutcome,
        close_message: String,
        close_reason: Option<String>,
        previous_status: LeadStatus,
    },
    DetailsUpdated {
        changes: Vec<FieldChange>,
    },
    PriorityUpdated {
        old_priority: Priority,
        new_priority: Priority,
    },
}

/// An activity staged on a transaction, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub description: String,
    pub data: ActivityData,
    pub employee_id: Option<EmployeeId>,
}

impl ActivityEntry {
    pub fn new(
        kind: ActivityKind,
        description: impl Into<String>,
        data: ActivityData,
        employee_id: Option<EmployeeId>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            data,
            employee_id,
        }
    }
}

/// A committed, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadActivity {
    pub id: ActivityId,
    pub lead_id: LeadId,
    /// Global commit sequence; orders the timeline.
    pub sequence: u64,
    /// `None` for system-generated entries.
    pub employee_id: Option<EmployeeId>,
    pub kind: ActivityKind,
    pub description: String,
    pub data: ActivityData,
    pub created_at: Timestamp,
    pub previous_digest: ContentDigest,
    pub digest: ContentDigest,
}

#[derive(Serialize)]
struct DigestBody<'a> {
    id: &'a ActivityId,
    lead_id: &'a LeadId,
    sequence: u64,
    employee_id: &'a Option<EmployeeId>,
    kind: ActivityKind,
    description: &'a str,
    data: &'a ActivityData,
    created_at: &'a Timestamp,
    previous_digest: &'a ContentDigest,
}

impl LeadActivity {
    /// Seal a staged entry into a chained record.
    pub(crate) fn seal(
        entry: ActivityEntry,
        lead_id: LeadId,
        sequence: u64,
        created_at: Timestamp,
        previous_digest: ContentDigest,
    ) -> Result<Self, CanonicalizationError> {
        let mut activity = Self {
            id: ActivityId::new(),
            lead_id,
            sequence,
            employee_id: entry.employee_id,
            kind: entry.kind,
            description: entry.description,
            data: entry.data,
            created_at,
            previous_digest,
            digest: ContentDigest::GENESIS,
        };
        activity.digest = activity.compute_digest()?;
        Ok(activity)
    }

    /// Recompute this entry's digest from its fields.
    pub fn compute_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let body = DigestBody {
            id: &self.id,
            lead_id: &self.lead_id,
            sequence: self.sequence,
            employee_id: &self.employee_id,
            kind: self.kind,
            description: &self.description,
            data: &self.data,
            created_at: &self.created_at,
            previous_digest: &self.previous_digest,
        };
        Ok(sha256_digest(&CanonicalBytes::new(&body)?))
    }
}

/// Result of re-verifying a lead's activity chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainIntegrity {
    pub total_events: usize,
    pub broken_links: usize,
    pub chain_valid: bool,
}

/// Walk a lead's activities in commit order and count broken links.
///
/// A link is broken when an entry's stored digest does not match its
/// content, or its `previous_digest` does not match the entry before it.
pub fn verify_chain(activities: &[LeadActivity]) -> Result<ChainIntegrity, CanonicalizationError> {
    let mut broken_links = 0;
    let mut expected_prev = ContentDigest::GENESIS;
    for activity in activities {
        if activity.previous_digest != expected_prev || activity.compute_digest()? != activity.digest {
            broken_links += 1;
        }
        expected_prev = activity.digest;
    }
    Ok(ChainIntegrity {
        total_events: activities.len(),
        broken_links,
        chain_valid: broken_links == 0,
    })
}

/// A timeline row with the acting employee resolved to a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub activity: LeadActivity,
    pub employee_name: String,
}

/// First `max_chars` characters of a comment, with `...` when cut.
pub fn comment_preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

impl LeadEngine {
    /// All activities for a lead, newest first, with employee names.
    pub fn get_timeline(&self, lead_id: &LeadId) -> Result<Vec<TimelineEntry>, EngineError> {
        let (activities, names) = self.store().read(|t| {
            if !t.leads.contains(lead_id) {
                return Err(EngineError::not_found(RecordKind::Lead, lead_id));
            }
            let activities = t.activities_for(lead_id).to_vec();
            let names: Vec<String> = activities
                .iter()
                .map(|a| {
                    a.employee_id
                        .and_then(|id| t.employees.get(&id).map(|e| e.name.clone()))
                        .unwrap_or_else(|| SYSTEM_ACTOR_NAME.to_string())
                })
                .collect();
            Ok((activities, names))
        })?;

        tracing::debug!(%lead_id, entries = activities.len(), "timeline read");
        Ok(activities
            .into_iter()
            .zip(names)
            .rev()
            .map(|(activity, employee_name)| TimelineEntry {
                activity,
                employee_name,
            })
            .collect())
    }

    /// Recompute the activity hash chain of a lead.
    pub fn verify_timeline(&self, lead_id: &LeadId) -> Result<ChainIntegrity, EngineError> {
        let activities = self.store().read(|t| {
            if !t.leads.contains(lead_id) {
                return Err(EngineError::not_found(RecordKind::Lead, lead_id));
            }
            Ok(t.activities_for(lead_id).to_vec())
        })?;
        let integrity = verify_chain(&activities)?;
        if !integrity.chain_valid {
            tracing::warn!(%lead_id, broken = integrity.broken_links, "activity chain broken");
        }
        Ok(integrity)
    }
}
