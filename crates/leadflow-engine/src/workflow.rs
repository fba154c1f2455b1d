//! # Status Engine
//!
//! Applies status transitions to an assignment. Every change is validated
//! through [`validate_transition`]: a forward step against the forward
//! table, an undo against its inverse. Nothing is ever coerced to a
//! different target.
//!
//! Side effects of a transition, applied in the same commit:
//!
//! - reaching `closed` records a close type (explicit, or inferred from
//!   the prior status) and clears `is_doable`
//! - reaching `rejected` clears `is_doable`
//! - the lead's open/closed flag follows the new status
//! - one `status_changed` or `status_undone` activity is logged, plus a
//!   comment and its activity when the caller supplied one
//!
//! The PD and approved amount updates also live here, since the approved
//! amount is what the ledger completes a case against.

use leadflow_core::{Actor, Amount, AssignmentId, Timestamp};
use leadflow_state::{
    validate_transition, CloseType, LeadState, LeadStatus, TransitionError, TransitionKind,
};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind};
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::records::LeadAssignment;

/// Optional inputs to [`LeadEngine::update_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChange {
    /// Attached to the assignment as a comment in the same commit.
    pub comment: Option<String>,
    /// Marks the call as an undo. Must equal the current status.
    pub undo_from: Option<LeadStatus>,
    /// Close reason used when the new status is `closed`.
    pub close_type: Option<CloseType>,
}

impl StatusChange {
    pub fn undo(from: LeadStatus) -> Self {
        Self {
            undo_from: Some(from),
            ..Self::default()
        }
    }

    pub fn closing(close_type: CloseType) -> Self {
        Self {
            close_type: Some(close_type),
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum AmountField {
    Pd,
    Approved,
}

impl LeadEngine {
    /// Move an assignment to `new_status`.
    pub fn update_status(
        &self,
        assignment_id: &AssignmentId,
        new_status: LeadStatus,
        actor: &Actor,
        change: StatusChange,
    ) -> Result<LeadAssignment, EngineError> {
        let lead_id = self.lead_of_assignment(assignment_id)?;

        let (assignment, _) = self.store().transaction(lead_id, |tx| {
            let mut lead = tx.lead()?;
            let mut assignment = Self::assignment_in(tx, assignment_id)?;
            Self::require_owner(actor, &assignment, "change the status of this case")?;

            let old_status = assignment.status;
            let kind = match change.undo_from {
                Some(undo_from) if undo_from != old_status => {
                    return Err(TransitionError::UndoSourceMismatch {
                        undo_from,
                        current: old_status,
                    }
                    .into());
                }
                Some(_) => TransitionKind::Undo,
                None => TransitionKind::Forward,
            };
            validate_transition(kind, old_status, new_status)?;

            let mut description = format!("Status changed from {old_status} to {new_status}");
            let mut close_type = None;
            if new_status == LeadStatus::Closed {
                let ct = change
                    .close_type
                    .unwrap_or_else(|| CloseType::infer_from(old_status));
                description.push_str(&format!(" (Closed: {})", ct.label()));
                close_type = Some(ct);
                assignment.close_type = Some(ct);
            }
            let doable_status_changed =
                matches!(new_status, LeadStatus::Rejected | LeadStatus::Closed);
            if doable_status_changed {
                assignment.is_doable = false;
                description.push_str(" - Marked as Not Doable");
            }

            let now = Timestamp::now();
            assignment.status = new_status;
            assignment.updated_at = now;
            lead.state = LeadState::for_status(new_status);
            lead.updated_at = now;

            let comment = change
                .comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty());

            tx.put_lead(lead);
            tx.put_assignment(assignment.clone());
            tx.log(ActivityEntry::new(
                if kind == TransitionKind::Undo {
                    ActivityKind::StatusUndone
                } else {
                    ActivityKind::StatusChanged
                },
                description,
                ActivityData::StatusChanged {
                    old_status,
                    new_status,
                    close_type,
                    doable_status_changed,
                    comment: comment.map(str::to_string),
                },
                Some(actor.employee_id),
            ));
            if let Some(text) = comment {
                self.stage_comment(tx, &assignment, actor, text);
            }
            Ok(assignment)
        })?;

        tracing::info!(
            %lead_id,
            %assignment_id,
            status = %assignment.status,
            "status updated"
        );
        Ok(assignment)
    }

    /// Record the loan amount discussed at the PD stage.
    pub fn update_pd_amount(
        &self,
        assignment_id: &AssignmentId,
        amount: Amount,
        actor: &Actor,
    ) -> Result<LeadAssignment, EngineError> {
        self.update_amount(assignment_id, amount, actor, AmountField::Pd)
    }

    /// Record the sanctioned loan amount that disbursements are measured
    /// against.
    pub fn update_approved_amount(
        &self,
        assignment_id: &AssignmentId,
        amount: Amount,
        actor: &Actor,
    ) -> Result<LeadAssignment, EngineError> {
        self.update_amount(assignment_id, amount, actor, AmountField::Approved)
    }

    fn update_amount(
        &self,
        assignment_id: &AssignmentId,
        amount: Amount,
        actor: &Actor,
        field: AmountField,
    ) -> Result<LeadAssignment, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::validation("amount must be positive"));
        }
        let lead_id = self.lead_of_assignment(assignment_id)?;

        let (assignment, _) = self.store().transaction(lead_id, |tx| {
            let mut assignment = Self::assignment_in(tx, assignment_id)?;
            Self::require_owner(actor, &assignment, "update amounts on this case")?;

            let (slot, kind, label) = match field {
                AmountField::Pd => (
                    &mut assignment.pd_loan_amount,
                    ActivityKind::PdAmountUpdated,
                    "PD loan amount",
                ),
                AmountField::Approved => (
                    &mut assignment.approved_loan_amount,
                    ActivityKind::ApprovedAmountUpdated,
                    "Approved loan amount",
                ),
            };
            let old_amount = slot.replace(amount);
            assignment.updated_at = Timestamp::now();

            tx.put_assignment(assignment.clone());
            tx.log(ActivityEntry::new(
                kind,
                format!("{label} set to ₹{amount}"),
                ActivityData::AmountUpdated {
                    old_amount,
                    new_amount: amount,
                },
                Some(actor.employee_id),
            ));
            Ok(assignment)
        })?;

        tracing::info!(%lead_id, %assignment_id, ?field, %amount, "amount updated");
        Ok(assignment)
    }
}
