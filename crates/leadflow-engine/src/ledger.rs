//! # Disbursement Ledger
//!
//! Records payments against an assignment and keeps the running total
//! exact. The total is read inside the lead's transaction, so two
//! concurrent disbursements on one assignment both count.
//!
//! When the total reaches the approved amount the case completes through
//! the named `CompleteOnFullPayment` transition, which is valid from every
//! status except `disbursed` and `closed`. Completion happens at most once.
//!
//! A total above the approved amount is governed by
//! [`OverdisbursementPolicy`].

use leadflow_core::{Actor, Amount, AssignmentId, DisbursementId, Timestamp};
use leadflow_state::{validate_transition, LeadState, LeadStatus, TransitionKind};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind};
use crate::config::OverdisbursementPolicy;
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::records::{Disbursement, DisbursementType};

/// Input to [`LeadEngine::create_disbursement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDisbursement {
    pub amount: Amount,
    pub disbursement_type: DisbursementType,
    pub tranche_number: Option<u32>,
    pub notes: Option<String>,
}

impl NewDisbursement {
    pub fn new(amount: Amount, disbursement_type: DisbursementType) -> Self {
        Self {
            amount,
            disbursement_type,
            tranche_number: None,
            notes: None,
        }
    }

    pub fn tranche(amount: Amount, number: u32) -> Self {
        Self {
            tranche_number: Some(number),
            ..Self::new(amount, DisbursementType::Tranche)
        }
    }
}

impl LeadEngine {
    pub fn create_disbursement(
        &self,
        assignment_id: &AssignmentId,
        request: NewDisbursement,
        actor: &Actor,
    ) -> Result<Disbursement, EngineError> {
        if !request.amount.is_positive() {
            return Err(EngineError::validation("disbursement amount must be positive"));
        }
        let lead_id = self.lead_of_assignment(assignment_id)?;
        let policy = self.config().overdisbursement;

        let ((disbursement, total, completed, exceeds), _) =
            self.store().transaction(lead_id, |tx| {
                let mut lead = tx.lead()?;
                let mut assignment = Self::assignment_in(tx, assignment_id)?;
                Self::require_owner(actor, &assignment, "record disbursements on this case")?;

                let total = tx
                    .total_disbursed(assignment_id)
                    .checked_add(request.amount)
                    .ok_or_else(|| EngineError::validation("disbursement total overflows"))?;
                let approved = assignment.approved_loan_amount;
                let exceeds = approved.is_some_and(|ap| total > ap);
                if exceeds && policy == OverdisbursementPolicy::Reject {
                    return Err(EngineError::validation(format!(
                        "disbursement of {} would bring the total to {total}, above the approved {}",
                        request.amount,
                        approved.unwrap_or_default()
                    )));
                }

                let now = Timestamp::now();
                let disbursement = Disbursement {
                    id: DisbursementId::new(),
                    assignment_id: *assignment_id,
                    lead_id: assignment.lead_id,
                    amount: request.amount,
                    disbursement_type: request.disbursement_type,
                    tranche_number: request.tranche_number,
                    notes: request.notes.clone(),
                    processed_by: actor.employee_id,
                    created_at: now,
                };
                tx.add_disbursement(disbursement.clone());

                let completed = approved.is_some_and(|ap| total >= ap)
                    && validate_transition(
                        TransitionKind::CompleteOnFullPayment,
                        assignment.status,
                        LeadStatus::Disbursed,
                    )
                    .is_ok();
                if completed {
                    assignment.status = LeadStatus::Disbursed;
                    lead.state = LeadState::for_status(LeadStatus::Disbursed);
                    lead.updated_at = now;
                    tx.put_lead(lead);
                }
                assignment.updated_at = now;
                tx.put_assignment(assignment);

                tx.log(ActivityEntry::new(
                    ActivityKind::DisbursementCreated,
                    format!("Disbursement of ₹{} created", request.amount),
                    ActivityData::DisbursementCreated {
                        disbursement_id: disbursement.id,
                        amount: request.amount,
                        disbursement_type: request.disbursement_type,
                        tranche_number: request.tranche_number,
                        notes: request.notes.clone(),
                        total_disbursed: total,
                        completed,
                        exceeds_approved: exceeds,
                    },
                    Some(actor.employee_id),
                ));
                Ok((disbursement, total, completed, exceeds))
            })?;

        if exceeds {
            tracing::warn!(%lead_id, %assignment_id, %total, "disbursed total exceeds approved amount");
        }
        tracing::info!(
            %lead_id,
            %assignment_id,
            amount = %disbursement.amount,
            %total,
            completed,
            "disbursement recorded"
        );
        Ok(disbursement)
    }

    /// Sum of every disbursement on the assignment; zero when there are none.
    pub fn get_total_disbursed(&self, assignment_id: &AssignmentId) -> Amount {
        self.store()
            .read(|t| t.disbursements_for(assignment_id).iter().map(|d| d.amount).sum())
    }

    /// Disbursements on the assignment in the order they were recorded.
    pub fn list_disbursements(&self, assignment_id: &AssignmentId) -> Vec<Disbursement> {
        self.store()
            .read(|t| t.disbursements_for(assignment_id).to_vec())
    }
}
