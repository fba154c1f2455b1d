//! # Closure Handler
//!
//! Closes a case from any stage through the named `ForceClose` transition
//! and writes the [`CloseLead`] snapshot that outlives the lead. A lead
//! closes at most once: `ForceClose` has no targets from `closed`.

use leadflow_core::{Actor, CloseId, LeadId, Timestamp};
use leadflow_state::{validate_transition, ClosureOutcome, LeadState, LeadStatus, TransitionKind};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind};
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::records::CloseLead;

impl LeadEngine {
    /// Close a lead, assigned or not, and record the closed-case snapshot.
    pub fn close_lead(
        &self,
        lead_id: &LeadId,
        outcome: ClosureOutcome,
        close_reason: Option<String>,
        actor: &Actor,
    ) -> Result<CloseLead, EngineError> {
        let (closure, _) = self.store().transaction(*lead_id, |tx| {
            let mut lead = tx.lead()?;
            let assignment = tx.assignment();
            Self::require_owner_of_lead(actor, assignment.as_ref(), "close this lead")?;

            let previous_status = lead.status(assignment.as_ref());
            validate_transition(TransitionKind::ForceClose, previous_status, LeadStatus::Closed)?;

            let now = Timestamp::now();
            let closure = CloseLead {
                id: CloseId::new(),
                lead_id: *lead_id,
                name: lead.name.clone(),
                contact: lead.contact.clone(),
                amount: assignment
                    .as_ref()
                    .and_then(|a| a.approved_loan_amount)
                    .or(lead.loan_amount),
                outcome,
                close_message: outcome.close_message().to_string(),
                close_reason: close_reason.clone(),
                closed_by: actor.employee_id,
                closed_at: now,
            };

            if let Some(mut a) = assignment {
                a.status = LeadStatus::Closed;
                a.close_type = Some(outcome.close_type());
                if outcome == ClosureOutcome::NotDoable {
                    a.is_doable = false;
                }
                a.updated_at = now;
                tx.put_assignment(a);
            }
            lead.state = LeadState::Closed;
            lead.updated_at = now;
            tx.put_lead(lead);
            tx.put_closure(closure.clone());

            let mut description = format!("Lead closed: {}", closure.close_message);
            if let Some(reason) = close_reason.as_deref().filter(|r| !r.trim().is_empty()) {
                description.push_str(&format!(" ({reason})"));
            }
            tx.log(ActivityEntry::new(
                ActivityKind::LeadClosed,
                description,
                ActivityData::LeadClosed {
                    close_id: closure.id,
                    outcome,
                    close_message: closure.close_message.clone(),
                    close_reason,
                    previous_status,
                },
                Some(actor.employee_id),
            ));
            Ok(closure)
        })?;

        tracing::info!(%lead_id, outcome = %closure.outcome, "lead closed");
        self.notifier().lead_closed(&closure);
        Ok(closure)
    }
}
