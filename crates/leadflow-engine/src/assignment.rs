//! # Assignment Manager
//!
//! Creates the single assignment a lead may have and moves it between
//! owners. Both operations are restricted to privileged actors.
//!
//! Uniqueness is enforced twice: `assign` refuses a lead whose transaction
//! already sees an assignment, and the store's commit re-checks its unique
//! lead → assignment index, so two concurrent `assign` calls for one lead
//! produce exactly one assignment and one `AlreadyAssigned`.

use leadflow_core::{Actor, AssignmentId, EmployeeId, LeadId, Role, Timestamp};
use leadflow_state::{validate_transition, LeadStatus, TransitionKind};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind};
use crate::config::ReassignScope;
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::records::LeadAssignment;
use crate::store::Transaction;

impl LeadEngine {
    /// Create the lead's assignment with status `assigned`.
    pub fn assign(
        &self,
        lead_id: &LeadId,
        employee_id: &EmployeeId,
        actor: &Actor,
        notes: Option<String>,
    ) -> Result<LeadAssignment, EngineError> {
        Self::require_privileged(actor, "assign leads")?;

        let (assignment, _) = self.store().transaction(*lead_id, |tx| {
            let mut lead = tx.lead()?;
            let employee = Self::active_employee(tx, employee_id)?;
            if let Some(existing) = tx.assignment() {
                return Err(EngineError::AlreadyAssigned {
                    lead_id: *lead_id,
                    assignment_id: existing.id,
                });
            }
            validate_transition(TransitionKind::Forward, lead.status(None), LeadStatus::Assigned)?;

            let now = Timestamp::now();
            let assignment = LeadAssignment {
                id: AssignmentId::new(),
                lead_id: *lead_id,
                employee_id: employee.id,
                assigned_by: actor.employee_id,
                status: LeadStatus::Assigned,
                is_doable: true,
                pd_loan_amount: None,
                approved_loan_amount: None,
                close_type: None,
                notes: notes.clone(),
                assigned_at: now,
                updated_at: now,
            };
            lead.updated_at = now;
            tx.put_lead(lead);
            tx.insert_assignment(assignment.clone());
            tx.log(ActivityEntry::new(
                ActivityKind::Assigned,
                format!("Lead assigned to {}", employee.name),
                ActivityData::Assigned {
                    employee_id: employee.id,
                    notes,
                },
                Some(actor.employee_id),
            ));
            Ok(assignment)
        })?;

        tracing::info!(
            %lead_id,
            assignment_id = %assignment.id,
            employee_id = %assignment.employee_id,
            "lead assigned"
        );
        Ok(assignment)
    }

    /// Move the lead's assignment to another employee. Status, amounts and
    /// history stay with the assignment.
    pub fn reassign(
        &self,
        lead_id: &LeadId,
        new_employee_id: &EmployeeId,
        actor: &Actor,
        notes: Option<String>,
    ) -> Result<LeadAssignment, EngineError> {
        Self::require_privileged(actor, "reassign leads")?;

        let (assignment, _) = self.store().transaction(*lead_id, |tx| {
            let mut lead = tx.lead()?;
            let mut assignment = tx.require_assignment()?;
            if assignment.status.is_terminal() {
                return Err(EngineError::validation("cannot reassign a closed case"));
            }
            let new_owner = Self::active_employee(tx, new_employee_id)?;
            if new_owner.id == assignment.employee_id {
                return Err(EngineError::validation(format!(
                    "lead is already assigned to {}",
                    new_owner.name
                )));
            }
            self.check_reassign_scope(tx, actor, &assignment.employee_id, new_employee_id)?;

            let old_employee_id = assignment.employee_id;
            let old_name = tx
                .employee(&old_employee_id)
                .map(|e| e.name)
                .unwrap_or_else(|| old_employee_id.to_string());

            let now = Timestamp::now();
            assignment.employee_id = new_owner.id;
            assignment.assigned_by = actor.employee_id;
            if notes.is_some() {
                assignment.notes = notes.clone();
            }
            assignment.updated_at = now;
            lead.updated_at = now;

            tx.put_lead(lead);
            tx.put_assignment(assignment.clone());
            tx.log(ActivityEntry::new(
                ActivityKind::Reassigned,
                format!("Lead reassigned from {old_name} to {}", new_owner.name),
                ActivityData::Reassigned {
                    old_employee_id,
                    new_employee_id: new_owner.id,
                    notes,
                },
                Some(actor.employee_id),
            ));
            Ok(assignment)
        })?;

        tracing::info!(
            %lead_id,
            assignment_id = %assignment.id,
            employee_id = %assignment.employee_id,
            "lead reassigned"
        );
        Ok(assignment)
    }

    /// Under `OwnTeam`, a manager may only move leads between members of
    /// their own team.
    fn check_reassign_scope(
        &self,
        tx: &Transaction<'_>,
        actor: &Actor,
        old_owner: &EmployeeId,
        new_owner: &EmployeeId,
    ) -> Result<(), EngineError> {
        if actor.role != Role::Manager || self.config().reassign_scope == ReassignScope::AnyTeam {
            return Ok(());
        }
        let denied = || {
            tracing::warn!(actor = %actor, "reassignment outside own team refused");
            EngineError::permission(actor, "reassign leads outside their team")
        };
        let team = tx
            .employee(&actor.employee_id)
            .and_then(|m| m.team)
            .ok_or_else(denied)?;
        let in_team = |id: &EmployeeId| tx.employee(id).is_some_and(|e| e.team == Some(team));
        if in_team(old_owner) && in_team(new_owner) {
            Ok(())
        } else {
            Err(denied())
        }
    }
}
