//! Lead detail maintenance: attribute edits, priority, and admin purge.

use leadflow_core::{Actor, Amount, LeadId, Role, Timestamp};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind, FieldChange};
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::records::{Lead, Priority};

/// Changes to a lead's business attributes. `None` leaves a field alone;
/// for optional text fields, a blank string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadDetailsPatch {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub loan_amount: Option<Amount>,
    pub loan_type: Option<String>,
    pub occupation: Option<String>,
    pub has_existing_loans: Option<bool>,
    pub notes: Option<String>,
}

fn set_required(
    changes: &mut Vec<FieldChange>,
    field: &str,
    slot: &mut String,
    value: Option<String>,
) -> Result<(), EngineError> {
    let Some(value) = value else { return Ok(()) };
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(EngineError::validation(format!("{field} cannot be blank")));
    }
    if *slot != value {
        changes.push(FieldChange {
            field: field.to_string(),
            old: Some(slot.clone()),
            new: Some(value.clone()),
        });
        *slot = value;
    }
    Ok(())
}

fn set_optional<T: PartialEq + ToString>(
    changes: &mut Vec<FieldChange>,
    field: &str,
    slot: &mut Option<T>,
    value: Option<Option<T>>,
) {
    let Some(value) = value else { return };
    if *slot != value {
        changes.push(FieldChange {
            field: field.to_string(),
            old: slot.as_ref().map(ToString::to_string),
            new: value.as_ref().map(ToString::to_string),
        });
        *slot = value;
    }
}

fn text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

impl LeadDetailsPatch {
    fn apply(self, lead: &mut Lead) -> Result<Vec<FieldChange>, EngineError> {
        let mut changes = Vec::new();
        set_required(&mut changes, "name", &mut lead.name, self.name)?;
        set_required(&mut changes, "contact", &mut lead.contact, self.contact)?;
        set_optional(&mut changes, "email", &mut lead.email, text(self.email));
        set_optional(&mut changes, "city", &mut lead.city, text(self.city));
        set_optional(&mut changes, "loan_amount", &mut lead.loan_amount, self.loan_amount.map(Some));
        set_optional(&mut changes, "loan_type", &mut lead.loan_type, text(self.loan_type));
        set_optional(&mut changes, "occupation", &mut lead.occupation, text(self.occupation));
        set_optional(
            &mut changes,
            "has_existing_loans",
            &mut lead.has_existing_loans,
            self.has_existing_loans.map(Some),
        );
        set_optional(&mut changes, "notes", &mut lead.notes, text(self.notes));
        Ok(changes)
    }
}

impl LeadEngine {
    /// Edit a lead's attributes. Fails if the patch changes nothing.
    pub fn update_lead_details(
        &self,
        lead_id: &LeadId,
        patch: LeadDetailsPatch,
        actor: &Actor,
    ) -> Result<Lead, EngineError> {
        let (lead, _) = self.store().transaction(*lead_id, |tx| {
            let mut lead = tx.lead()?;
            Self::require_owner_of_lead(actor, tx.assignment().as_ref(), "edit this lead")?;

            let changes = patch.apply(&mut lead)?;
            if changes.is_empty() {
                return Err(EngineError::validation("no changes to lead details"));
            }
            let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
            let description = format!("Lead details updated: {}", fields.join(", "));

            lead.updated_at = Timestamp::now();
            tx.put_lead(lead.clone());
            tx.log(ActivityEntry::new(
                ActivityKind::LeadDetailsUpdated,
                description,
                ActivityData::DetailsUpdated { changes },
                Some(actor.employee_id),
            ));
            Ok(lead)
        })?;

        tracing::info!(%lead_id, "lead details updated");
        Ok(lead)
    }

    pub fn set_priority(
        &self,
        lead_id: &LeadId,
        priority: Priority,
        actor: &Actor,
    ) -> Result<Lead, EngineError> {
        let (lead, _) = self.store().transaction(*lead_id, |tx| {
            let mut lead = tx.lead()?;
            Self::require_owner_of_lead(actor, tx.assignment().as_ref(), "change lead priority")?;

            let old_priority = lead.priority;
            if old_priority == priority {
                return Err(EngineError::validation(format!("priority is already {priority}")));
            }
            lead.priority = priority;
            lead.updated_at = Timestamp::now();
            tx.put_lead(lead.clone());
            tx.log(ActivityEntry::new(
                ActivityKind::PriorityUpdated,
                format!("Priority changed from {old_priority} to {priority}"),
                ActivityData::PriorityUpdated {
                    old_priority,
                    new_priority: priority,
                },
                Some(actor.employee_id),
            ));
            Ok(lead)
        })?;

        tracing::info!(%lead_id, %priority, "priority updated");
        Ok(lead)
    }

    /// Permanently delete a lead with its assignment, comments,
    /// disbursements and activities. Closed-case snapshots are kept.
    pub fn purge_lead(&self, lead_id: &LeadId, actor: &Actor) -> Result<(), EngineError> {
        if actor.role != Role::Admin {
            tracing::warn!(actor = %actor, %lead_id, "purge refused");
            return Err(EngineError::permission(actor, "purge leads"));
        }
        self.store().transaction(*lead_id, |tx| {
            tx.lead()?;
            tx.purge();
            Ok(())
        })?;
        tracing::info!(%lead_id, actor = %actor, "lead purged");
        Ok(())
    }
}
