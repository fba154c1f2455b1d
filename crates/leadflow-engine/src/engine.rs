//! # Lead Engine
//!
//! [`LeadEngine`] is the call surface of the workflow. It owns a handle to
//! the [`LeadStore`], the [`EngineConfig`] policies, and the outbound
//! notifier. Each component adds its operations in its own module through
//! an `impl LeadEngine` block; this module holds construction, the shared
//! permission checks, and the read-only queries.

use std::sync::Arc;

use leadflow_core::{Actor, AssignmentId, EmployeeId, LeadId};
use leadflow_state::{workflow_progress, LeadStatus, ProgressStage};

use crate::config::EngineConfig;
use crate::error::{EngineError, RecordKind};
use crate::notify::{LeadNotifier, TracingNotifier};
use crate::records::{CloseLead, Employee, Lead, LeadAssignment, LeadSource};
use crate::store::{LeadStore, Transaction};

#[derive(Clone)]
pub struct LeadEngine {
    store: LeadStore,
    config: EngineConfig,
    notifier: Arc<dyn LeadNotifier>,
}

impl std::fmt::Debug for LeadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadEngine")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LeadEngine {
    pub fn new(store: LeadStore, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LeadNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn notifier(&self) -> &dyn LeadNotifier {
        self.notifier.as_ref()
    }

    // ── Shared checks ────────────────────────────────────────────────

    /// Lead owning an assignment, or `NotFound(assignment)`.
    pub(crate) fn lead_of_assignment(&self, id: &AssignmentId) -> Result<LeadId, EngineError> {
        self.store
            .lead_of_assignment(id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Assignment, id))
    }

    /// The transaction's assignment, checked to be the one the caller named.
    pub(crate) fn assignment_in(
        tx: &Transaction<'_>,
        id: &AssignmentId,
    ) -> Result<LeadAssignment, EngineError> {
        tx.assignment()
            .filter(|a| &a.id == id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Assignment, id))
    }

    /// Privileged actors and the assignment's owner may work a case.
    pub(crate) fn require_owner(
        actor: &Actor,
        assignment: &LeadAssignment,
        action: &'static str,
    ) -> Result<(), EngineError> {
        if actor.is_privileged_or(&assignment.employee_id) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor, assignment_id = %assignment.id, action, "permission denied");
            Err(EngineError::permission(actor, action))
        }
    }

    /// Like [`require_owner`](Self::require_owner), but an unassigned lead
    /// can only be touched by a privileged actor.
    pub(crate) fn require_owner_of_lead(
        actor: &Actor,
        assignment: Option<&LeadAssignment>,
        action: &'static str,
    ) -> Result<(), EngineError> {
        match assignment {
            Some(a) => Self::require_owner(actor, a, action),
            None if actor.is_privileged() => Ok(()),
            None => {
                tracing::warn!(actor = %actor, action, "permission denied");
                Err(EngineError::permission(actor, action))
            }
        }
    }

    pub(crate) fn require_privileged(actor: &Actor, action: &'static str) -> Result<(), EngineError> {
        if actor.is_privileged() {
            Ok(())
        } else {
            tracing::warn!(actor = %actor, action, "permission denied");
            Err(EngineError::permission(actor, action))
        }
    }

    /// Target of an assignment: must exist and be active.
    pub(crate) fn active_employee(
        tx: &Transaction<'_>,
        id: &EmployeeId,
    ) -> Result<Employee, EngineError> {
        let employee = tx
            .employee(id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Employee, id))?;
        if !employee.active {
            return Err(EngineError::validation(format!(
                "employee {} is inactive",
                employee.name
            )));
        }
        Ok(employee)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get_lead(&self, id: &LeadId) -> Result<Lead, EngineError> {
        self.store
            .read(|t| t.leads.get(id).cloned())
            .ok_or_else(|| EngineError::not_found(RecordKind::Lead, id))
    }

    pub fn get_assignment(&self, id: &AssignmentId) -> Result<LeadAssignment, EngineError> {
        self.store
            .read(|t| t.assignments.get(id).cloned())
            .ok_or_else(|| EngineError::not_found(RecordKind::Assignment, id))
    }

    /// The lead's assignment, if it has been assigned.
    pub fn assignment_for_lead(&self, lead_id: &LeadId) -> Option<LeadAssignment> {
        self.store.read(|t| t.assignment_for_lead(lead_id).cloned())
    }

    /// Read-through status of a lead.
    pub fn lead_status(&self, lead_id: &LeadId) -> Result<LeadStatus, EngineError> {
        self.store.read(|t| {
            let lead = t
                .leads
                .get(lead_id)
                .ok_or_else(|| EngineError::not_found(RecordKind::Lead, lead_id))?;
            Ok(lead.status(t.assignment_for_lead(lead_id)))
        })
    }

    /// Leads matching every set field of the filter, newest first.
    pub fn list_leads(&self, filter: &LeadFilter) -> Vec<Lead> {
        self.store.read(|t| {
            t.leads
                .list()
                .rev()
                .filter(|lead| {
                    let assignment = t.assignment_for_lead(&lead.id);
                    filter.status.map_or(true, |s| lead.status(assignment) == s)
                        && filter.source.map_or(true, |s| lead.source() == s)
                        && filter
                            .employee
                            .map_or(true, |e| assignment.is_some_and(|a| a.employee_id == e))
                })
                .cloned()
                .collect()
        })
    }

    /// Closed-case snapshots, newest first.
    pub fn list_closed_cases(&self) -> Vec<CloseLead> {
        self.store.read(|t| t.closures.iter().rev().cloned().collect())
    }

    /// Stage list for a lead's case.
    pub fn get_workflow_progress(&self, lead_id: &LeadId) -> Result<Vec<ProgressStage>, EngineError> {
        self.store.read(|t| {
            let lead = t
                .leads
                .get(lead_id)
                .ok_or_else(|| EngineError::not_found(RecordKind::Lead, lead_id))?;
            let assignment = t.assignment_for_lead(lead_id);
            let close_type = match assignment {
                Some(a) => a.close_type,
                None => t
                    .closures
                    .iter()
                    .rev()
                    .find(|c| &c.lead_id == lead_id)
                    .map(|c| c.outcome.close_type()),
            };
            Ok(workflow_progress(lead.status(assignment), lead.state, close_type))
        })
    }

    /// Forward targets of a status with their display names.
    pub fn get_next_possible(&self, status: LeadStatus) -> Vec<(LeadStatus, &'static str)> {
        status
            .next_possible()
            .iter()
            .map(|s| (*s, s.display_name()))
            .collect()
    }

    /// Statuses an undo may return to from `status`, with display names.
    pub fn get_previous_possible(&self, status: LeadStatus) -> Vec<(LeadStatus, &'static str)> {
        status
            .previous_possible()
            .into_iter()
            .map(|s| (s, s.display_name()))
            .collect()
    }
}

/// Criteria for [`LeadEngine::list_leads`]. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub employee: Option<EmployeeId>,
}
