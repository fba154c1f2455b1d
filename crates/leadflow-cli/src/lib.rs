//! # leadflow-cli: Command-Line Front End
//!
//! Provides the `leadflow` binary: one subcommand per engine operation,
//! run against a JSON snapshot file or, when `DATABASE_URL` is set, a
//! PostgreSQL database.
//!
//! ## Subcommands
//!
//! - `leadflow employee`: the employee directory.
//! - `leadflow lead`: intake, CSV import, listing, edits, priority, purge.
//! - `leadflow case`: assignment, status changes, amounts, disbursements,
//!   closure.
//! - `leadflow comment`: the comment thread.
//! - `leadflow report`: timelines, chain verification, progress, closed
//!   cases, the workflow table.
//!
//! ```bash
//! leadflow employee add --name "Asha Rao" --role admin
//! leadflow --actor <admin id> employee add --name "Ravi Kumar" --role manager
//! leadflow --actor <employee id> lead add --name Ravi --contact 9800000000 --channel direct
//! leadflow --actor <employee id> case status --assignment <id> --to qualified
//! leadflow report timeline --lead <id>
//! ```

pub mod backend;
pub mod case;
pub mod comment;
pub mod db;
pub mod employee;
pub mod lead;
pub mod report;
pub mod snapshot_file;

use anyhow::{bail, Context, Result};
use leadflow_core::{Actor, EmployeeId};
use leadflow_engine::{DisbursementType, LeadEngine, LeadSource, Priority};
use leadflow_state::{CloseType, ClosureOutcome};

/// The loaded engine plus the employee on whose behalf a command runs.
#[derive(Debug)]
pub struct Session {
    engine: LeadEngine,
    actor: Option<EmployeeId>,
}

impl Session {
    pub fn new(engine: LeadEngine, actor: Option<EmployeeId>) -> Self {
        Self { engine, actor }
    }

    pub fn engine(&self) -> &LeadEngine {
        &self.engine
    }

    pub fn has_actor(&self) -> bool {
        self.actor.is_some()
    }

    /// The acting employee, with the role recorded in the directory.
    pub fn actor(&self) -> Result<Actor> {
        let id = self
            .actor
            .context("this command needs --actor <employee id>")?;
        let employee = self
            .engine
            .get_employee(&id)
            .context("unknown --actor")?;
        if !employee.active {
            bail!("{} ({id}) is inactive", employee.name);
        }
        Ok(Actor::new(employee.id, employee.role))
    }
}

pub fn parse_close_type(s: &str) -> Result<CloseType, String> {
    CloseType::from_name(s).ok_or_else(|| format!("unknown close type: {s:?}"))
}

pub fn parse_outcome(s: &str) -> Result<ClosureOutcome, String> {
    ClosureOutcome::from_name(s).ok_or_else(|| format!("unknown outcome: {s:?} (success, not_doable)"))
}

pub fn parse_disbursement_type(s: &str) -> Result<DisbursementType, String> {
    DisbursementType::from_name(s)
        .ok_or_else(|| format!("unknown disbursement type: {s:?} (full, partial, tranche)"))
}

pub fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_name(s).ok_or_else(|| format!("unknown priority: {s:?} (doable, not_doable)"))
}

pub fn parse_source(s: &str) -> Result<LeadSource, String> {
    LeadSource::from_name(s).ok_or_else(|| format!("unknown lead source: {s:?}"))
}

/// Render an optional value for table output.
pub(crate) fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Register `employee` through a directory admin, bootstrapping one first
/// on an empty directory.
#[cfg(test)]
pub(crate) fn hire(engine: &LeadEngine, employee: leadflow_engine::Employee) -> leadflow_engine::Employee {
    use leadflow_core::Role;
    use leadflow_engine::Employee;

    let admin = engine
        .store()
        .employees()
        .into_iter()
        .find(|e| e.active && e.role == Role::Admin)
        .unwrap_or_else(|| {
            engine
                .bootstrap_admin(Employee::new("Directory Admin", Role::Admin, None))
                .unwrap()
        });
    engine
        .register_employee(employee, &Actor::admin(admin.id))
        .unwrap()
}
