//! Employee directory: bootstrap, registration and deactivation.
//!
//! Only an active admin in the directory may change it. The one exception
//! is [`LeadEngine::bootstrap_admin`], which creates the first admin of an
//! empty directory.

use leadflow_core::{Actor, EmployeeId, Role};

use crate::engine::LeadEngine;
use crate::error::{EngineError, RecordKind};
use crate::records::Employee;

impl LeadEngine {
    /// Create the first employee of an empty directory. It must be an admin.
    pub fn bootstrap_admin(&self, employee: Employee) -> Result<Employee, EngineError> {
        validate_employee(&employee)?;
        if employee.role != Role::Admin {
            return Err(EngineError::validation(
                "the first employee must be an admin",
            ));
        }
        if !self.store().insert_first_employee(employee.clone()) {
            tracing::warn!(employee_id = %employee.id, "bootstrap refused on a non-empty directory");
            return Err(EngineError::validation(
                "the directory already has employees; registering needs an admin actor",
            ));
        }
        tracing::info!(employee_id = %employee.id, name = %employee.name, "directory bootstrapped");
        Ok(employee)
    }

    /// Add or replace an employee in the directory.
    pub fn register_employee(&self, employee: Employee, actor: &Actor) -> Result<Employee, EngineError> {
        self.require_directory_admin(actor, "register employees")?;
        validate_employee(&employee)?;
        self.store().upsert_employee(employee.clone());
        tracing::info!(
            employee_id = %employee.id,
            role = %employee.role,
            actor = %actor,
            "employee registered"
        );
        Ok(employee)
    }

    /// Mark an employee active or inactive. Inactive employees cannot act
    /// or receive assignments; their existing records and timeline names
    /// are kept.
    pub fn set_employee_active(
        &self,
        id: &EmployeeId,
        active: bool,
        actor: &Actor,
    ) -> Result<Employee, EngineError> {
        self.require_directory_admin(actor, "change employee status")?;
        if !active && id == &actor.employee_id {
            return Err(EngineError::validation("an admin cannot deactivate themselves"));
        }
        let employee = self
            .store()
            .update_employee(id, |e| e.active = active)
            .ok_or_else(|| EngineError::not_found(RecordKind::Employee, id))?;
        tracing::info!(employee_id = %id, active, actor = %actor, "employee status changed");
        Ok(employee)
    }

    pub fn get_employee(&self, id: &EmployeeId) -> Result<Employee, EngineError> {
        self.store()
            .employee(id)
            .ok_or_else(|| EngineError::not_found(RecordKind::Employee, id))
    }

    /// The actor's directory entry must be an active admin, whatever role
    /// the actor claims.
    fn require_directory_admin(&self, actor: &Actor, action: &'static str) -> Result<(), EngineError> {
        let entry = self.store().employee(&actor.employee_id);
        if entry.is_some_and(|e| e.active && e.role == Role::Admin) {
            Ok(())
        } else {
            tracing::warn!(actor = %actor, action, "permission denied");
            Err(EngineError::permission(actor, action))
        }
    }
}

fn validate_employee(employee: &Employee) -> Result<(), EngineError> {
    if employee.name.trim().is_empty() {
        return Err(EngineError::validation("employee name is required"));
    }
    Ok(())
}

/// Register `employee` through a directory admin, bootstrapping one first
/// on an empty directory.
#[cfg(test)]
pub(crate) fn hire(engine: &LeadEngine, employee: Employee) -> Employee {
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
