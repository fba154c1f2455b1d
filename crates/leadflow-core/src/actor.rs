//! # Actors and Roles
//!
//! The engine does not authenticate anyone. The surrounding layer tells it
//! who is acting and in which role; the engine only decides whether that
//! role may perform the requested mutation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::EmployeeId;

/// CRM role of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    /// Admins and managers may assign, reassign, and delete other people's
    /// comments.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "employee" => Ok(Self::Employee),
            _ => Err(CoreError::UnknownRole(name.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// The employee performing an operation, with the role they act in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub employee_id: EmployeeId,
    pub role: Role,
}

impl Actor {
    pub fn new(employee_id: EmployeeId, role: Role) -> Self {
        Self { employee_id, role }
    }

    pub fn admin(employee_id: EmployeeId) -> Self {
        Self::new(employee_id, Role::Admin)
    }

    pub fn manager(employee_id: EmployeeId) -> Self {
        Self::new(employee_id, Role::Manager)
    }

    pub fn employee(employee_id: EmployeeId) -> Self {
        Self::new(employee_id, Role::Employee)
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    /// Privileged, or the given employee (an owner or an author) themselves.
    pub fn is_privileged_or(&self, owner: &EmployeeId) -> bool {
        self.is_privileged() || &self.employee_id == owner
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.employee_id, self.role)
    }
}
