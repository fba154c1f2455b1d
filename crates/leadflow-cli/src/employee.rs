//! # Employee Subcommand
//!
//! Maintains the employee directory that actors, owners and timeline names
//! are resolved against. Every change needs an admin `--actor`, except the
//! first `add` on an empty directory, which creates the bootstrap admin.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use leadflow_core::{EmployeeId, Role, TeamId};
use leadflow_engine::Employee;

use crate::{or_dash, Session};

#[derive(Args, Debug)]
pub struct EmployeeArgs {
    #[command(subcommand)]
    pub command: EmployeeCommand,
}

#[derive(Subcommand, Debug)]
pub enum EmployeeCommand {
    /// Register an employee.
    Add {
        #[arg(long)]
        name: String,
        /// admin, manager or employee.
        #[arg(long, default_value = "employee")]
        role: Role,
        /// Team identifier, for the own-team reassign scope.
        #[arg(long)]
        team: Option<TeamId>,
    },

    /// Stop an employee from acting or receiving assignments.
    Deactivate {
        #[arg(long)]
        id: EmployeeId,
    },

    /// Let a deactivated employee act again.
    Activate {
        #[arg(long)]
        id: EmployeeId,
    },

    /// List registered employees.
    List,
}

impl EmployeeCommand {
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::List)
    }
}

pub fn run_employee(args: &EmployeeArgs, session: &Session) -> Result<u8> {
    match &args.command {
        EmployeeCommand::Add { name, role, team } => {
            let engine = session.engine();
            let employee = Employee::new(name.clone(), *role, *team);
            let employee = if session.has_actor() {
                engine.register_employee(employee, &session.actor()?)?
            } else if engine.store().employees().is_empty() {
                engine.bootstrap_admin(employee)?
            } else {
                bail!("registering employees needs an admin --actor <employee id>");
            };
            println!(
                "OK: registered {} {} as {}",
                employee.id,
                employee.name,
                employee.role.as_str()
            );
            Ok(0)
        }
        EmployeeCommand::Deactivate { id } => {
            let e = session
                .engine()
                .set_employee_active(id, false, &session.actor()?)?;
            println!("OK: {} ({}) deactivated", e.id, e.name);
            Ok(0)
        }
        EmployeeCommand::Activate { id } => {
            let e = session
                .engine()
                .set_employee_active(id, true, &session.actor()?)?;
            println!("OK: {} ({}) activated", e.id, e.name);
            Ok(0)
        }
        EmployeeCommand::List => {
            let employees = session.engine().store().employees();
            if employees.is_empty() {
                println!("No employees registered.");
                return Ok(0);
            }
            for e in employees {
                println!(
                    "{:<48} {:<24} {:<10} {:<45} {}",
                    e.id,
                    e.name,
                    e.role.as_str(),
                    or_dash(e.team),
                    if e.active { "active" } else { "inactive" }
                );
            }
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_engine::{EngineConfig, LeadEngine, LeadStore};

    fn add(name: &str, role: Role) -> EmployeeArgs {
        EmployeeArgs {
            command: EmployeeCommand::Add {
                name: name.into(),
                role,
                team: None,
            },
        }
    }

    fn empty_engine() -> LeadEngine {
        LeadEngine::new(LeadStore::new(), EngineConfig::default())
    }

    /// An engine whose directory holds one admin, and that admin's id.
    fn staffed() -> (LeadEngine, EmployeeId) {
        let engine = empty_engine();
        let admin = engine
            .bootstrap_admin(Employee::new("Kabir", Role::Admin, None))
            .unwrap();
        (engine, admin.id)
    }

    #[test]
    fn first_add_bootstraps_admin_without_actor() {
        let session = Session::new(empty_engine(), None);
        assert_eq!(run_employee(&add("Kabir", Role::Admin), &session).unwrap(), 0);
        let employees = session.engine().store().employees();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].role, Role::Admin);
    }

    #[test]
    fn first_employee_must_be_admin() {
        let session = Session::new(empty_engine(), None);
        assert!(run_employee(&add("Kabir", Role::Employee), &session).is_err());
        assert!(session.engine().store().employees().is_empty());
    }

    #[test]
    fn later_adds_need_an_actor() {
        let (engine, _) = staffed();
        let session = Session::new(engine, None);
        let err = run_employee(&add("Intruder", Role::Admin), &session).unwrap_err();
        assert!(err.to_string().contains("--actor"));
        assert_eq!(session.engine().store().employees().len(), 1);
    }

    #[test]
    fn non_admin_actor_cannot_add() {
        let (engine, admin) = staffed();
        let session = Session::new(engine, Some(admin));
        run_employee(&add("Meera", Role::Manager), &session).unwrap();
        let manager = session
            .engine()
            .store()
            .employees()
            .into_iter()
            .find(|e| e.role == Role::Manager)
            .unwrap();

        let as_manager = Session::new(session.engine().clone(), Some(manager.id));
        assert!(run_employee(&add("Rogue", Role::Admin), &as_manager).is_err());
        assert_eq!(session.engine().store().employees().len(), 2);
    }

    #[test]
    fn deactivated_employee_cannot_act() {
        let (engine, admin) = staffed();
        let session = Session::new(engine, Some(admin));
        run_employee(&add("Arjun", Role::Employee), &session).unwrap();
        let arjun = session
            .engine()
            .store()
            .employees()
            .into_iter()
            .find(|e| e.name == "Arjun")
            .unwrap();

        let deactivate = EmployeeArgs {
            command: EmployeeCommand::Deactivate { id: arjun.id },
        };
        run_employee(&deactivate, &session).unwrap();
        let as_arjun = Session::new(session.engine().clone(), Some(arjun.id));
        assert!(as_arjun.actor().unwrap_err().to_string().contains("inactive"));

        let activate = EmployeeArgs {
            command: EmployeeCommand::Activate { id: arjun.id },
        };
        run_employee(&activate, &session).unwrap();
        assert!(as_arjun.actor().is_ok());
    }

    #[test]
    fn blank_name_is_refused() {
        let session = Session::new(empty_engine(), None);
        assert!(run_employee(&add("  ", Role::Admin), &session).is_err());
    }

    #[test]
    fn list_does_not_mutate() {
        assert!(!EmployeeCommand::List.mutates());
        assert!(EmployeeCommand::Deactivate {
            id: EmployeeId::new()
        }
        .mutates());
    }
}
