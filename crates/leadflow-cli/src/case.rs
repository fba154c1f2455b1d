//! # Case Subcommand
//!
//! Work on a lead's assignment: ownership, status, amounts, payouts and
//! closure. Every subcommand except `disbursements` needs `--actor`.
//!
//! ## Subcommands
//!
//! - `assign` / `reassign`: give the lead an owner, or a new one.
//! - `status`: move the case along the workflow, or undo one step.
//! - `pd-amount` / `approved-amount`: record loan amounts.
//! - `disburse`: record a payment; completes the case once the approved
//!   amount is reached.
//! - `disbursements`: list payments with the running total.
//! - `close`: close the lead from any stage.

use anyhow::Result;
use clap::{Args, Subcommand};
use leadflow_core::{Amount, AssignmentId, EmployeeId, LeadId};
use leadflow_engine::{DisbursementType, LeadAssignment, NewDisbursement, StatusChange};
use leadflow_state::{CloseType, ClosureOutcome, LeadStatus};

use crate::{or_dash, parse_close_type, parse_disbursement_type, parse_outcome, Session};

#[derive(Args, Debug)]
pub struct CaseArgs {
    #[command(subcommand)]
    pub command: CaseCommand,
}

#[derive(Subcommand, Debug)]
pub enum CaseCommand {
    /// Assign an unassigned lead to an employee.
    Assign {
        #[arg(long)]
        lead: LeadId,
        #[arg(long)]
        employee: EmployeeId,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Move a lead's assignment to another employee.
    Reassign {
        #[arg(long)]
        lead: LeadId,
        #[arg(long)]
        employee: EmployeeId,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Change the status of a case (e.g. qualified, pd, closed).
    Status {
        #[arg(long)]
        assignment: AssignmentId,
        #[arg(long)]
        to: LeadStatus,
        /// Step back from the current status instead of forward.
        #[arg(long)]
        undo: bool,
        /// Close reason when moving to closed; inferred when omitted.
        #[arg(long, value_parser = parse_close_type)]
        close_type: Option<CloseType>,
        /// Comment attached to the case with the change.
        #[arg(long)]
        comment: Option<String>,
    },

    /// Record the loan amount discussed at the PD stage.
    PdAmount {
        #[arg(long)]
        assignment: AssignmentId,
        #[arg(long)]
        amount: Amount,
    },

    /// Record the sanctioned loan amount.
    ApprovedAmount {
        #[arg(long)]
        assignment: AssignmentId,
        #[arg(long)]
        amount: Amount,
    },

    /// Record a disbursement.
    Disburse {
        #[arg(long)]
        assignment: AssignmentId,
        #[arg(long)]
        amount: Amount,
        /// full, partial or tranche.
        #[arg(long = "type", value_parser = parse_disbursement_type, default_value = "partial")]
        disbursement_type: DisbursementType,
        #[arg(long)]
        tranche: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List disbursements of a case.
    Disbursements {
        #[arg(long)]
        assignment: AssignmentId,
    },

    /// Close a lead: success or not_doable.
    Close {
        #[arg(long)]
        lead: LeadId,
        #[arg(long, value_parser = parse_outcome)]
        outcome: ClosureOutcome,
        #[arg(long)]
        reason: Option<String>,
    },
}

impl CaseCommand {
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::Disbursements { .. })
    }
}

pub fn run_case(args: &CaseArgs, session: &Session) -> Result<u8> {
    let engine = session.engine();
    match &args.command {
        CaseCommand::Assign {
            lead,
            employee,
            notes,
        } => {
            let a = engine.assign(lead, employee, &session.actor()?, notes.clone())?;
            println!("OK: {lead} assigned to {} as {}", a.employee_id, a.id);
            Ok(0)
        }

        CaseCommand::Reassign {
            lead,
            employee,
            notes,
        } => {
            let a = engine.reassign(lead, employee, &session.actor()?, notes.clone())?;
            println!("OK: {lead} reassigned to {}", a.employee_id);
            Ok(0)
        }

        CaseCommand::Status {
            assignment,
            to,
            undo,
            close_type,
            comment,
        } => {
            let before = engine.get_assignment(assignment)?;
            let change = StatusChange {
                comment: comment.clone(),
                undo_from: undo.then_some(before.status),
                close_type: *close_type,
            };
            let after = engine.update_status(assignment, *to, &session.actor()?, change)?;
            println!("OK: {}", describe_status(&before, &after));
            Ok(0)
        }

        CaseCommand::PdAmount { assignment, amount } => {
            engine.update_pd_amount(assignment, *amount, &session.actor()?)?;
            println!("OK: PD amount of {assignment} set to {amount}");
            Ok(0)
        }

        CaseCommand::ApprovedAmount { assignment, amount } => {
            engine.update_approved_amount(assignment, *amount, &session.actor()?)?;
            println!("OK: approved amount of {assignment} set to {amount}");
            Ok(0)
        }

        CaseCommand::Disburse {
            assignment,
            amount,
            disbursement_type,
            tranche,
            notes,
        } => {
            let new = NewDisbursement {
                amount: *amount,
                disbursement_type: *disbursement_type,
                tranche_number: *tranche,
                notes: notes.clone(),
            };
            let d = engine.create_disbursement(assignment, new, &session.actor()?)?;
            let status = engine.get_assignment(assignment)?.status;
            println!(
                "OK: disbursed {} ({}); total {}, case {}",
                d.amount,
                d.id,
                engine.get_total_disbursed(assignment),
                status
            );
            Ok(0)
        }

        CaseCommand::Disbursements { assignment } => {
            let a = engine.get_assignment(assignment)?;
            for d in engine.list_disbursements(assignment) {
                println!(
                    "{}  {:>14}  {:<8} {:<4} {}",
                    d.created_at,
                    d.amount.to_string(),
                    d.disbursement_type.as_str(),
                    or_dash(d.tranche_number),
                    d.notes.as_deref().unwrap_or("")
                );
            }
            println!(
                "total {} of approved {}",
                engine.get_total_disbursed(assignment),
                or_dash(a.approved_loan_amount)
            );
            Ok(0)
        }

        CaseCommand::Close {
            lead,
            outcome,
            reason,
        } => {
            let closure = engine.close_lead(lead, *outcome, reason.clone(), &session.actor()?)?;
            println!("OK: {lead} closed: {}", closure.close_message);
            Ok(0)
        }
    }
}

fn describe_status(before: &LeadAssignment, after: &LeadAssignment) -> String {
    let mut line = format!(
        "{} moved {} -> {}",
        after.id,
        before.status.display_name(),
        after.status.display_name()
    );
    if let Some(ct) = after.close_type.filter(|_| after.status == LeadStatus::Closed) {
        line.push_str(&format!(" ({})", ct.label()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hire;
    use leadflow_core::Role;
    use leadflow_engine::{Employee, EngineConfig, LeadEngine, LeadInput, LeadStore};

    struct Fixture {
        session: Session,
        lead: LeadId,
        owner: EmployeeId,
    }

    fn fixture() -> Fixture {
        let engine = LeadEngine::new(LeadStore::new(), EngineConfig::default());
        let manager = hire(&engine, Employee::new("Lead Manager", Role::Manager, None));
        let owner = hire(&engine, Employee::new("Field Officer", Role::Employee, None));
        let lead = engine
            .from_website(LeadInput::new("Varun", "9888888888"), None)
            .unwrap();
        Fixture {
            session: Session::new(engine, Some(manager.id)),
            lead: lead.id,
            owner: owner.id,
        }
    }

    fn assign(f: &Fixture) -> AssignmentId {
        let args = CaseArgs {
            command: CaseCommand::Assign {
                lead: f.lead,
                employee: f.owner,
                notes: None,
            },
        };
        run_case(&args, &f.session).unwrap();
        f.session.engine().assignment_for_lead(&f.lead).unwrap().id
    }

    fn status(assignment: AssignmentId, to: LeadStatus, undo: bool) -> CaseArgs {
        CaseArgs {
            command: CaseCommand::Status {
                assignment,
                to,
                undo,
                close_type: None,
                comment: None,
            },
        }
    }

    #[test]
    fn status_forward_then_undo() {
        let f = fixture();
        let a = assign(&f);
        run_case(&status(a, LeadStatus::Qualified, false), &f.session).unwrap();
        run_case(&status(a, LeadStatus::Pd, false), &f.session).unwrap();
        run_case(&status(a, LeadStatus::Qualified, true), &f.session).unwrap();
        assert_eq!(
            f.session.engine().get_assignment(&a).unwrap().status,
            LeadStatus::Qualified
        );
    }

    #[test]
    fn skipping_a_stage_is_refused() {
        let f = fixture();
        let a = assign(&f);
        assert!(run_case(&status(a, LeadStatus::Login, false), &f.session).is_err());
    }

    #[test]
    fn full_disbursement_completes_case() {
        let f = fixture();
        let a = assign(&f);
        let approve = CaseArgs {
            command: CaseCommand::ApprovedAmount {
                assignment: a,
                amount: Amount::from_major(40_000),
            },
        };
        run_case(&approve, &f.session).unwrap();
        let disburse = CaseArgs {
            command: CaseCommand::Disburse {
                assignment: a,
                amount: Amount::from_major(40_000),
                disbursement_type: DisbursementType::Full,
                tranche: None,
                notes: None,
            },
        };
        run_case(&disburse, &f.session).unwrap();
        assert_eq!(
            f.session.engine().get_assignment(&a).unwrap().status,
            LeadStatus::Disbursed
        );
    }

    #[test]
    fn close_writes_snapshot() {
        let f = fixture();
        let close = CaseArgs {
            command: CaseCommand::Close {
                lead: f.lead,
                outcome: ClosureOutcome::NotDoable,
                reason: Some("unreachable".into()),
            },
        };
        run_case(&close, &f.session).unwrap();
        let closed = f.session.engine().list_closed_cases();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].close_reason.as_deref(), Some("unreachable"));
        assert!(run_case(&close, &f.session).is_err());
    }

    #[test]
    fn listing_disbursements_is_read_only() {
        let cmd = CaseCommand::Disbursements {
            assignment: AssignmentId::new(),
        };
        assert!(!cmd.mutates());
    }
}
