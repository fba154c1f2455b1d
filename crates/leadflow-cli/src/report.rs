//! # Report Subcommand
//!
//! Read-only views: a lead's timeline and its chain check, workflow
//! progress, closed cases, and the status table itself.

use anyhow::Result;
use clap::{Args, Subcommand};
use leadflow_core::LeadId;
use leadflow_state::{LeadStatus, StageState};

use crate::{or_dash, Session};

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Activity timeline of a lead, newest first.
    Timeline {
        #[arg(long)]
        lead: LeadId,
        /// Print entries as JSON lines instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Recompute a lead's activity hash chain. Exits 1 if it is broken.
    Verify {
        #[arg(long)]
        lead: LeadId,
    },

    /// Stages a case has passed through and has ahead of it.
    Progress {
        #[arg(long)]
        lead: LeadId,
    },

    /// Closed-case snapshots, newest first.
    Closed,

    /// Forward and undo targets of one status, or of every status.
    Workflow {
        #[arg(long)]
        status: Option<LeadStatus>,
    },
}

pub fn run_report(args: &ReportArgs, session: &Session) -> Result<u8> {
    let engine = session.engine();
    match &args.command {
        ReportCommand::Timeline { lead, json } => {
            for entry in engine.get_timeline(lead)? {
                if *json {
                    println!("{}", serde_json::to_string(&entry)?);
                } else {
                    println!(
                        "#{:<6} {}  {:<22} {:<20} {}",
                        entry.activity.sequence,
                        entry.activity.created_at,
                        entry.activity.kind.as_str(),
                        entry.employee_name,
                        entry.activity.description
                    );
                }
            }
            Ok(0)
        }

        ReportCommand::Verify { lead } => {
            let integrity = engine.verify_timeline(lead)?;
            if integrity.chain_valid {
                println!("OK: {lead} chain intact ({} events)", integrity.total_events);
                Ok(0)
            } else {
                println!(
                    "FAIL: {lead} chain broken at {} of {} events",
                    integrity.broken_links, integrity.total_events
                );
                Ok(1)
            }
        }

        ReportCommand::Progress { lead } => {
            for stage in engine.get_workflow_progress(lead)? {
                let mark = match stage.state {
                    StageState::Completed => "[x]",
                    StageState::Current => "[>]",
                    StageState::Pending => "[ ]",
                };
                println!("{mark} {}", stage.label);
            }
            Ok(0)
        }

        ReportCommand::Closed => {
            let closed = engine.list_closed_cases();
            if closed.is_empty() {
                println!("No closed cases.");
                return Ok(0);
            }
            for c in closed {
                println!(
                    "{}  {:<24} {:<14} {:<14} {:<20} {}",
                    c.closed_at,
                    c.name,
                    c.contact,
                    or_dash(c.amount),
                    c.close_message,
                    c.close_reason.as_deref().unwrap_or("")
                );
            }
            Ok(0)
        }

        ReportCommand::Workflow { status } => {
            let statuses = match status {
                Some(s) => vec![*s],
                None => LeadStatus::ALL.to_vec(),
            };
            for s in statuses {
                let names = |targets: Vec<(LeadStatus, &str)>| {
                    targets
                        .into_iter()
                        .map(|(_, name)| name)
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                println!("{} ({})", s.display_name(), s.description());
                println!("  next:     {}", names(engine.get_next_possible(s)));
                println!("  previous: {}", names(engine.get_previous_possible(s)));
            }
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_engine::{EngineConfig, LeadEngine, LeadInput, LeadStore};

    fn session_with_lead() -> (Session, LeadId) {
        let engine = LeadEngine::new(LeadStore::new(), EngineConfig::default());
        let lead = engine
            .from_website(LeadInput::new("Pallavi", "9811122233"), None)
            .unwrap();
        (Session::new(engine, None), lead.id)
    }

    #[test]
    fn verify_passes_on_untouched_chain() {
        let (session, lead) = session_with_lead();
        let args = ReportArgs {
            command: ReportCommand::Verify { lead },
        };
        assert_eq!(run_report(&args, &session).unwrap(), 0);
    }

    #[test]
    fn reports_need_no_actor() {
        let (session, lead) = session_with_lead();
        for command in [
            ReportCommand::Timeline { lead, json: true },
            ReportCommand::Progress { lead },
            ReportCommand::Closed,
            ReportCommand::Workflow { status: None },
        ] {
            assert_eq!(run_report(&ReportArgs { command }, &session).unwrap(), 0);
        }
    }

    #[test]
    fn unknown_lead_is_an_error() {
        let (session, _) = session_with_lead();
        let args = ReportArgs {
            command: ReportCommand::Timeline {
                lead: LeadId::new(),
                json: false,
            },
        };
        assert!(run_report(&args, &session).is_err());
    }
}
