//! # Lead Subcommand
//!
//! Lead intake and maintenance.
//!
//! ## Subcommands
//!
//! - `add`: create a lead from one intake channel.
//! - `import`: bulk-create manual leads from a CSV file.
//! - `list`: leads matching a status, source or owner, newest first.
//! - `show`: one lead with its assignment, as JSON.
//! - `edit`: change business attributes.
//! - `priority`: mark a lead doable or not doable.
//! - `purge`: permanently delete a lead (admin only).
//!
//! Website and social leads arrive without an acting employee; every other
//! subcommand that changes state needs `--actor`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use leadflow_core::{Amount, EmployeeId, LeadId};
use leadflow_engine::{
    Lead, LeadDetailsPatch, LeadFilter, LeadInput, LeadSource, ManualChannel, Priority,
};
use leadflow_state::LeadStatus;

use crate::{or_dash, parse_priority, parse_source, Session};

#[derive(Args, Debug)]
pub struct LeadArgs {
    #[command(subcommand)]
    pub command: LeadCommand,
}

/// Intake channel for `lead add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    Website,
    Social,
    Direct,
    Referral,
    WalkIn,
}

/// Optional lead attributes shared by `add` and `edit`.
#[derive(Args, Debug, Clone, Default)]
pub struct LeadFieldArgs {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    /// Requested loan amount, e.g. 250000 or 250000.50.
    #[arg(long)]
    pub loan_amount: Option<Amount>,
    #[arg(long)]
    pub loan_type: Option<String>,
    #[arg(long)]
    pub occupation: Option<String>,
    #[arg(long)]
    pub existing_loans: Option<bool>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LeadCommand {
    /// Create a lead.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
        #[arg(long, value_enum, default_value = "direct")]
        channel: Channel,
        #[command(flatten)]
        fields: LeadFieldArgs,
        /// Inquiry text (website and social).
        #[arg(long)]
        message: Option<String>,
        /// Campaign platform (social).
        #[arg(long)]
        platform: Option<String>,
        /// Applicant date of birth, YYYY-MM-DD (direct).
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        /// Who referred the applicant (referral).
        #[arg(long)]
        referred_by: Option<String>,
        /// Branch the applicant walked into (walk-in).
        #[arg(long)]
        branch: Option<String>,
    },

    /// Import leads from a CSV file with a header row.
    Import {
        #[arg(long)]
        file: PathBuf,
        /// Skip rows whose contact already exists instead of creating them.
        #[arg(long)]
        skip_duplicates: bool,
    },

    /// List leads, newest first.
    List {
        #[arg(long)]
        status: Option<LeadStatus>,
        #[arg(long, value_parser = parse_source)]
        source: Option<LeadSource>,
        /// Only leads assigned to this employee.
        #[arg(long)]
        employee: Option<EmployeeId>,
    },

    /// Show a lead and its assignment as JSON.
    Show {
        #[arg(long)]
        id: LeadId,
    },

    /// Edit lead attributes. A blank value clears an optional field.
    Edit {
        #[arg(long)]
        id: LeadId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        contact: Option<String>,
        #[command(flatten)]
        fields: LeadFieldArgs,
    },

    /// Set lead priority: doable or not_doable.
    Priority {
        #[arg(long)]
        id: LeadId,
        #[arg(long, value_parser = parse_priority)]
        priority: Priority,
    },

    /// Permanently delete a lead and everything attached to it.
    Purge {
        #[arg(long)]
        id: LeadId,
    },
}

impl LeadCommand {
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::List { .. } | Self::Show { .. })
    }
}

pub fn run_lead(args: &LeadArgs, session: &Session) -> Result<u8> {
    match &args.command {
        LeadCommand::Add {
            name,
            contact,
            channel,
            fields,
            message,
            platform,
            date_of_birth,
            referred_by,
            branch,
        } => {
            let mut input = LeadInput::new(name.clone(), contact.clone());
            fields.apply_to(&mut input);
            let engine = session.engine();
            let lead = match channel {
                Channel::Website => engine.from_website(input, message.clone())?,
                Channel::Social => {
                    let Some(platform) = platform else {
                        bail!("--platform is required for social leads");
                    };
                    engine.from_social(input, platform, message.clone())?
                }
                Channel::Direct => engine.manual(
                    input,
                    ManualChannel::Direct {
                        date_of_birth: *date_of_birth,
                    },
                    &session.actor()?,
                )?,
                Channel::Referral => engine.manual(
                    input,
                    ManualChannel::Referral {
                        referred_by: referred_by.clone(),
                    },
                    &session.actor()?,
                )?,
                Channel::WalkIn => engine.manual(
                    input,
                    ManualChannel::WalkIn {
                        branch: branch.clone(),
                    },
                    &session.actor()?,
                )?,
            };
            println!("OK: created {} ({}, {})", lead.id, lead.name, lead.source());
            Ok(0)
        }

        LeadCommand::Import {
            file,
            skip_duplicates,
        } => {
            let actor = session.actor()?;
            let csv_text = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read CSV file: {}", file.display()))?;
            let report = session
                .engine()
                .bulk_import(&csv_text, &actor, *skip_duplicates)?;
            for error in &report.errors {
                eprintln!("  {}", error.message);
            }
            println!(
                "OK: imported {} leads, skipped {}, {} errors",
                report.success_count, report.skipped_count, report.error_count
            );
            Ok(if report.error_count == 0 { 0 } else { 2 })
        }

        LeadCommand::List {
            status,
            source,
            employee,
        } => {
            let filter = LeadFilter {
                status: *status,
                source: *source,
                employee: *employee,
            };
            let engine = session.engine();
            let leads = engine.list_leads(&filter);
            if leads.is_empty() {
                println!("No leads found.");
                return Ok(0);
            }
            for lead in leads {
                let status = engine.lead_status(&lead.id)?;
                println!(
                    "{:<45} {:<24} {:<14} {:<10} {:<14} {}",
                    lead.id,
                    lead.name,
                    lead.contact,
                    lead.source().as_str(),
                    status.as_str(),
                    or_dash(lead.loan_amount)
                );
            }
            Ok(0)
        }

        LeadCommand::Show { id } => {
            let engine = session.engine();
            let lead = engine.get_lead(id)?;
            let assignment = engine.assignment_for_lead(id);
            let total_disbursed = assignment
                .as_ref()
                .map(|a| engine.get_total_disbursed(&a.id));
            let view = serde_json::json!({
                "status": engine.lead_status(id)?,
                "lead": lead,
                "assignment": assignment,
                "total_disbursed": total_disbursed,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(0)
        }

        LeadCommand::Edit {
            id,
            name,
            contact,
            fields,
        } => {
            let patch = LeadDetailsPatch {
                name: name.clone(),
                contact: contact.clone(),
                email: fields.email.clone(),
                city: fields.city.clone(),
                loan_amount: fields.loan_amount,
                loan_type: fields.loan_type.clone(),
                occupation: fields.occupation.clone(),
                has_existing_loans: fields.existing_loans,
                notes: fields.notes.clone(),
            };
            let lead = session
                .engine()
                .update_lead_details(id, patch, &session.actor()?)?;
            println!("OK: updated {}", describe(&lead));
            Ok(0)
        }

        LeadCommand::Priority { id, priority } => {
            let lead = session
                .engine()
                .set_priority(id, *priority, &session.actor()?)?;
            println!("OK: {} priority is now {}", describe(&lead), lead.priority);
            Ok(0)
        }

        LeadCommand::Purge { id } => {
            session.engine().purge_lead(id, &session.actor()?)?;
            println!("OK: purged {id}");
            Ok(0)
        }
    }
}

impl LeadFieldArgs {
    fn apply_to(&self, input: &mut LeadInput) {
        input.email = self.email.clone();
        input.city = self.city.clone();
        input.loan_amount = self.loan_amount;
        input.loan_type = self.loan_type.clone();
        input.occupation = self.occupation.clone();
        input.has_existing_loans = self.existing_loans;
        input.notes = self.notes.clone();
    }
}

fn describe(lead: &Lead) -> String {
    format!("{} ({})", lead.id, lead.name)
}
