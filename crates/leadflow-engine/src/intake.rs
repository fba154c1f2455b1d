//! # Lead Intake
//!
//! One constructor per channel. Each builds a [`Lead`] with its
//! source-specific fields in [`SourceDetails`], commits it together with a
//! `created` activity, then informs the notifier.
//!
//! CSV bulk import never aborts on a bad row: every valid row commits on
//! its own and the [`ImportReport`] lists what was created, skipped, and
//! refused.

use std::collections::HashSet;

use chrono::NaiveDate;
use leadflow_core::{temporal::parse_date, Actor, Amount, LeadId, Timestamp};
use leadflow_state::LeadState;
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind};
use crate::engine::LeadEngine;
use crate::error::EngineError;
use crate::records::{Lead, Priority, SourceDetails};

/// Contact and loan fields shared by every intake channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadInput {
    pub name: String,
    pub contact: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub loan_amount: Option<Amount>,
    pub loan_type: Option<String>,
    pub occupation: Option<String>,
    pub has_existing_loans: Option<bool>,
    pub notes: Option<String>,
}

impl LeadInput {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
            ..Self::default()
        }
    }
}

/// How a manually entered lead reached the office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualChannel {
    Direct { date_of_birth: Option<NaiveDate> },
    Referral { referred_by: Option<String> },
    WalkIn { branch: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    /// Data row number, starting at 1 after the header.
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub errors: Vec<ImportRowError>,
    pub created: Vec<LeadId>,
}

impl ImportReport {
    fn error(&mut self, row: usize, message: impl std::fmt::Display) {
        self.error_count += 1;
        self.errors.push(ImportRowError {
            row,
            message: format!("row {row}: {message}"),
        });
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRow {
    name: Option<String>,
    contact: Option<String>,
    email: Option<String>,
    city: Option<String>,
    loan_amount: Option<String>,
    loan_type: Option<String>,
    occupation: Option<String>,
    message: Option<String>,
    date_of_birth: Option<String>,
}

impl ImportRow {
    fn into_input(self) -> Result<(LeadInput, Option<NaiveDate>), String> {
        let required = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (Some(name), Some(contact)) = (required(self.name), required(self.contact)) else {
            return Err("name and contact are required".to_string());
        };
        let loan_amount = self
            .loan_amount
            .as_deref()
            .map(Amount::parse)
            .transpose()
            .map_err(|e| e.to_string())?;
        let date_of_birth = self
            .date_of_birth
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(|e| e.to_string())?;
        Ok((
            LeadInput {
                name,
                contact,
                email: self.email,
                city: self.city,
                loan_amount,
                loan_type: self.loan_type,
                occupation: self.occupation,
                has_existing_loans: None,
                notes: self.message,
            },
            date_of_birth,
        ))
    }
}

impl LeadEngine {
    /// Lead from the public website inquiry form.
    pub fn from_website(&self, input: LeadInput, message: Option<String>) -> Result<Lead, EngineError> {
        self.create_lead(
            input,
            SourceDetails::Website { message },
            None,
            "Lead created from website inquiry".to_string(),
        )
    }

    /// Lead captured from a social-media campaign.
    pub fn from_social(
        &self,
        input: LeadInput,
        platform: &str,
        message: Option<String>,
    ) -> Result<Lead, EngineError> {
        let platform = platform.trim();
        if platform.is_empty() {
            return Err(EngineError::validation("social platform is required"));
        }
        self.create_lead(
            input,
            SourceDetails::Social {
                platform: platform.to_string(),
                message,
            },
            None,
            format!("Lead created from {platform}"),
        )
    }

    /// Lead entered by staff.
    pub fn manual(
        &self,
        input: LeadInput,
        channel: ManualChannel,
        actor: &Actor,
    ) -> Result<Lead, EngineError> {
        let (details, description) = match channel {
            ManualChannel::Direct { date_of_birth } => (
                SourceDetails::Manual {
                    created_by: Some(actor.employee_id),
                    date_of_birth,
                    imported: false,
                },
                "Lead created manually",
            ),
            ManualChannel::Referral { referred_by } => (
                SourceDetails::Referral { referred_by },
                "Lead created from referral",
            ),
            ManualChannel::WalkIn { branch } => (
                SourceDetails::WalkIn { branch },
                "Lead created from walk-in",
            ),
        };
        self.create_lead(input, details, Some(actor), description.to_string())
    }

    /// Import leads from CSV text with a header row.
    ///
    /// Recognized columns: `name`, `contact`, `email`, `city`,
    /// `loan_amount`, `loan_type`, `occupation`, `message`,
    /// `date_of_birth`. Others are ignored. With `skip_duplicates`, a row
    /// whose contact matches an existing lead or an earlier row is skipped.
    pub fn bulk_import(
        &self,
        csv_text: &str,
        actor: &Actor,
        skip_duplicates: bool,
    ) -> Result<ImportReport, EngineError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(csv_text.as_bytes());
        reader
            .headers()
            .map_err(|e| EngineError::validation(format!("unreadable CSV header: {e}")))?;

        let mut report = ImportReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
            let row = index + 1;
            let parsed = record
                .map_err(|e| e.to_string())
                .and_then(ImportRow::into_input);
            let (input, date_of_birth) = match parsed {
                Ok(v) => v,
                Err(message) => {
                    report.error(row, message);
                    continue;
                }
            };

            let contact = input.contact.trim().to_string();
            let duplicate = seen.contains(&contact) || self.store().contact_exists(&contact);
            seen.insert(contact);
            if duplicate && skip_duplicates {
                tracing::debug!(row, "duplicate contact skipped");
                report.skipped_count += 1;
                continue;
            }

            let details = SourceDetails::Manual {
                created_by: Some(actor.employee_id),
                date_of_birth,
                imported: true,
            };
            match self.create_lead(input, details, Some(actor), "Lead imported from CSV".to_string()) {
                Ok(lead) => {
                    report.success_count += 1;
                    report.created.push(lead.id);
                }
                Err(e) => report.error(row, e),
            }
        }

        tracing::info!(
            success = report.success_count,
            skipped = report.skipped_count,
            errors = report.error_count,
            "bulk import finished"
        );
        Ok(report)
    }

    fn create_lead(
        &self,
        input: LeadInput,
        source_details: SourceDetails,
        actor: Option<&Actor>,
        description: String,
    ) -> Result<Lead, EngineError> {
        let name = input.name.trim();
        let contact = input.contact.trim();
        if name.is_empty() || contact.is_empty() {
            return Err(EngineError::validation("name and contact are required"));
        }

        let now = Timestamp::now();
        let lead = Lead {
            id: LeadId::new(),
            name: name.to_string(),
            contact: contact.to_string(),
            email: input.email,
            city: input.city,
            loan_amount: input.loan_amount,
            loan_type: input.loan_type,
            occupation: input.occupation,
            has_existing_loans: input.has_existing_loans,
            source_details,
            notes: input.notes,
            state: LeadState::Open,
            priority: Priority::Doable,
            created_at: now,
            updated_at: now,
        };
        let imported = matches!(lead.source_details, SourceDetails::Manual { imported: true, .. });

        let (lead, _) = self.store().transaction(lead.id, |tx| {
            tx.log(ActivityEntry::new(
                ActivityKind::Created,
                description,
                ActivityData::Created {
                    source: lead.source(),
                    imported,
                },
                actor.map(|a| a.employee_id),
            ));
            tx.put_lead(lead.clone());
            Ok(lead)
        })?;

        tracing::info!(lead_id = %lead.id, source = %lead.source(), "lead created");
        self.notifier().lead_created(&lead);
        Ok(lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::records::LeadSource;
    use crate::store::LeadStore;
    use leadflow_core::EmployeeId;
    use leadflow_state::LeadStatus;

    fn engine() -> LeadEngine {
        LeadEngine::new(LeadStore::new(), EngineConfig::default())
    }

    #[test]
    fn website_lead_starts_new_with_created_activity() {
        let engine = engine();
        let lead = engine
            .from_website(LeadInput::new(" Om ", " 9800011111 "), Some("need a home loan".into()))
            .unwrap();
        assert_eq!(lead.name, "Om");
        assert_eq!(lead.contact, "9800011111");
        assert_eq!(lead.source(), LeadSource::Website);
        assert_eq!(engine.lead_status(&lead.id).unwrap(), LeadStatus::New);

        let timeline = engine.get_timeline(&lead.id).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].activity.kind, ActivityKind::Created);
        assert_eq!(timeline[0].employee_name, "System");
    }

    #[test]
    fn social_lead_requires_platform() {
        let engine = engine();
        assert!(engine
            .from_social(LeadInput::new("Pia", "9800022222"), " ", None)
            .is_err());
        let lead = engine
            .from_social(LeadInput::new("Pia", "9800022222"), "instagram", None)
            .unwrap();
        assert!(matches!(lead.source_details, SourceDetails::Social { ref platform, .. } if platform == "instagram"));
    }

    #[test]
    fn manual_walk_in_records_channel() {
        let engine = engine();
        let actor = Actor::employee(EmployeeId::new());
        let lead = engine
            .manual(
                LeadInput::new("Qadir", "9800033333"),
                ManualChannel::WalkIn {
                    branch: Some("Andheri".into()),
                },
                &actor,
            )
            .unwrap();
        assert_eq!(lead.source(), LeadSource::WalkIn);
    }

    #[test]
    fn blank_contact_is_invalid() {
        let engine = engine();
        let err = engine
            .from_website(LeadInput::new("Ritu", "  "), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(engine.store().lead_count(), 0);
    }

    #[test]
    fn import_reports_bad_amounts_and_dates() {
        let engine = engine();
        let csv = "name,contact,loan_amount,date_of_birth\n\
                   Sara,9800044444,abc,\n\
                   Tara,9800055555,250000,31/12/1990\n\
                   Uma,9800066666,,1990-13-40\n";
        let report = engine
            .bulk_import(csv, &Actor::employee(EmployeeId::new()), false)
            .unwrap();
        assert_eq!(report.success_count, 1);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.errors[0].row, 1);
        assert_eq!(report.errors[1].row, 3);

        let lead = engine.get_lead(&report.created[0]).unwrap();
        assert_eq!(lead.loan_amount, Some(Amount::from_major(250_000)));
        assert!(matches!(
            lead.source_details,
            SourceDetails::Manual {
                imported: true,
                date_of_birth: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn import_skips_duplicates_only_when_asked() {
        let engine = engine();
        engine
            .from_website(LeadInput::new("Vik", "9800077777"), None)
            .unwrap();
        let csv = "name,contact\nVik,9800077777\nWes,9800088888\nWes again,9800088888\n";
        let actor = Actor::employee(EmployeeId::new());

        let report = engine.bulk_import(csv, &actor, true).unwrap();
        assert_eq!(report.success_count, 1);
        assert_eq!(report.skipped_count, 2);

        let report = engine.bulk_import(csv, &actor, false).unwrap();
        assert_eq!(report.success_count, 3);
        assert_eq!(report.skipped_count, 0);
    }
}
