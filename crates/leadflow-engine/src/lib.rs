//! # leadflow-engine: Lead Workflow Engine
//!
//! Takes a loan lead from intake to a terminal outcome: who owns it, which
//! stage it is in, what has been paid out against it, and how it ended.
//! Every mutation is recorded in an append-only, hash-chained activity log
//! that is the lead's timeline.
//!
//! ## Components
//!
//! All operations are methods on [`LeadEngine`], grouped by module:
//!
//! - [`intake`]: website, social, manual and CSV bulk lead creation.
//! - [`assignment`]: the single assignment per lead and reassignment.
//! - [`workflow`]: validated status transitions, undo, amount updates.
//! - [`ledger`]: disbursements and completion on full payment.
//! - [`closure`]: forced closure and closed-case snapshots.
//! - [`comments`]: the comment thread.
//! - [`details`]: lead attribute edits, priority, admin purge.
//! - [`directory`]: employee bootstrap, registration, deactivation.
//! - [`activity`]: the activity log, timeline, and chain verification.
//!
//! ## Atomicity
//!
//! Each operation runs in one [`LeadStore::transaction`]: its record
//! changes and its activity entries commit together or not at all, and
//! mutations of the same lead are serialized. Permission and validation
//! failures are reported before anything is staged.

pub mod activity;
pub mod assignment;
pub mod closure;
pub mod comments;
pub mod config;
pub mod details;
pub mod directory;
pub mod engine;
pub mod error;
pub mod intake;
pub mod ledger;
pub mod notify;
pub mod records;
pub mod store;
pub mod workflow;

pub use activity::{
    comment_preview, verify_chain, ActivityData, ActivityKind, ChainIntegrity, FieldChange,
    LeadActivity, TimelineEntry,
};
pub use config::{ConfigError, EngineConfig, OverdisbursementPolicy, ReassignScope};
pub use details::LeadDetailsPatch;
pub use engine::{LeadEngine, LeadFilter};
pub use error::{EngineError, RecordKind};
pub use intake::{ImportReport, ImportRowError, LeadInput, ManualChannel};
pub use ledger::NewDisbursement;
pub use notify::{LeadNotifier, TracingNotifier};
pub use records::{
    CloseLead, Disbursement, DisbursementType, Employee, Lead, LeadAssignment, LeadComment,
    LeadSource, Priority, SourceDetails,
};
pub use store::{LeadStore, Snapshot};
pub use workflow::StatusChange;
