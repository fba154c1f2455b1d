//! # Workflow Scenarios
//!
//! End-to-end runs through the engine's public surface: intake, assignment,
//! the status engine, the ledger, comments and bulk import, checked against
//! the store and the timeline afterwards.

use leadflow_core::{Actor, Amount, Role};
use leadflow_engine::{
    ActivityData, ActivityKind, Employee, EngineConfig, EngineError, LeadEngine, LeadFilter,
    LeadInput, LeadSource, LeadStore, NewDisbursement, StatusChange,
};
use leadflow_state::{CloseType, LeadState, LeadStatus, StageState};

struct Office {
    engine: LeadEngine,
    admin: Actor,
    e1: Employee,
    e2: Employee,
}

fn office() -> Office {
    let engine = LeadEngine::new(LeadStore::new(), EngineConfig::default());
    let admin = engine
        .bootstrap_admin(Employee::new("Priya", Role::Admin, None))
        .unwrap();
    let admin = Actor::admin(admin.id);
    let e1 = engine
        .register_employee(Employee::new("Arjun", Role::Employee, None), &admin)
        .unwrap();
    let e2 = engine
        .register_employee(Employee::new("Kavya", Role::Employee, None), &admin)
        .unwrap();
    Office {
        engine,
        admin,
        e1,
        e2,
    }
}

const TO_UNDERWRITER: [LeadStatus; 5] = [
    LeadStatus::Qualified,
    LeadStatus::Pd,
    LeadStatus::Documentation,
    LeadStatus::Login,
    LeadStatus::Underwriter,
];

// =========================================================================
// Scenario A: intake then assignment
// =========================================================================

#[test]
fn website_lead_is_assigned() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Ravi", "9811111111"), None)
        .unwrap();
    assert_eq!(lead.source(), LeadSource::Website);
    assert_eq!(o.engine.lead_status(&lead.id).unwrap(), LeadStatus::New);

    let a = o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    assert_eq!(a.status, LeadStatus::Assigned);
    assert_eq!(o.engine.lead_status(&lead.id).unwrap(), LeadStatus::Assigned);

    let timeline = o.engine.get_timeline(&lead.id).unwrap();
    let assigned = timeline
        .iter()
        .filter(|e| e.activity.kind == ActivityKind::Assigned)
        .count();
    assert_eq!(assigned, 1);
    assert_eq!(timeline[0].employee_name, "Priya");

    let err = o.engine.assign(&lead.id, &o.e2.id, &o.admin, None).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyAssigned { .. }));
}

// =========================================================================
// Scenario B: forward table from underwriter
// =========================================================================

#[test]
fn underwriter_may_approve_but_not_skip_back() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Sana", "9812222222"), None)
        .unwrap();
    let a = o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    let owner = Actor::employee(o.e1.id);
    for s in TO_UNDERWRITER {
        o.engine
            .update_status(&a.id, s, &owner, StatusChange::default())
            .unwrap();
    }

    let err = o
        .engine
        .update_status(&a.id, LeadStatus::Documentation, &owner, StatusChange::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    assert_eq!(o.engine.get_assignment(&a.id).unwrap().status, LeadStatus::Underwriter);

    o.engine
        .update_status(&a.id, LeadStatus::Approved, &owner, StatusChange::default())
        .unwrap();
    assert_eq!(o.engine.lead_status(&lead.id).unwrap(), LeadStatus::Approved);
}

// =========================================================================
// Scenario C: tranches complete the case
// =========================================================================

#[test]
fn tranches_reaching_approved_amount_complete_the_case() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Tara", "9813333333"), None)
        .unwrap();
    let a = o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    o.engine
        .update_approved_amount(&a.id, Amount::from_major(500_000), &o.admin)
        .unwrap();

    o.engine
        .create_disbursement(&a.id, NewDisbursement::tranche(Amount::from_major(200_000), 1), &o.admin)
        .unwrap();
    assert_eq!(o.engine.get_assignment(&a.id).unwrap().status, LeadStatus::Assigned);

    o.engine
        .create_disbursement(&a.id, NewDisbursement::tranche(Amount::from_major(300_000), 2), &o.admin)
        .unwrap();
    assert_eq!(o.engine.get_total_disbursed(&a.id), Amount::from_major(500_000));
    assert_eq!(o.engine.get_assignment(&a.id).unwrap().status, LeadStatus::Disbursed);
    assert_eq!(o.engine.lead_status(&lead.id).unwrap(), LeadStatus::Disbursed);

    let timeline = o.engine.get_timeline(&lead.id).unwrap();
    assert_eq!(timeline[0].activity.description, "Disbursement of ₹300000.00 created");
}

// =========================================================================
// Scenario D: rejection then closure
// =========================================================================

#[test]
fn rejection_clears_doable_and_closure_infers_rejected() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Uday", "9814444444"), None)
        .unwrap();
    let a = o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    let owner = Actor::employee(o.e1.id);
    for s in TO_UNDERWRITER {
        o.engine
            .update_status(&a.id, s, &owner, StatusChange::default())
            .unwrap();
    }

    let rejected = o
        .engine
        .update_status(&a.id, LeadStatus::Rejected, &owner, StatusChange::default())
        .unwrap();
    assert!(!rejected.is_doable);
    assert_eq!(rejected.close_type, None);
    assert_eq!(o.engine.get_lead(&lead.id).unwrap().state, LeadState::Open);

    let closed = o
        .engine
        .update_status(&a.id, LeadStatus::Closed, &owner, StatusChange::default())
        .unwrap();
    assert_eq!(closed.close_type, Some(CloseType::Rejected));
    assert_eq!(o.engine.get_lead(&lead.id).unwrap().state, LeadState::Closed);

    let progress = o.engine.get_workflow_progress(&lead.id).unwrap();
    assert_eq!(progress.last().unwrap().label, "Closed - Rejected");
    assert!(progress.iter().all(|s| s.state == StageState::Completed));
}

// =========================================================================
// Scenario E: comment deletion permission
// =========================================================================

#[test]
fn only_author_or_privileged_may_delete_comment() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Vani", "9815555555"), None)
        .unwrap();
    o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    let comment = o
        .engine
        .add_comment(&lead.id, &Actor::employee(o.e1.id), "customer asked for a callback")
        .unwrap();

    let err = o
        .engine
        .delete_comment(&comment.id, &Actor::employee(o.e2.id))
        .unwrap_err();
    assert!(matches!(err, EngineError::Permission { .. }));
    assert_eq!(o.engine.list_comments(&lead.id).unwrap(), vec![comment]);
}

// =========================================================================
// Scenario F: bulk import with a bad row
// =========================================================================

#[test]
fn bulk_import_reports_row_errors_and_keeps_valid_rows() {
    let o = office();
    let csv = "name,contact,city\n\
               Wasim,9816666666,Delhi\n\
               Xena,,Mumbai\n\
               Yogi,9817777777,Pune\n";
    let report = o.engine.bulk_import(csv, &o.admin, false).unwrap();

    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors[0].row, 2);
    assert!(report.errors[0].message.contains("row 2"));
    assert_eq!(o.engine.list_leads(&LeadFilter::default()).len(), 2);

    for id in &report.created {
        let timeline = o.engine.get_timeline(id).unwrap();
        assert_eq!(timeline[0].activity.kind, ActivityKind::Created);
        assert_eq!(
            timeline[0].activity.data,
            ActivityData::Created {
                source: LeadSource::Manual,
                imported: true
            }
        );
    }
}

// =========================================================================
// Queries, closures and the chain
// =========================================================================

#[test]
fn list_leads_filters_by_status_and_owner() {
    let o = office();
    let first = o
        .engine
        .from_website(LeadInput::new("Zoya", "9818888888"), None)
        .unwrap();
    let second = o
        .engine
        .from_social(LeadInput::new("Abel", "9819999999"), "facebook", None)
        .unwrap();
    o.engine.assign(&first.id, &o.e1.id, &o.admin, None).unwrap();

    let all = o.engine.list_leads(&LeadFilter::default());
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.id);

    let new_only = o.engine.list_leads(&LeadFilter {
        status: Some(LeadStatus::New),
        ..LeadFilter::default()
    });
    assert_eq!(new_only.len(), 1);
    assert_eq!(new_only[0].id, second.id);

    let mine = o.engine.list_leads(&LeadFilter {
        employee: Some(o.e1.id),
        ..LeadFilter::default()
    });
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.id);
}

#[test]
fn closed_snapshot_survives_purge() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Bina", "9820000000"), None)
        .unwrap();
    let a = o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    o.engine
        .add_comment(&lead.id, &o.admin, "docs pending")
        .unwrap();
    o.engine
        .close_lead(
            &lead.id,
            leadflow_state::ClosureOutcome::NotDoable,
            Some("customer withdrew".into()),
            &o.admin,
        )
        .unwrap();

    o.engine.purge_lead(&lead.id, &o.admin).unwrap();
    assert!(o.engine.get_lead(&lead.id).is_err());
    assert!(o.engine.get_assignment(&a.id).is_err());
    assert_eq!(o.engine.store().snapshot().comments.len(), 0);

    let closed = o.engine.list_closed_cases();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].name, "Bina");
    assert_eq!(closed[0].close_reason.as_deref(), Some("customer withdrew"));
}

#[test]
fn timeline_is_newest_first_and_verifies() {
    let o = office();
    let lead = o
        .engine
        .from_website(LeadInput::new("Chetan", "9821111111"), None)
        .unwrap();
    let a = o.engine.assign(&lead.id, &o.e1.id, &o.admin, None).unwrap();
    let owner = Actor::employee(o.e1.id);
    o.engine
        .update_status(&a.id, LeadStatus::Qualified, &owner, StatusChange::default())
        .unwrap();
    o.engine
        .update_status(
            &a.id,
            LeadStatus::Closed,
            &owner,
            StatusChange::closing(CloseType::Cancelled),
        )
        .unwrap();

    let timeline = o.engine.get_timeline(&lead.id).unwrap();
    let sequences: Vec<u64> = timeline.iter().map(|e| e.activity.sequence).collect();
    let mut sorted = sequences.clone();
    sorted.sort_unstable_by(|x, y| y.cmp(x));
    assert_eq!(sequences, sorted);
    assert_eq!(timeline.len(), 4);

    let integrity = o.engine.verify_timeline(&lead.id).unwrap();
    assert!(integrity.chain_valid);
    assert_eq!(integrity.total_events, 4);

    let progress = o.engine.get_workflow_progress(&lead.id).unwrap();
    let labels: Vec<&str> = progress.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels.last(), Some(&"Closed - Cancelled"));
}

#[test]
fn next_and_previous_possible_carry_display_names() {
    let o = office();
    let next = o.engine.get_next_possible(LeadStatus::Qualified);
    assert_eq!(next[0], (LeadStatus::Pd, "PD (Personal Discussion)"));
    let prev = o.engine.get_previous_possible(LeadStatus::Underwriter);
    let statuses: Vec<LeadStatus> = prev.iter().map(|(s, _)| *s).collect();
    assert!(statuses.contains(&LeadStatus::Login));
    assert!(statuses.contains(&LeadStatus::Approved));
    assert!(statuses.contains(&LeadStatus::Rejected));
}
