//! # Workflow Progress
//!
//! Builds the ordered list of stages a case has passed through or has still
//! ahead of it, for timeline headers and reports.
//!
//! Open cases show the main path with the branch the case is on: the
//! rejected branch once rejected, otherwise approved then disbursed. Closed
//! cases show only the path implied by their close type, all completed, and
//! end in a `Closed - <outcome>` stage.

use serde::{Deserialize, Serialize};

use crate::close::CloseType;
use crate::status::{LeadState, LeadStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Completed,
    Current,
    Pending,
}

/// One stage in a progress list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStage {
    pub status: LeadStatus,
    pub label: String,
    pub state: StageState,
}

const MAIN_PATH: [LeadStatus; 7] = [
    LeadStatus::New,
    LeadStatus::Assigned,
    LeadStatus::Qualified,
    LeadStatus::Pd,
    LeadStatus::Documentation,
    LeadStatus::Login,
    LeadStatus::Underwriter,
];

const SHORT_PATH: [LeadStatus; 3] = [LeadStatus::New, LeadStatus::Assigned, LeadStatus::Qualified];

/// Progress for a case with the given status, lead state and close type.
pub fn workflow_progress(
    status: LeadStatus,
    state: LeadState,
    close_type: Option<CloseType>,
) -> Vec<ProgressStage> {
    if status == LeadStatus::Closed || state == LeadState::Closed {
        return closed_progress(close_type.unwrap_or(CloseType::NotDoable));
    }

    let mut path = MAIN_PATH.to_vec();
    if status == LeadStatus::Rejected {
        path.push(LeadStatus::Rejected);
    } else {
        path.extend([LeadStatus::Approved, LeadStatus::Disbursed]);
    }
    path.push(LeadStatus::Closed);

    let current = path.iter().position(|s| *s == status).unwrap_or(0);
    path.into_iter()
        .enumerate()
        .map(|(i, s)| {
            let state = match i.cmp(&current) {
                std::cmp::Ordering::Less => StageState::Completed,
                std::cmp::Ordering::Equal => StageState::Current,
                std::cmp::Ordering::Greater => StageState::Pending,
            };
            stage(s, s.display_name().to_string(), state)
        })
        .collect()
}

fn closed_progress(close_type: CloseType) -> Vec<ProgressStage> {
    let mut path = match close_type {
        CloseType::Approved => {
            let mut p = MAIN_PATH.to_vec();
            p.push(LeadStatus::Approved);
            p
        }
        CloseType::Rejected => {
            let mut p = MAIN_PATH.to_vec();
            p.push(LeadStatus::Rejected);
            p
        }
        CloseType::NotDoable | CloseType::Cancelled | CloseType::Duplicate => SHORT_PATH.to_vec(),
    }
    .into_iter()
    .map(|s| stage(s, s.display_name().to_string(), StageState::Completed))
    .collect::<Vec<_>>();

    path.push(stage(
        LeadStatus::Closed,
        format!("Closed - {}", close_type.outcome_word()),
        StageState::Completed,
    ));
    path
}

fn stage(status: LeadStatus, label: String, state: StageState) -> ProgressStage {
    ProgressStage { status, label, state }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(p: &[ProgressStage]) -> Vec<(LeadStatus, StageState)> {
        p.iter().map(|s| (s.status, s.state)).collect()
    }

    #[test]
    fn new_lead_has_everything_pending() {
        let p = workflow_progress(LeadStatus::New, LeadState::Open, None);
        assert_eq!(p.len(), 10);
        assert_eq!(p[0].state, StageState::Current);
        assert!(p[1..].iter().all(|s| s.state == StageState::Pending));
        assert_eq!(p.last().unwrap().status, LeadStatus::Closed);
    }

    #[test]
    fn pd_marks_earlier_stages_completed() {
        let p = workflow_progress(LeadStatus::Pd, LeadState::Open, None);
        let s = states(&p);
        assert_eq!(s[2], (LeadStatus::Qualified, StageState::Completed));
        assert_eq!(s[3], (LeadStatus::Pd, StageState::Current));
        assert_eq!(s[4], (LeadStatus::Documentation, StageState::Pending));
        assert_eq!(p[3].label, "PD (Personal Discussion)");
    }

    #[test]
    fn rejected_branch_replaces_approval_path() {
        let p = workflow_progress(LeadStatus::Rejected, LeadState::Open, None);
        assert!(p.iter().all(|s| s.status != LeadStatus::Approved));
        assert!(p.iter().all(|s| s.status != LeadStatus::Disbursed));
        let rejected = p.iter().find(|s| s.status == LeadStatus::Rejected).unwrap();
        assert_eq!(rejected.state, StageState::Current);
    }

    #[test]
    fn disbursed_completes_approved() {
        let p = workflow_progress(LeadStatus::Disbursed, LeadState::Open, None);
        let approved = p.iter().find(|s| s.status == LeadStatus::Approved).unwrap();
        assert_eq!(approved.state, StageState::Completed);
        assert!(p.iter().all(|s| s.status != LeadStatus::Rejected));
    }

    #[test]
    fn closed_success_path() {
        let p = workflow_progress(LeadStatus::Closed, LeadState::Closed, Some(CloseType::Approved));
        assert!(p.iter().all(|s| s.state == StageState::Completed));
        assert_eq!(p.len(), 9);
        assert_eq!(p.last().unwrap().label, "Closed - Success");
    }

    #[test]
    fn closed_without_type_is_not_doable() {
        let p = workflow_progress(LeadStatus::New, LeadState::Closed, None);
        assert_eq!(p.len(), 4);
        assert_eq!(p.last().unwrap().label, "Closed - Not Doable");
    }

    #[test]
    fn closed_rejected_path() {
        let p = workflow_progress(LeadStatus::Closed, LeadState::Closed, Some(CloseType::Rejected));
        assert_eq!(p[7].status, LeadStatus::Rejected);
        assert_eq!(p.last().unwrap().label, "Closed - Rejected");
    }
}
