//! Exhaustive transition matrix for the lead workflow.
//!
//! Every (from, to) pair is checked for every transition kind against an
//! independently written list of expected edges.

use leadflow_state::{validate_transition, LeadStatus, TransitionKind};

use LeadStatus::*;

const FORWARD_EDGES: &[(LeadStatus, LeadStatus)] = &[
    (New, Assigned),
    (Assigned, Qualified),
    (Assigned, Closed),
    (Qualified, Pd),
    (Qualified, Assigned),
    (Qualified, Closed),
    (Pd, Documentation),
    (Pd, Qualified),
    (Pd, Closed),
    (Documentation, Login),
    (Documentation, Pd),
    (Documentation, Closed),
    (Login, Underwriter),
    (Login, Documentation),
    (Login, Closed),
    (Underwriter, Approved),
    (Underwriter, Rejected),
    (Underwriter, Login),
    (Underwriter, Closed),
    (Approved, Disbursed),
    (Approved, Underwriter),
    (Approved, Closed),
    (Rejected, Underwriter),
    (Rejected, Closed),
    (Disbursed, Closed),
];

#[test]
fn forward_matrix_exhaustive() {
    for from in LeadStatus::ALL {
        for to in LeadStatus::ALL {
            let expected = FORWARD_EDGES.contains(&(from, to));
            let actual = validate_transition(TransitionKind::Forward, from, to).is_ok();
            assert_eq!(actual, expected, "forward {from} -> {to}");
        }
    }
}

#[test]
fn undo_matrix_is_reversed_forward_table() {
    for from in LeadStatus::ALL {
        for to in LeadStatus::ALL {
            let expected = from != Closed && FORWARD_EDGES.contains(&(to, from));
            let actual = validate_transition(TransitionKind::Undo, from, to).is_ok();
            assert_eq!(actual, expected, "undo {from} -> {to}");
        }
    }
}

#[test]
fn complete_on_full_payment_matrix() {
    for from in LeadStatus::ALL {
        for to in LeadStatus::ALL {
            let expected = to == Disbursed && !matches!(from, Disbursed | Closed);
            let actual = validate_transition(TransitionKind::CompleteOnFullPayment, from, to).is_ok();
            assert_eq!(actual, expected, "complete-on-full-payment {from} -> {to}");
        }
    }
}

#[test]
fn force_close_matrix() {
    for from in LeadStatus::ALL {
        for to in LeadStatus::ALL {
            let expected = to == Closed && from != Closed;
            let actual = validate_transition(TransitionKind::ForceClose, from, to).is_ok();
            assert_eq!(actual, expected, "force-close {from} -> {to}");
        }
    }
}

#[test]
fn nothing_leaves_closed() {
    for kind in [
        TransitionKind::Forward,
        TransitionKind::Undo,
        TransitionKind::CompleteOnFullPayment,
        TransitionKind::ForceClose,
    ] {
        assert!(Closed.targets(kind).is_empty(), "{kind} out of closed");
    }
}
