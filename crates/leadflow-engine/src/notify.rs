//! Outbound notifications.
//!
//! The engine tells a collaborator about new leads and closed cases after
//! the corresponding transaction has committed. Delivery is the
//! notifier's business: the calls return nothing and cannot fail the
//! operation that triggered them.

use crate::records::{CloseLead, Lead};

pub trait LeadNotifier: Send + Sync {
    fn lead_created(&self, lead: &Lead);
    fn lead_closed(&self, closure: &CloseLead);
}

/// Default notifier: emits a `tracing` event per notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl LeadNotifier for TracingNotifier {
    fn lead_created(&self, lead: &Lead) {
        tracing::info!(lead_id = %lead.id, source = %lead.source(), "notify: lead created");
    }

    fn lead_closed(&self, closure: &CloseLead) {
        tracing::info!(
            lead_id = %closure.lead_id,
            outcome = %closure.outcome,
            "notify: lead closed"
        );
    }
}
