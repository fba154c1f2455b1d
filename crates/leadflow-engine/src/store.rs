//! # Lead Store
//!
//! Thread-safe in-memory record set with per-lead transactions.
//!
//! ## Locking
//!
//! - A per-lead `Mutex` serializes mutations of the same lead, so the
//!   lead and its assignment are the unit of contention. Mutations on
//!   different leads proceed independently. A lead's mutex lives only
//!   while some transaction holds or waits on it.
//! - All tables sit behind a single `RwLock`. A transaction only reads
//!   while its closure runs and stages every write; [`LeadStore::transaction`]
//!   then applies the staged writes and seals the staged activities under
//!   one write lock. Readers therefore see either none or all of a
//!   mutation, and a failed closure leaves nothing behind.
//! - The commit re-checks the unique lead → assignment index before
//!   applying a new assignment.
//!
//! Both locks are `parking_lot` (non-poisoning) and are never held across
//! an `.await`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use leadflow_core::{
    Amount, AssignmentId, CommentId, ContentDigest, EmployeeId, LeadId, Timestamp,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityEntry, LeadActivity};
use crate::error::{EngineError, RecordKind};
use crate::records::{CloseLead, Disbursement, Employee, Lead, LeadAssignment, LeadComment};

// ── Table ────────────────────────────────────────────────────────────

/// Keyed rows that remember insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Table<K, V> {
    rows: HashMap<K, V>,
    order: Vec<K>,
}

impl<K: Eq + Hash + Copy, V> Table<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert or replace a row. Replacing keeps the original position.
    pub(crate) fn insert(&mut self, id: K, value: V) -> Option<V> {
        let prev = self.rows.insert(id, value);
        if prev.is_none() {
            self.order.push(id);
        }
        prev
    }

    pub(crate) fn get(&self, id: &K) -> Option<&V> {
        self.rows.get(id)
    }

    /// Rows in insertion order.
    pub(crate) fn list(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.order.iter().filter_map(|k| self.rows.get(k))
    }

    pub(crate) fn remove(&mut self, id: &K) -> Option<V> {
        let removed = self.rows.remove(id);
        if removed.is_some() {
            self.order.retain(|k| k != id);
        }
        removed
    }

    pub(crate) fn contains(&self, id: &K) -> bool {
        self.rows.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

impl<K: Eq + Hash + Copy, V> Default for Table<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tables ───────────────────────────────────────────────────────────

/// Every table of the store, guarded together by one lock.
#[derive(Debug, Default)]
pub struct Tables {
    pub(crate) employees: Table<EmployeeId, Employee>,
    pub(crate) leads: Table<LeadId, Lead>,
    pub(crate) assignments: Table<AssignmentId, LeadAssignment>,
    /// Unique index: at most one assignment per lead.
    pub(crate) assignment_by_lead: HashMap<LeadId, AssignmentId>,
    /// Comments per lead, oldest first.
    pub(crate) comments: HashMap<LeadId, Vec<LeadComment>>,
    pub(crate) comment_index: HashMap<CommentId, LeadId>,
    /// Disbursements per assignment, in commit order.
    pub(crate) disbursements: HashMap<AssignmentId, Vec<Disbursement>>,
    /// Closed-case snapshots in commit order. Not removed by purge.
    pub(crate) closures: Vec<CloseLead>,
    /// Activities per lead in commit order.
    pub(crate) activities: HashMap<LeadId, Vec<LeadActivity>>,
    pub(crate) next_sequence: u64,
}

impl Tables {
    pub(crate) fn assignment_for_lead(&self, lead_id: &LeadId) -> Option<&LeadAssignment> {
        self.assignment_by_lead
            .get(lead_id)
            .and_then(|id| self.assignments.get(id))
    }

    pub(crate) fn activities_for(&self, lead_id: &LeadId) -> &[LeadActivity] {
        self.activities.get(lead_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn comments_for(&self, lead_id: &LeadId) -> &[LeadComment] {
        self.comments.get(lead_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn disbursements_for(&self, assignment_id: &AssignmentId) -> &[Disbursement] {
        self.disbursements
            .get(assignment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn chain_head(&self, lead_id: &LeadId) -> ContentDigest {
        self.activities_for(lead_id)
            .last()
            .map(|a| a.digest)
            .unwrap_or(ContentDigest::GENESIS)
    }

    fn purge(&mut self, lead_id: &LeadId) {
        self.leads.remove(lead_id);
        if let Some(assignment_id) = self.assignment_by_lead.remove(lead_id) {
            self.assignments.remove(&assignment_id);
            self.disbursements.remove(&assignment_id);
        }
        for comment in self.comments.remove(lead_id).unwrap_or_default() {
            self.comment_index.remove(&comment.id);
        }
        self.activities.remove(lead_id);
    }
}

// ── Transaction ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Staged {
    lead: Option<Lead>,
    assignment: Option<LeadAssignment>,
    assignment_is_new: bool,
    comments: Vec<LeadComment>,
    deleted_comments: Vec<CommentId>,
    disbursements: Vec<Disbursement>,
    closure: Option<CloseLead>,
    activities: Vec<ActivityEntry>,
    purge: bool,
}

/// Read access to one lead plus staged writes, committed together.
///
/// Reads see the transaction's own staged writes.
pub struct Transaction<'s> {
    tables: &'s RwLock<Tables>,
    lead_id: LeadId,
    staged: Staged,
}

impl<'s> Transaction<'s> {
    pub fn lead_id(&self) -> LeadId {
        self.lead_id
    }

    pub fn lead(&self) -> Result<Lead, EngineError> {
        if let Some(lead) = &self.staged.lead {
            return Ok(lead.clone());
        }
        self.tables
            .read()
            .leads
            .get(&self.lead_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(RecordKind::Lead, self.lead_id))
    }

    pub fn assignment(&self) -> Option<LeadAssignment> {
        if let Some(a) = &self.staged.assignment {
            return Some(a.clone());
        }
        self.tables.read().assignment_for_lead(&self.lead_id).cloned()
    }

    pub fn require_assignment(&self) -> Result<LeadAssignment, EngineError> {
        self.assignment()
            .ok_or_else(|| EngineError::not_found(RecordKind::Assignment, self.lead_id))
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<Employee> {
        self.tables.read().employees.get(id).cloned()
    }

    pub fn comment(&self, id: &CommentId) -> Option<LeadComment> {
        if self.staged.deleted_comments.contains(id) {
            return None;
        }
        if let Some(c) = self.staged.comments.iter().find(|c| &c.id == id) {
            return Some(c.clone());
        }
        self.tables
            .read()
            .comments_for(&self.lead_id)
            .iter()
            .find(|c| &c.id == id)
            .cloned()
    }

    /// Committed plus staged disbursements for an assignment.
    pub fn total_disbursed(&self, assignment_id: &AssignmentId) -> Amount {
        let committed: Amount = self
            .tables
            .read()
            .disbursements_for(assignment_id)
            .iter()
            .map(|d| d.amount)
            .sum();
        let staged: Amount = self
            .staged
            .disbursements
            .iter()
            .filter(|d| &d.assignment_id == assignment_id)
            .map(|d| d.amount)
            .sum();
        [committed, staged].into_iter().sum()
    }

    pub fn put_lead(&mut self, lead: Lead) {
        self.staged.lead = Some(lead);
    }

    /// Stage the lead's first assignment. The commit fails with
    /// `AlreadyAssigned` if one exists by then.
    pub fn insert_assignment(&mut self, assignment: LeadAssignment) {
        self.staged.assignment = Some(assignment);
        self.staged.assignment_is_new = true;
    }

    pub fn put_assignment(&mut self, assignment: LeadAssignment) {
        self.staged.assignment = Some(assignment);
    }

    pub fn add_comment(&mut self, comment: LeadComment) {
        self.staged.comments.push(comment);
    }

    pub fn remove_comment(&mut self, id: CommentId) {
        self.staged.comments.retain(|c| c.id != id);
        self.staged.deleted_comments.push(id);
    }

    pub fn add_disbursement(&mut self, disbursement: Disbursement) {
        self.staged.disbursements.push(disbursement);
    }

    pub fn put_closure(&mut self, closure: CloseLead) {
        self.staged.closure = Some(closure);
    }

    pub fn log(&mut self, entry: ActivityEntry) {
        self.staged.activities.push(entry);
    }

    /// Delete the lead and everything attached to it except its closure
    /// snapshot.
    pub fn purge(&mut self) {
        self.staged.purge = true;
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Shared handle to the record set. Clones refer to the same data.
#[derive(Debug, Clone, Default)]
pub struct LeadStore {
    tables: Arc<RwLock<Tables>>,
    lead_locks: Arc<Mutex<HashMap<LeadId, Arc<Mutex<()>>>>>,
}

impl LeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` as one atomic mutation of `lead_id`.
    ///
    /// Returns the closure's value together with the activities the
    /// commit sealed. Nothing is written if `f` or the commit fails.
    pub fn transaction<R>(
        &self,
        lead_id: LeadId,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R, EngineError>,
    ) -> Result<(R, Vec<LeadActivity>), EngineError> {
        let lock = self.lead_lock(lead_id);
        let result = {
            let _guard = lock.lock();
            let mut tx = Transaction {
                tables: &self.tables,
                lead_id,
                staged: Staged::default(),
            };
            match f(&mut tx) {
                Ok(out) => self
                    .commit(lead_id, tx.staged)
                    .map(|sealed| (out, sealed)),
                Err(e) => Err(e),
            }
        };
        drop(lock);
        self.release_lead_lock(lead_id);
        result
    }

    fn commit(&self, lead_id: LeadId, staged: Staged) -> Result<Vec<LeadActivity>, EngineError> {
        let mut t = self.tables.write();

        if staged.assignment_is_new {
            if let Some(existing) = t.assignment_by_lead.get(&lead_id) {
                return Err(EngineError::AlreadyAssigned {
                    lead_id,
                    assignment_id: *existing,
                });
            }
        }

        // Seal before applying anything so a canonicalization failure
        // aborts the whole commit.
        let now = Timestamp::now();
        let mut prev = t.chain_head(&lead_id);
        let mut sequence = t.next_sequence;
        let mut sealed = Vec::with_capacity(staged.activities.len());
        for entry in staged.activities {
            sequence += 1;
            let activity = LeadActivity::seal(entry, lead_id, sequence, now, prev)?;
            prev = activity.digest;
            sealed.push(activity);
        }

        if let Some(lead) = staged.lead {
            t.leads.insert(lead.id, lead);
        }
        if let Some(assignment) = staged.assignment {
            t.assignment_by_lead.insert(lead_id, assignment.id);
            t.assignments.insert(assignment.id, assignment);
        }
        for comment in staged.comments {
            t.comment_index.insert(comment.id, lead_id);
            t.comments.entry(lead_id).or_default().push(comment);
        }
        for id in staged.deleted_comments {
            t.comment_index.remove(&id);
            if let Some(list) = t.comments.get_mut(&lead_id) {
                list.retain(|c| c.id != id);
            }
        }
        for d in staged.disbursements {
            t.disbursements.entry(d.assignment_id).or_default().push(d);
        }
        if let Some(closure) = staged.closure {
            t.closures.push(closure);
        }
        t.next_sequence = sequence;
        t.activities
            .entry(lead_id)
            .or_default()
            .extend(sealed.iter().cloned());

        if staged.purge {
            t.purge(&lead_id);
        }
        Ok(sealed)
    }

    fn lead_lock(&self, lead_id: LeadId) -> Arc<Mutex<()>> {
        Arc::clone(self.lead_locks.lock().entry(lead_id).or_default())
    }

    /// Forget a lead's lock once no transaction holds or waits on it.
    fn release_lead_lock(&self, lead_id: LeadId) {
        let mut locks = self.lead_locks.lock();
        if locks
            .get(&lead_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&lead_id);
        }
    }

    /// Run a read-only closure against a consistent view of all tables.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.tables.read())
    }

    pub fn lead_of_assignment(&self, id: &AssignmentId) -> Option<LeadId> {
        self.tables.read().assignments.get(id).map(|a| a.lead_id)
    }

    pub fn lead_of_comment(&self, id: &CommentId) -> Option<LeadId> {
        self.tables.read().comment_index.get(id).copied()
    }

    /// Whether any lead uses this contact value (trimmed comparison).
    pub fn contact_exists(&self, contact: &str) -> bool {
        let contact = contact.trim();
        self.tables
            .read()
            .leads
            .list()
            .any(|l| l.contact.trim() == contact)
    }

    /// Insert or replace an employee directory entry.
    pub fn upsert_employee(&self, employee: Employee) {
        tracing::debug!(employee_id = %employee.id, role = %employee.role, "employee upserted");
        self.tables.write().employees.insert(employee.id, employee);
    }

    /// Insert `employee` only if the directory is empty.
    pub fn insert_first_employee(&self, employee: Employee) -> bool {
        let mut t = self.tables.write();
        if t.employees.len() > 0 {
            return false;
        }
        t.employees.insert(employee.id, employee);
        true
    }

    /// Apply `f` to an existing directory entry and return the result.
    pub fn update_employee(
        &self,
        id: &EmployeeId,
        f: impl FnOnce(&mut Employee),
    ) -> Option<Employee> {
        let mut t = self.tables.write();
        let mut employee = t.employees.get(id)?.clone();
        f(&mut employee);
        t.employees.insert(*id, employee.clone());
        Some(employee)
    }

    pub fn employee(&self, id: &EmployeeId) -> Option<Employee> {
        self.tables.read().employees.get(id).cloned()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.tables.read().employees.list().cloned().collect()
    }

    pub fn lead_count(&self) -> usize {
        self.tables.read().leads.len()
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Copy of every record, for persistence.
    pub fn snapshot(&self) -> Snapshot {
        let t = self.tables.read();
        let mut activities: Vec<LeadActivity> =
            t.activities.values().flatten().cloned().collect();
        activities.sort_by_key(|a| a.sequence);
        let mut comments: Vec<LeadComment> = t.comments.values().flatten().cloned().collect();
        comments.sort_by_key(|c| c.created_at);
        Snapshot {
            employees: t.employees.list().cloned().collect(),
            leads: t.leads.list().cloned().collect(),
            assignments: t.assignments.list().cloned().collect(),
            comments,
            disbursements: t.disbursements.values().flatten().cloned().collect(),
            closures: t.closures.clone(),
            activities,
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Fails with `Integrity` if the snapshot holds two assignments for one
    /// lead or records that point at a missing lead or assignment.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, EngineError> {
        let mut t = Tables::default();

        for e in snapshot.employees {
            t.employees.insert(e.id, e);
        }
        for l in snapshot.leads {
            t.leads.insert(l.id, l);
        }
        for a in snapshot.assignments {
            if !t.leads.contains(&a.lead_id) {
                return Err(EngineError::Integrity(format!(
                    "{} references missing {}",
                    a.id, a.lead_id
                )));
            }
            if let Some(existing) = t.assignment_by_lead.insert(a.lead_id, a.id) {
                return Err(EngineError::Integrity(format!(
                    "{} has two assignments: {existing} and {}",
                    a.lead_id, a.id
                )));
            }
            t.assignments.insert(a.id, a);
        }
        for c in snapshot.comments {
            if !t.assignments.contains(&c.assignment_id) {
                return Err(EngineError::Integrity(format!(
                    "{} references missing {}",
                    c.id, c.assignment_id
                )));
            }
            t.comment_index.insert(c.id, c.lead_id);
            t.comments.entry(c.lead_id).or_default().push(c);
        }
        for d in snapshot.disbursements {
            if !t.assignments.contains(&d.assignment_id) {
                return Err(EngineError::Integrity(format!(
                    "{} references missing {}",
                    d.id, d.assignment_id
                )));
            }
            t.disbursements.entry(d.assignment_id).or_default().push(d);
        }
        t.closures = snapshot.closures;

        let mut activities = snapshot.activities;
        activities.sort_by_key(|a| a.sequence);
        for a in activities {
            t.next_sequence = t.next_sequence.max(a.sequence);
            t.activities.entry(a.lead_id).or_default().push(a);
        }

        tracing::info!(
            leads = t.leads.len(),
            assignments = t.assignments.len(),
            closures = t.closures.len(),
            "store restored from snapshot"
        );
        Ok(Self {
            tables: Arc::new(RwLock::new(t)),
            lead_locks: Arc::default(),
        })
    }
}

/// Every record of a store, in a serializable shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub employees: Vec<Employee>,
    pub leads: Vec<Lead>,
    pub assignments: Vec<LeadAssignment>,
    pub comments: Vec<LeadComment>,
    pub disbursements: Vec<Disbursement>,
    pub closures: Vec<CloseLead>,
    pub activities: Vec<LeadActivity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityData, ActivityKind};
    use crate::records::{LeadSource, Priority, SourceDetails};
    use leadflow_core::Role;
    use leadflow_state::{LeadState, LeadStatus};

    fn lead() -> Lead {
        let now = Timestamp::now();
        Lead {
            id: LeadId::new(),
            name: "Ravi".into(),
            contact: "9811111111".into(),
            email: None,
            city: Some("Pune".into()),
            loan_amount: None,
            loan_type: None,
            occupation: None,
            has_existing_loans: None,
            source_details: SourceDetails::Website { message: None },
            notes: None,
            state: LeadState::Open,
            priority: Priority::Doable,
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment(lead_id: LeadId) -> LeadAssignment {
        let now = Timestamp::now();
        LeadAssignment {
            id: AssignmentId::new(),
            lead_id,
            employee_id: EmployeeId::new(),
            assigned_by: EmployeeId::new(),
            status: LeadStatus::Assigned,
            is_doable: true,
            pd_loan_amount: None,
            approved_loan_amount: None,
            close_type: None,
            notes: None,
            assigned_at: now,
            updated_at: now,
        }
    }

    fn created() -> ActivityEntry {
        ActivityEntry::new(
            ActivityKind::Created,
            "Lead created",
            ActivityData::Created {
                source: LeadSource::Website,
                imported: false,
            },
            None,
        )
    }

    fn seed(store: &LeadStore) -> Lead {
        let l = lead();
        let staged = l.clone();
        store
            .transaction(l.id, |tx| {
                tx.put_lead(staged);
                tx.log(created());
                Ok(())
            })
            .unwrap();
        l
    }

    #[test]
    fn table_keeps_insertion_order() {
        let mut t: Table<u32, &str> = Table::new();
        t.insert(3, "c");
        t.insert(1, "a");
        t.insert(3, "c2");
        assert_eq!(t.list().copied().collect::<Vec<_>>(), vec!["c2", "a"]);
        t.remove(&3);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn failed_transaction_writes_nothing() {
        let store = LeadStore::new();
        let l = lead();
        let result: Result<((), _), _> = store.transaction(l.id, |tx| {
            tx.put_lead(l.clone());
            tx.log(created());
            Err(EngineError::validation("boom"))
        });
        assert!(result.is_err());
        assert_eq!(store.lead_count(), 0);
        assert!(store.snapshot().activities.is_empty());
    }

    #[test]
    fn reads_see_staged_writes() {
        let store = LeadStore::new();
        let l = seed(&store);
        store
            .transaction(l.id, |tx| {
                let mut lead = tx.lead()?;
                lead.city = Some("Nashik".into());
                tx.put_lead(lead);
                assert_eq!(tx.lead()?.city.as_deref(), Some("Nashik"));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn second_assignment_rejected_at_commit() {
        let store = LeadStore::new();
        let l = seed(&store);
        store
            .transaction(l.id, |tx| {
                tx.insert_assignment(assignment(l.id));
                Ok(())
            })
            .unwrap();
        let err = store
            .transaction(l.id, |tx| {
                tx.insert_assignment(assignment(l.id));
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyAssigned { .. }));
    }

    #[test]
    fn sequences_increase_across_leads() {
        let store = LeadStore::new();
        seed(&store);
        seed(&store);
        let seqs: Vec<u64> = store.snapshot().activities.iter().map(|a| a.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn snapshot_restores_everything() {
        let store = LeadStore::new();
        store.upsert_employee(Employee::new("Meera", Role::Manager, None));
        let l = seed(&store);
        store
            .transaction(l.id, |tx| {
                tx.insert_assignment(assignment(l.id));
                Ok(())
            })
            .unwrap();

        let restored = LeadStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.snapshot(), store.snapshot());
        // The next activity continues the sequence and the chain.
        restored
            .transaction(l.id, |tx| {
                tx.log(created());
                Ok(())
            })
            .unwrap();
        let acts = restored.snapshot().activities;
        assert_eq!(acts.last().unwrap().sequence, 2);
        assert_eq!(acts[1].previous_digest, acts[0].digest);
    }

    #[test]
    fn snapshot_with_duplicate_assignments_is_rejected() {
        let l = lead();
        let snapshot = Snapshot {
            leads: vec![l.clone()],
            assignments: vec![assignment(l.id), assignment(l.id)],
            ..Snapshot::default()
        };
        assert!(matches!(
            LeadStore::from_snapshot(snapshot),
            Err(EngineError::Integrity(_))
        ));
    }

    #[test]
    fn purge_removes_lead_and_activities() {
        let store = LeadStore::new();
        let l = seed(&store);
        store
            .transaction(l.id, |tx| {
                tx.purge();
                Ok(())
            })
            .unwrap();
        assert_eq!(store.lead_count(), 0);
        assert!(store.snapshot().activities.is_empty());
    }

    #[test]
    fn lead_locks_are_released_after_commit() {
        let store = LeadStore::new();
        let l = seed(&store);
        store
            .transaction(l.id, |tx| {
                tx.log(created());
                Ok(())
            })
            .unwrap();
        let _ = store.transaction(l.id, |_| -> Result<(), EngineError> {
            Err(EngineError::validation("boom"))
        });
        assert!(store.lead_locks.lock().is_empty());
    }

    #[test]
    fn lock_in_use_is_kept() {
        let store = LeadStore::new();
        let l = seed(&store);
        let held = store.lead_lock(l.id);
        store.release_lead_lock(l.id);
        assert_eq!(store.lead_locks.lock().len(), 1);
        drop(held);
        store.release_lead_lock(l.id);
        assert!(store.lead_locks.lock().is_empty());
    }

    #[test]
    fn concurrent_transactions_leave_no_locks_behind() {
        let store = LeadStore::new();
        let l = seed(&store);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..25 {
                        store
                            .transaction(l.id, |tx| {
                                tx.log(created());
                                Ok(())
                            })
                            .unwrap();
                    }
                });
            }
        });
        assert!(store.lead_locks.lock().is_empty());
        assert_eq!(store.snapshot().activities.len(), 1 + 8 * 25);
    }
}
